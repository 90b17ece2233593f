//! Records the engine reads and writes.
//!
//! These are owned by the surrounding backend; the engine only mutates
//! `Activity` status/audit fields and `Workflow.context`.

mod activity;
mod template;
mod workflow;

pub use activity::{Activity, ActivityStatus, UnknownStatus};
pub use template::{ActivityTemplate, INPUT_MAPPING_KEY, OUTPUT_MAPPING_KEY};
pub use workflow::Workflow;
