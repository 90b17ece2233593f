//! Activity execution engine.
//!
//! - [`TemplateCache`]: read-through cache of activity templates
//! - [`ConditionEvaluator`]: fail-open condition checks
//! - [`ContextPathResolver`]: field → path projection for input and output
//! - [`ActivityEngine`]: drives one activity to a terminal status

pub mod activity;
pub mod condition;
pub mod context;
pub mod outcome;
pub mod resolver;
pub mod template_cache;

pub use activity::ActivityEngine;
pub use condition::{ConditionEvaluator, ConditionOutcome};
pub use outcome::{ActivityOutcome, OutcomeError, ACTIVITY_EXECUTION_FAILED, CONTEXT_PERSIST_FAILED};
pub use resolver::{ContextPath, ContextPathResolver, MappingError, PathError, PathMapping};
pub use template_cache::TemplateCache;
