//! Database queries, one module per table.

pub mod activity;
pub mod template;
pub mod workflow;
