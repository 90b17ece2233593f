//! bizflow engine library
//!
//! Executes individual workflow activities against registered business
//! operations:
//!
//! - **Condition checks**: skip an activity whose template condition is false
//! - **Input/output mapping**: project the workflow context into an operation
//!   request and the operation result back into the workflow context
//! - **Dispatch**: route the request to the executor registered for the
//!   template's operation code
//! - **Audit**: record status, input and output on every activity
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from environment variables
//! - [`db`]: PostgreSQL connectivity, schema and queries
//! - [`engine`]: Template cache, condition evaluator, path resolver and engine
//! - [`error`]: Error types with Axum integration
//! - [`handlers`]: HTTP route handlers
//! - [`model`]: Workflow, activity and template records
//! - [`store`]: Persistence contracts with memory and PostgreSQL backends
//! - [`state`]: Shared application state
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use bizflow_engine::{config::EngineConfig, engine::ActivityEngine, store::MemoryStore};
//! use bizflow_executors::{default_registry, ExecutionContext};
//!
//! let store = Arc::new(MemoryStore::new());
//! let engine = ActivityEngine::with_store(store, Arc::new(default_registry()), EngineConfig::default());
//! let outcome = engine.execute(&ExecutionContext::generated(), workflow_id, activity_id).await?;
//! ```

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod model;
pub mod result_ext;
pub mod router;
pub mod state;
pub mod store;

pub use error::{AppError, AppResult};
pub use result_ext::ResultExt;
