//! bizflow Executor Library
//!
//! Business-operation dispatch for workflow activities.
//!
//! This crate provides:
//! - `Executor` capability trait invoked with a `{data: ...}` request envelope
//! - `ExecutorRegistry`, an explicit code → executor lookup table built at startup
//! - `ExecutionContext` carrying request identity and the caller's deadline
//! - Built-in executors and a closure adapter for wiring

pub mod builtin;
pub mod context;
pub mod error;
pub mod registry;

pub use builtin::{default_registry, EchoExecutor, FnExecutor};
pub use context::{DeadlineExceeded, ExecutionContext};
pub use error::ExecutorError;
pub use registry::{Executor, ExecutorRegistry, RequestEnvelope};
