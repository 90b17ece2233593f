//! Built-in executors.
//!
//! - `system.echo` - Return the request data as a single-row result
//! - `FnExecutor` - Adapt an async closure into an executor for wiring code

mod echo;
mod func;

pub use self::echo::EchoExecutor;
pub use self::func::FnExecutor;

use crate::registry::ExecutorRegistry;

/// Create a registry with all built-in executors registered.
pub fn default_registry() -> ExecutorRegistry {
    let mut registry = ExecutorRegistry::new();

    registry.register(EchoExecutor::CODE, EchoExecutor::new());

    registry
}
