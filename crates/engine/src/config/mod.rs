//! Configuration module for the bizflow engine.
//!
//! Configuration is loaded from environment variables using the `envy`
//! crate for type-safe environment variable parsing.

mod app;
mod database;
mod engine;

pub use app::AppConfig;
pub use database::DatabaseConfig;
pub use engine::EngineConfig;
