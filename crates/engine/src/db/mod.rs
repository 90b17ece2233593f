//! Database module for the bizflow engine.
//!
//! PostgreSQL connectivity, schema bootstrap and per-table queries using SQLx.

pub mod pool;
pub mod queries;
pub mod schema;

pub use pool::{create_pool, health_check, DbPool};
pub use schema::init_schema;
