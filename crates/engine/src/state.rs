//! Application state for the bizflow engine server.
//!
//! Shared resources handed to every handler via Axum's state management.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::engine::ActivityEngine;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool; `None` when running over an in-memory store
    pub db: Option<DbPool>,

    /// Activity execution engine
    pub engine: Arc<ActivityEngine>,

    /// Application configuration
    pub config: Arc<AppConfig>,

    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(db: Option<DbPool>, engine: ActivityEngine, config: AppConfig) -> Self {
        Self {
            db,
            engine: Arc::new(engine),
            config: Arc::new(config),
            start_time: std::time::Instant::now(),
        }
    }

    /// Get the server uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn has_database(&self) -> bool {
        self.db.is_some()
    }
}
