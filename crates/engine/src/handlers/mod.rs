//! HTTP handlers for the bizflow engine API.

pub mod activities;
pub mod health;

pub use activities::execute_activity;
pub use health::{api_health, health_check};
