//! Activity engine tuning.

use std::time::Duration;

use serde::Deserialize;

/// Engine configuration loaded from environment variables.
///
/// Environment variables are prefixed with `BIZFLOW_ENGINE_`:
/// - `BIZFLOW_ENGINE_EXECUTOR_TIMEOUT_MS`: Upper bound on one operation
///   invocation; a caller deadline that is earlier wins (default: unbounded)
/// - `BIZFLOW_ENGINE_CONTEXT_UPDATE_RETRIES`: Re-read/re-apply attempts after
///   a workflow version conflict (default: 3)
/// - `BIZFLOW_ENGINE_CONDITION_FUEL`: Instruction budget per condition
///   expression (default: 50000)
/// - `BIZFLOW_ENGINE_CONDITIONS_ENABLED`: Evaluate template conditions
///   (default: true)
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub executor_timeout_ms: Option<u64>,

    #[serde(default = "default_context_update_retries")]
    pub context_update_retries: u32,

    #[serde(default = "default_condition_fuel")]
    pub condition_fuel: u64,

    #[serde(default = "default_true")]
    pub conditions_enabled: bool,
}

fn default_context_update_retries() -> u32 {
    3
}

fn default_condition_fuel() -> u64 {
    50_000
}

fn default_true() -> bool {
    true
}

impl EngineConfig {
    /// Load configuration from `BIZFLOW_ENGINE_`-prefixed environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("BIZFLOW_ENGINE_").from_env::<EngineConfig>()
    }

    /// Upper bound on a single operation invocation.
    pub fn executor_timeout(&self) -> Option<Duration> {
        self.executor_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            executor_timeout_ms: None,
            context_update_retries: default_context_update_retries(),
            condition_fuel: default_condition_fuel(),
            conditions_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.context_update_retries, 3);
        assert_eq!(config.condition_fuel, 50_000);
        assert!(config.conditions_enabled);
        assert!(config.executor_timeout().is_none());
    }

    #[test]
    fn test_executor_timeout() {
        let config = EngineConfig {
            executor_timeout_ms: Some(1500),
            ..EngineConfig::default()
        };
        assert_eq!(config.executor_timeout(), Some(Duration::from_millis(1500)));
    }
}
