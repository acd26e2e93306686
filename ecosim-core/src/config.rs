use crate::state::{EventLog, WorldState};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Simulation configuration.
///
/// Missing JSON fields take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Whether AI countries act at all.
    pub ai_enabled: bool,
    /// AI acts on ticks where `tick % ai_interval == 0` (0 = never).
    pub ai_interval: u32,
    /// Treasury charged to annex a neutral region.
    pub annex_cost: f64,
    /// Number of events retained by the world's event log.
    pub event_log_capacity: usize,
    /// Compute checksum every N ticks (0 = disabled).
    ///
    /// Recommended values:
    /// - `1`: Every tick (safest)
    /// - `10`: Balanced
    /// - `100`: Lowest overhead
    pub checksum_frequency: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ai_enabled: true,
            ai_interval: 2,
            annex_cost: 50.0,
            event_log_capacity: EventLog::DEFAULT_CAPACITY,
            checksum_frequency: 10,
        }
    }
}

impl SimConfig {
    /// Load configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a JSON string.
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.annex_cost.is_finite() || self.annex_cost < 0.0 {
            return Err(ConfigError::Invalid {
                field: "annex_cost",
                reason: format!("must be a non-negative number, got {}", self.annex_cost),
            });
        }
        if self.event_log_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "event_log_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Copies the world-level settings onto `state`.
    pub fn apply(&self, state: &mut WorldState) {
        state.ai_enabled = self.ai_enabled;
        state.ai_interval = self.ai_interval;
        state.annex_cost = self.annex_cost;
        state.events.set_capacity(self.event_log_capacity);
    }
}
