//! Configuration loading and representation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use boardwise_boarding::TransitionPolicy;
use boardwise_observability::{LogConfig, LogFormat};

pub const ENV_TRANSITION_POLICY: &str = "BOARDWISE_TRANSITION_POLICY";
pub const ENV_MAX_CONFLICT_RETRIES: &str = "BOARDWISE_MAX_CONFLICT_RETRIES";
pub const ENV_LOG_FORMAT: &str = "BOARDWISE_LOG_FORMAT";
pub const ENV_LOG_FILTER: &str = "RUST_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("malformed config document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Runtime settings for the boarding pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardwiseConfig {
    pub transition_policy: TransitionPolicy,
    /// How many times a dispatch replays after losing a save race.
    pub max_conflict_retries: u32,
    pub log: LogConfig,
}

impl Default for BoardwiseConfig {
    fn default() -> Self {
        Self {
            transition_policy: TransitionPolicy::Strict,
            max_conflict_retries: 3,
            log: LogConfig::default(),
        }
    }
}

impl BoardwiseConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Defaults overridden by process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each known key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_TRANSITION_POLICY) {
            config.transition_policy = raw
                .parse::<TransitionPolicy>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: ENV_TRANSITION_POLICY,
                    reason: e.to_string(),
                })?;
        }

        if let Some(raw) = lookup(ENV_MAX_CONFLICT_RETRIES) {
            config.max_conflict_retries =
                raw.trim()
                    .parse::<u32>()
                    .map_err(|e| ConfigError::InvalidValue {
                        key: ENV_MAX_CONFLICT_RETRIES,
                        reason: e.to_string(),
                    })?;
        }

        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            config.log.format = raw
                .parse::<LogFormat>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: ENV_LOG_FORMAT,
                    reason: e.to_string(),
                })?;
        }

        if let Some(filter) = lookup(ENV_LOG_FILTER) {
            config.log.filter = filter;
        }

        Ok(config)
    }
}
