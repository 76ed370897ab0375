//! Manager configuration.
//!
//! [`ManagerConfig`] has production defaults and can be layered from a TOML
//! file plus `BLOOM__*` environment variables (e.g. `BLOOM__REWARD_PER_DAY`,
//! `BLOOM__POLICY__EMERGENCY__MAX_FEE_BPS`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MIN_CREATION_PRICE, DEFAULT_REWARD_PER_DAY};
use crate::error::ConfigError;
use crate::policy::RewardPolicy;

/// Configuration for a [`BloomsManager`](../bloom_manager/struct.BloomsManager.html) instance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ManagerConfig {
    /// Daily reward rate, see [`REWARD_RATE_PRECISION`](crate::constants::REWARD_RATE_PRECISION).
    pub reward_per_day: u64,
    /// Minimum value a node can be created with.
    pub min_creation_price: u64,
    /// Log level filter string (e.g. "info", "bloom_manager=debug").
    pub log_level: String,
    /// Log output format, "text" or "json".
    pub log_format: String,
    pub policy: RewardPolicy,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            reward_per_day: DEFAULT_REWARD_PER_DAY,
            min_creation_price: DEFAULT_MIN_CREATION_PRICE,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            policy: RewardPolicy::default(),
        }
    }
}

impl ManagerConfig {
    /// Load from a TOML file with environment overrides, then validate.
    ///
    /// Keys missing from both sources keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let cfg: Self = config::Config::builder()
            .add_source(
                config::File::from(path.as_ref()).format(config::FileFormat::Toml),
            )
            .add_source(
                config::Environment::with_prefix("BLOOM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigError::Source(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse from an in-memory TOML string, then validate.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let cfg: Self = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigError::Source(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reward_per_day == 0 {
            return Err(ConfigError::Invalid("reward_per_day must be non-zero".into()));
        }
        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(ConfigError::Invalid(format!(
                "unknown log format: {}",
                self.log_format
            )));
        }
        self.policy
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
