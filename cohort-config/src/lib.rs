//! Run and pacing configuration loading for Cohort.
//!
//! A single TOML document describes one provisioning run: destination
//! naming, batch capacity, the welcome message, and the pacing profile.
//! The "safe" and "fast" operating modes observed in the field are plain
//! value choices here, not separate code paths.

use std::fs;
use std::path::Path;

use cohort_core::{PacingConfig, RetryPolicy, SchedulerError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] SchedulerError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Everything one provisioning run needs besides the contact list and the
/// executor.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Prefix for destination labels; batches become `"{base_name} 1"`,
    /// `"{base_name} 2"`, ...
    pub base_name: String,
    /// Maximum regular members per destination.
    pub capacity: usize,
    /// Posted into each destination after creation; `None` skips the step.
    pub welcome_message: Option<String>,
    /// Fallback behaviour when classification finds no regular contacts.
    pub merge_elevated_into_regular_on_empty_fallback: bool,
    pub pacing: PacingConfig,
    pub retry: RetryPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_name: "Group".to_string(),
            capacity: 999,
            welcome_message: None,
            merge_elevated_into_regular_on_empty_fallback: false,
            pacing: PacingConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(
            target: "cohort::config",
            path = %path.display(),
            capacity = config.capacity,
            ban_prevention = config.pacing.ban_prevention_enabled,
            "loaded run configuration"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_name.trim().is_empty() {
            return Err(SchedulerError::InvalidConfiguration(
                "base_name must not be empty".to_string(),
            )
            .into());
        }
        if self.capacity == 0 {
            return Err(SchedulerError::InvalidConfiguration(
                "capacity must be greater than zero".to_string(),
            )
            .into());
        }
        self.pacing.validate()?;
        self.retry.validate()?;
        Ok(())
    }

    pub fn to_toml_string(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
