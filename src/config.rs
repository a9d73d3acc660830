//! Dispatcher configuration.
//!
//! Loaded from TOML, then optionally overridden from the environment:
//!
//! ```toml
//! failure_policy = "collect_all"
//! trace_handlers = true
//! ```

use serde::Deserialize;
use thiserror::Error;

use crate::dispatch::FailurePolicy;

/// Environment variable overriding [`DispatcherConfig::failure_policy`].
pub const FAILURE_POLICY_ENV: &str = "SOURCED_DISPATCH_FAILURE_POLICY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse dispatcher config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid failure policy: {0}")]
    InvalidPolicy(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub failure_policy: FailurePolicy,
    /// Install a `TracingListener` that logs every handled message.
    pub trace_handlers: bool,
}

impl DispatcherConfig {
    /// Parse from a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(FAILURE_POLICY_ENV) {
            self.failure_policy = raw.parse().map_err(ConfigError::InvalidPolicy)?;
        }
        Ok(self)
    }
}
