//! Session configuration.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A variable that is absent falls back to its default; one that is present
//! but cannot be parsed is an error.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Simulated identity lookup latency in milliseconds
pub const IDENTITY_LATENCY_VAR: &str = "TASKLIST_IDENTITY_LATENCY_MS";
/// Probability that the identity lookup fails
pub const IDENTITY_FAILURE_RATE_VAR: &str = "TASKLIST_IDENTITY_FAILURE_RATE";
/// Seed for every random choice in the session
pub const SEED_VAR: &str = "TASKLIST_SEED";
/// Capacity of the store action broadcast
pub const BROADCAST_CAPACITY_VAR: &str = "TASKLIST_BROADCAST_CAPACITY";
/// Log filter used when `RUST_LOG` is unset
pub const LOG_LEVEL_VAR: &str = "TASKLIST_LOG_LEVEL";

/// Errors raised while loading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The variable is set but its value does not parse
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        /// Environment variable name
        name: &'static str,
        /// Raw value found
        value: String,
        /// What was wrong with it
        reason: String,
    },
}

/// Configuration of one todo session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long the simulated identity lookup takes
    pub identity_latency: Duration,
    /// Probability in `0.0..=1.0` that the lookup fails
    pub identity_failure_rate: f64,
    /// Seed for priorities and lookup failures; entropy when `None`
    pub seed: Option<u64>,
    /// Capacity of each store's action broadcast
    pub broadcast_capacity: usize,
    /// Default tracing filter
    pub log_level: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            identity_latency: Duration::from_millis(500),
            identity_failure_rate: 0.1,
            seed: None,
            broadcast_capacity: 16,
            log_level: "info".to_string(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let identity_latency = parse_var::<u64, _>(&lookup, IDENTITY_LATENCY_VAR)?
            .map_or(defaults.identity_latency, Duration::from_millis);

        let identity_failure_rate = match parse_var::<f64, _>(&lookup, IDENTITY_FAILURE_RATE_VAR)? {
            Some(rate) if !(0.0..=1.0).contains(&rate) => {
                return Err(ConfigError::Invalid {
                    name: IDENTITY_FAILURE_RATE_VAR,
                    value: rate.to_string(),
                    reason: "must be between 0.0 and 1.0".to_string(),
                });
            },
            Some(rate) => rate,
            None => defaults.identity_failure_rate,
        };

        Ok(Self {
            identity_latency,
            identity_failure_rate,
            seed: parse_var(&lookup, SEED_VAR)?,
            broadcast_capacity: parse_var(&lookup, BROADCAST_CAPACITY_VAR)?
                .unwrap_or(defaults.broadcast_capacity),
            log_level: lookup(LOG_LEVEL_VAR)
                .filter(|level| !level.trim().is_empty())
                .unwrap_or(defaults.log_level),
        })
    }

    /// Latency of the simulated identity lookup
    #[must_use]
    pub const fn with_identity_latency(mut self, latency: Duration) -> Self {
        self.identity_latency = latency;
        self
    }

    /// Failure probability of the simulated identity lookup
    #[must_use]
    pub const fn with_identity_failure_rate(mut self, rate: f64) -> Self {
        self.identity_failure_rate = rate;
        self
    }

    /// Fixed seed for reproducible sessions
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Capacity of the action broadcast
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Default tracing filter
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };

    raw.trim()
        .parse()
        .map(Some)
        .map_err(|error: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: error.to_string(),
        })
}
