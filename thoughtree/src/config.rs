//! Search configuration: [`SearchConfig`] and environment overrides.
//!
//! Values come from defaults, then `THOUGHTREE_*` environment variables (which the
//! `config` crate fills from `.env` and the XDG `config.toml`), then explicit setters.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generation::Strategy;
use crate::oracle::RetryPolicy;
use crate::prompt::Language;

pub const ENV_K: &str = "THOUGHTREE_K";
pub const ENV_C: &str = "THOUGHTREE_C";
pub const ENV_STRATEGY: &str = "THOUGHTREE_STRATEGY";
pub const ENV_LANGUAGE: &str = "THOUGHTREE_LANGUAGE";
pub const ENV_BACKTRACK: &str = "THOUGHTREE_BACKTRACK";
pub const ENV_ORACLE_TIMEOUT_SECS: &str = "THOUGHTREE_ORACLE_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "THOUGHTREE_MAX_RETRIES";

/// Invalid configuration value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },

    /// `c` must be at least 1 or PROPOSE could never produce a candidate.
    #[error("branching factor c must be at least 1")]
    ZeroBranching,
}

/// Immutable parameters of one search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Step budget: maximum generate/check cycles.
    pub k: usize,
    /// Branching factor: candidates requested per proposal call.
    pub c: usize,
    pub strategy: Strategy,
    pub language: Language,
    /// When true the controller backtracks out of exhausted branches.
    pub backtracking: bool,
    /// Deadline for a single oracle call.
    pub oracle_timeout_secs: u64,
    /// Retries after the first failed oracle call.
    pub max_retries: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            k: 10,
            c: 3,
            strategy: Strategy::Propose,
            language: Language::En,
            backtracking: false,
            oracle_timeout_secs: 60,
            max_retries: 2,
        }
    }
}

impl SearchConfig {
    /// Defaults overridden by `THOUGHTREE_*` process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `THOUGHTREE_*` key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup(ENV_K) {
            cfg.k = parse_value(ENV_K, &v)?;
        }
        if let Some(v) = lookup(ENV_C) {
            cfg.c = parse_value(ENV_C, &v)?;
        }
        if let Some(v) = lookup(ENV_STRATEGY) {
            cfg.strategy = parse_value(ENV_STRATEGY, &v)?;
        }
        if let Some(v) = lookup(ENV_LANGUAGE) {
            cfg.language = parse_value(ENV_LANGUAGE, &v)?;
        }
        if let Some(v) = lookup(ENV_BACKTRACK) {
            cfg.backtracking = parse_flag(ENV_BACKTRACK, &v)?;
        }
        if let Some(v) = lookup(ENV_ORACLE_TIMEOUT_SECS) {
            cfg.oracle_timeout_secs = parse_value(ENV_ORACLE_TIMEOUT_SECS, &v)?;
        }
        if let Some(v) = lookup(ENV_MAX_RETRIES) {
            cfg.max_retries = parse_value(ENV_MAX_RETRIES, &v)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.c == 0 {
            return Err(ConfigError::ZeroBranching);
        }
        Ok(())
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_c(mut self, c: usize) -> Self {
        self.c = c;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_backtracking(mut self, enable: bool) -> Self {
        self.backtracking = enable;
        self
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    /// Exponential backoff (0.5s initial, doubling, 8s cap) with `max_retries` retries.
    pub fn retry_policy(&self) -> RetryPolicy {
        if self.max_retries == 0 {
            return RetryPolicy::none();
        }
        RetryPolicy::exponential(
            self.max_retries,
            Duration::from_millis(500),
            Duration::from_secs(8),
            2.0,
        )
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
