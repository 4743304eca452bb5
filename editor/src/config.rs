//! Editor configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::compile::Environment;
use crate::consts::{DEFAULT_API_BASE, DEFAULT_HISTORY_DEPTH, EDIT_ENV};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    pub environment: Environment,
    pub history_depth: usize,
    pub api_base: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            environment: Environment::parse(EDIT_ENV),
            history_depth: DEFAULT_HISTORY_DEPTH,
            api_base: DEFAULT_API_BASE.to_owned(),
        }
    }
}

impl EditorConfig {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `EDITOR_ENV`: environment name, default `edit`
    /// - `EDITOR_HISTORY_DEPTH`: snapshots kept for undo, default 100
    /// - `EDITOR_API_BASE`: page server base URL, default `http://localhost:3000`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(value) => Some(value),
            Err(_) => None,
        })
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`EditorConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let environment = lookup("EDITOR_ENV").map_or(defaults.environment, |raw| Environment::parse(raw.trim()));

        let history_depth = match lookup("EDITOR_HISTORY_DEPTH") {
            None => defaults.history_depth,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => depth,
                _ => return Err(ConfigError::Invalid { var: "EDITOR_HISTORY_DEPTH", value: raw }),
            },
        };

        let api_base = lookup("EDITOR_API_BASE")
            .map_or(defaults.api_base, |raw| raw.trim().trim_end_matches('/').to_owned());
        if api_base.is_empty() {
            return Err(ConfigError::Invalid { var: "EDITOR_API_BASE", value: api_base });
        }

        Ok(Self { environment, history_depth, api_base })
    }
}
