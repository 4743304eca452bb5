//! Page server configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_PAGE_JSON_PATH: &str = "data/page.json";
const DEFAULT_COMP_MENU_PATH: &str = "data/comp_menu.json";
const DEFAULT_COMP_URL_HOOK_PATH: &str = "data/comp_hook.json";
const DEFAULT_PAGE_FLUSH_INTERVAL_MS: u64 = 1000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub page_path: PathBuf,
    pub menu_path: PathBuf,
    pub hook_path: PathBuf,
    pub flush_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            page_path: PathBuf::from(DEFAULT_PAGE_JSON_PATH),
            menu_path: PathBuf::from(DEFAULT_COMP_MENU_PATH),
            hook_path: PathBuf::from(DEFAULT_COMP_URL_HOOK_PATH),
            flush_interval: Duration::from_millis(DEFAULT_PAGE_FLUSH_INTERVAL_MS),
        }
    }
}

impl ServerConfig {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `PORT`: listen port, default 3000
    /// - `PAGE_JSON_PATH`: stored page tree, default `data/page.json`
    /// - `COMP_MENU_PATH`: component menu, default `data/comp_menu.json`
    /// - `COMP_URL_HOOK_PATH`: component module overrides, default `data/comp_hook.json`
    /// - `PAGE_FLUSH_INTERVAL_MS`: persistence tick, default 1000
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a numeric value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).map_or(None, Some))
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let path = |var: &str, default: PathBuf| lookup(var).map_or(default, PathBuf::from);

        let port = match lookup("PORT") {
            None => defaults.port,
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { var: "PORT", value: raw })?,
        };

        let flush_interval = match lookup("PAGE_FLUSH_INTERVAL_MS") {
            None => defaults.flush_interval,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => return Err(ConfigError::Invalid { var: "PAGE_FLUSH_INTERVAL_MS", value: raw }),
            },
        };

        Ok(Self {
            port,
            page_path: path("PAGE_JSON_PATH", defaults.page_path),
            menu_path: path("COMP_MENU_PATH", defaults.menu_path),
            hook_path: path("COMP_URL_HOOK_PATH", defaults.hook_path),
            flush_interval,
        })
    }
}
