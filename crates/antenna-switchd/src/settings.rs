//! Service settings: where the pin map and the selection file live.
//!
//! Defaults are the working-directory files `antenna_switcher.cfg` and
//! `ant`. Environment variables override them:
//! - `ANTENNA_SWITCH_CONFIG` overrides the pin map path
//! - `ANTENNA_SWITCH_STATE` overrides the selection file path

use std::path::PathBuf;

use antenna_switch_core::config::DEFAULT_CONFIG_FILE;
use antenna_switch_core::store::DEFAULT_STATE_FILE;

/// Environment variable naming the pin map file.
pub const CONFIG_ENV: &str = "ANTENNA_SWITCH_CONFIG";

/// Environment variable naming the selection file.
pub const STATE_ENV: &str = "ANTENNA_SWITCH_STATE";

/// File locations used by the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Path of `antenna_switcher.cfg`.
    pub config_path: PathBuf,
    /// Path of the persisted selection file.
    pub state_path: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            state_path: PathBuf::from(DEFAULT_STATE_FILE),
        }
    }
}

impl ServiceConfig {
    /// Defaults with overrides from the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from `lookup`. Unset or empty values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(CONFIG_ENV).filter(|v| !v.is_empty()) {
            self.config_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(STATE_ENV).filter(|v| !v.is_empty()) {
            self.state_path = PathBuf::from(path);
        }
    }
}
