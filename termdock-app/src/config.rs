//! Host application configuration
//!
//! Loaded from `config.toml` in the platform config directory. Every field
//! has a default, so a missing or partial file always yields a working
//! config; parse failures warn and fall back rather than aborting startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use termdock_utils::paths;

use crate::embed::DiscoveryPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Path to the terminal emulator executable
    pub terminal_path: PathBuf,
    /// Window class name the emulator's top-level window is recognized by
    pub window_class: String,
    /// Sleep between window-discovery attempts, in milliseconds
    pub discovery_interval_ms: u64,
    /// Give up window discovery after this long, in milliseconds
    pub discovery_deadline_ms: u64,
    /// Log filter (overridden by the TERMDOCK_LOG env var)
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            terminal_path: PathBuf::from("putty.exe"),
            window_class: "PuTTY".into(),
            discovery_interval_ms: 10,
            discovery_deadline_ms: 10_000,
            log_filter: "info".into(),
        }
    }
}

impl AppConfig {
    /// Load from the default platform location
    pub fn load() -> Self {
        Self::load_from(&paths::config_file())
    }

    /// Load from a specific file; missing or unparseable files fall back
    /// to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("failed to read {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn discovery_policy(&self) -> DiscoveryPolicy {
        DiscoveryPolicy::new(
            Duration::from_millis(self.discovery_interval_ms),
            Duration::from_millis(self.discovery_deadline_ms),
        )
    }
}
