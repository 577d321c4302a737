//! Engine settings.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Entry names excluded from the mirror and from watch notifications.
    pub ignored_names: Vec<String>,
    /// Poll interval handed to watch backends that need one.
    pub watch_poll_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ignored_names: [
                ".DS_Store",
                ".Spotlight-V100",
                ".Trashes",
                ".fseventsd",
                ".TemporaryItems",
                "Thumbs.db",
                "desktop.ini",
                ".git",
                "node_modules",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            watch_poll_interval_ms: 250,
        }
    }
}

impl EngineConfig {
    /// Reads a JSON config file; any failure falls back to defaults.
    pub fn load(path: &Path) -> Self {
        let Ok(raw) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }
        }
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored_names.iter().any(|ignored| ignored == name)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.watch_poll_interval_ms)
    }
}
