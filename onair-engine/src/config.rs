//! onair-engine specific configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Sync engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP control surface binds to
    pub bind_addr: String,

    /// Well-known path of the on-air document in the remote store
    pub document_path: String,

    /// Settle window after a local write, in milliseconds
    ///
    /// Remote notifications that merely echo our own write are ignored
    /// within this window. Time-based only: an echo delayed beyond the
    /// window can cause a spurious reconciliation (known limitation).
    pub settle_window_ms: u64,

    /// Grace period before the go-live write, in countdown ticks
    pub countdown_ticks: u32,

    /// Interval between countdown ticks, in milliseconds
    pub tick_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5760".to_string(),
            document_path: "onair/current".to_string(),
            settle_window_ms: 2000,
            countdown_ticks: 4,
            tick_interval_ms: 1000,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_window_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.settle_window_ms, 2000);
        assert_eq!(config.countdown_ticks, 4);
        assert_eq!(config.tick_interval_ms, 1000);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "settle_window_ms = 500").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.settle_window_ms, 500);
        assert_eq!(config.countdown_ticks, 4);
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let result = Config::load(Path::new("/nonexistent/onair.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
