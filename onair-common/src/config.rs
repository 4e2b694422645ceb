//! Configuration value resolution
//!
//! Services resolve each startup setting with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Resolve a string setting following the priority order above
///
/// `config_file` is the TOML file to consult for priority 3, usually the
/// explicit `--config` path or [`default_config_file`]; `None` skips
/// straight to the compiled default.
pub fn resolve_setting(
    cli_arg: Option<&str>,
    env_var_name: &str,
    config_file: Option<&Path>,
    config_file_key: &str,
    default: &str,
) -> String {
    // Priority 1: Command-line argument
    if let Some(value) = cli_arg {
        return value.to_string();
    }

    // Priority 2: Environment variable
    if let Ok(value) = std::env::var(env_var_name) {
        return value;
    }

    // Priority 3: TOML config file
    if let Some(path) = config_file {
        if let Ok(toml_content) = std::fs::read_to_string(path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(value) = config.get(config_file_key).and_then(|v| v.as_str()) {
                    return value.to_string();
                }
            }
        }
    }

    // Priority 4: Compiled default
    default.to_string()
}

/// Default configuration file path for the platform
///
/// Looks for `onair/config.toml` under the user config directory, with
/// `/etc/onair/config.toml` as a system-wide fallback on Linux.
pub fn default_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("onair").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/onair/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}
