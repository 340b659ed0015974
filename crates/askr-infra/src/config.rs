//! Global configuration loader for askr.
//!
//! Reads `config.toml` from the data directory (`~/.askr/` by default) and
//! deserializes it into [`GlobalConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use askr_types::config::GlobalConfig;
use askr_types::error::ConfigError;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "ASKR_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `ASKR_DATA_DIR` environment variable
/// 2. `~/.askr`
/// 3. `.askr` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".askr");
    }

    PathBuf::from(".askr")
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`GlobalConfig::default()`].
/// - Unreadable or malformed file: logs a warning and returns the default.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match parse_global_config(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("{err} ({}), using defaults", config_path.display());
            GlobalConfig::default()
        }
    }
}

/// Parse config.toml content.
pub fn parse_global_config(content: &str) -> Result<GlobalConfig, ConfigError> {
    toml::from_str::<GlobalConfig>(content).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Read a secret from the environment variable `name`.
///
/// Empty values count as missing.
pub fn secret_from_env(name: &str) -> Result<SecretString, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value)),
        _ => Err(ConfigError::MissingEnv(name.to_string())),
    }
}
