//! Configuration for the PaceTune engine
//!
//! Bootstrap configuration loaded from a TOML file. Everything here has a
//! built-in default, so an absent file or empty table is a valid
//! configuration. There is no runtime settings store: the engine keeps no
//! state across sessions.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Engine configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Global target tempo used when a track's own target is unset
    ///
    /// Also seeds the target field of newly added blank tracks.
    #[serde(default = "default_target_bpm")]
    pub default_target_bpm: f64,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_target_bpm() -> f64 {
    180.0 // common running cadence target
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_target_bpm: default_target_bpm(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let toml_str = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&toml_str)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;

        info!(
            "Loaded configuration from {}: default target {} BPM",
            path.display(),
            config.default_target_bpm
        );
        Ok(config)
    }
}

/// Initialize tracing from the logging configuration
///
/// `RUST_LOG` takes precedence over the configured level when set. Intended
/// to be called once by the embedding application.
pub fn init_tracing(config: &LoggingConfig) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(format!("pacetune_engine={}", config.level))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_to_empty_config() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config.default_target_bpm, 180.0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_target_bpm = 172.0").unwrap();
        writeln!(file, "[logging]").unwrap();
        writeln!(file, "level = \"debug\"").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.default_target_bpm, 172.0);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = EngineConfig::load(Path::new("/nonexistent/pacetune.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_target_bpm = \"not a number\"").unwrap();

        let result = EngineConfig::load(file.path());
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
