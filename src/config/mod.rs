//! Configuration System for cwm-algebra
//!
//! Provides:
//! - TOML configuration files
//! - Environment variable overrides
//! - Logging setup through `tracing-subscriber`
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./cwm-algebra.toml` - Project-local configuration
//! 2. `~/.config/cwm-algebra/config.toml` - User configuration (XDG)
//! 3. `/etc/cwm-algebra/config.toml` - System-wide configuration
//!
//! # Environment Variables
//!
//! - `CWM_ALGEBRA_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//! - `CWM_ALGEBRA_INCREMENTAL` - Run the incremental BGP pass (true/false)
//! - `CWM_ALGEBRA_FOLLOW_CYCLES` - Let the incremental pass follow cycles (true/false)
//!
//! # Example Configuration
//!
//! ```toml
//! # cwm-algebra.toml
//!
//! [general]
//! log_level = "verbose"
//!
//! [evaluation]
//! incremental = true
//! follow_cycles = false
//! dedup_reduced = true
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CwmConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Evaluation switches
    pub evaluation: EvaluationConfig,
}

/// General configuration options
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Logging level
    pub log_level: LogLevel,
}

/// Per-evaluation switches read by the evaluation context
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Ask graphs for an incremental enumeration before naive BGP matching
    pub incremental: bool,
    /// Allow the incremental pass to follow cycles
    pub follow_cycles: bool,
    /// Let REDUCED drop adjacent duplicates
    pub dedup_reduced: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            incremental: true,
            follow_cycles: false,
            dedup_reduced: false,
        }
    }
}

/// Log level options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// The `tracing` level this setting admits
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Quiet => LevelFilter::ERROR,
            LogLevel::Normal => LevelFilter::INFO,
            LogLevel::Verbose => LevelFilter::DEBUG,
            LogLevel::Debug => LevelFilter::TRACE,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl CwmConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from default locations, then apply environment
    /// variable overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for path in Self::config_paths() {
            if path.exists() {
                config = Self::load_from_file(&path)?;
                break;
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<string>"), e.to_string()))
    }

    /// Get the list of config file search paths
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        paths.push(PathBuf::from("./cwm-algebra.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("cwm-algebra").join("config.toml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/cwm-algebra/config.toml"));

        paths
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment, in practice)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("CWM_ALGEBRA_LOG_LEVEL") {
            self.general.log_level = LogLevel::from_str(&val)
                .ok_or_else(|| ConfigError::InvalidValue("CWM_ALGEBRA_LOG_LEVEL".into(), val))?;
        }

        if let Some(val) = lookup("CWM_ALGEBRA_INCREMENTAL") {
            match parse_flag(&val) {
                Some(flag) => self.evaluation.incremental = flag,
                None => warn!(value = %val, "ignoring unparsable CWM_ALGEBRA_INCREMENTAL"),
            }
        }

        if let Some(val) = lookup("CWM_ALGEBRA_FOLLOW_CYCLES") {
            match parse_flag(&val) {
                Some(flag) => self.evaluation.follow_cycles = flag,
                None => warn!(value = %val, "ignoring unparsable CWM_ALGEBRA_FOLLOW_CYCLES"),
            }
        }

        Ok(())
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Write configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        fs::write(path, content).map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Install a global `tracing` subscriber for the configured level
///
/// `RUST_LOG` takes precedence when set. Returns `false` if a subscriber was
/// already installed.
pub fn init_logging(general: &GeneralConfig) -> bool {
    let filter = EnvFilter::builder()
        .with_default_directive(general.log_level.level_filter().into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// IO error reading/writing config file
    #[error("IO error reading {path}: {1}", path = .0.display())]
    Io(PathBuf, String),
    /// Parse error in config file
    #[error("Parse error in {path}: {1}", path = .0.display())]
    Parse(PathBuf, String),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
    /// Unusable value for a setting
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = CwmConfig::new();
        assert!(config.evaluation.incremental);
        assert!(!config.evaluation.follow_cycles);
        assert!(!config.evaluation.dedup_reduced);
        assert_eq!(config.general.log_level, LogLevel::Normal);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [general]
            log_level = "verbose"

            [evaluation]
            incremental = false
            dedup_reduced = true
        "#;

        let config = CwmConfig::load_from_str(toml).unwrap();
        assert_eq!(config.general.log_level, LogLevel::Verbose);
        assert!(!config.evaluation.incremental);
        assert!(config.evaluation.dedup_reduced);
        assert!(!config.evaluation.follow_cycles);
    }

    #[test]
    fn test_parse_error() {
        let result = CwmConfig::load_from_str("[evaluation]\nincremental = \"maybe\"");
        assert!(matches!(result, Err(ConfigError::Parse(..))));
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from_str("quiet"), Some(LogLevel::Quiet));
        assert_eq!(LogLevel::from_str("V"), Some(LogLevel::Verbose));
        assert_eq!(LogLevel::from_str("debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("loud"), None);
        assert_eq!(LogLevel::Debug.level_filter(), LevelFilter::TRACE);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CWM_ALGEBRA_LOG_LEVEL", "debug"),
            ("CWM_ALGEBRA_INCREMENTAL", "off"),
            ("CWM_ALGEBRA_FOLLOW_CYCLES", "yes"),
        ]
        .into_iter()
        .collect();

        let mut config = CwmConfig::new();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.general.log_level, LogLevel::Debug);
        assert!(!config.evaluation.incremental);
        assert!(config.evaluation.follow_cycles);
    }

    #[test]
    fn test_invalid_log_level_override() {
        let mut config = CwmConfig::new();
        let result = config.apply_overrides(|key| {
            (key == "CWM_ALGEBRA_LOG_LEVEL").then(|| "shouty".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidValue(..))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cwm-algebra.toml");

        let mut config = CwmConfig::new();
        config.evaluation.dedup_reduced = true;
        config.general.log_level = LogLevel::Quiet;
        config.save_to_file(&path).unwrap();

        let reloaded = CwmConfig::load_from_file(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = CwmConfig::load_from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }

    #[test]
    fn test_serialize_config() {
        let toml = CwmConfig::new().to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[evaluation]"));
    }

    #[test]
    fn test_config_paths() {
        let paths = CwmConfig::config_paths();
        assert!(paths[0].ends_with("cwm-algebra.toml"));
    }
}
