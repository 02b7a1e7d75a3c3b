//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and
//! environment variables, and merging configurations with proper
//! precedence rules (XDG < home < local < environment < CLI).

use crate::error::ResolveError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration loaded from TOML files.
///
/// This is the structure of the `domain-resolve.toml` files users can
/// create to set default values.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Output formatting preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Default concurrency for multi-target lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Default RDAP timeout (as string, e.g., "5s", "30s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Skip the thick RDAP fetch by default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thin_only: Option<bool>,

    /// Default override RDAP server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Try the third-party WHOIS mirror before the raw socket
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scrape: Option<bool>,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Default output format ("text" or "json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,

    /// Pretty-print JSON by default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_pretty: Option<bool>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager;

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, ResolveError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ResolveError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ResolveError::config(format!(
                "Failed to read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            ResolveError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;
        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Merges XDG config, home-directory config, and local config, with
    /// the local file winning conflicts.
    pub fn discover_and_load(&self) -> Result<FileConfig, ResolveError> {
        let mut merged = FileConfig::default();

        if let Some(path) = self.xdg_config_path() {
            if let Ok(config) = self.load_file(&path) {
                tracing::debug!(path = %path.display(), "loaded XDG config");
                merged = self.merge_configs(merged, config);
            }
        }

        if let Some(path) = self.home_config_path() {
            if let Ok(config) = self.load_file(&path) {
                tracing::debug!(path = %path.display(), "loaded home config");
                merged = self.merge_configs(merged, config);
            }
        }

        if let Some(path) = self.local_config_path() {
            if let Ok(config) = self.load_file(&path) {
                tracing::debug!(path = %path.display(), "loaded local config");
                merged = self.merge_configs(merged, config);
            }
        }

        Ok(merged)
    }

    fn local_config_path(&self) -> Option<PathBuf> {
        ["./domain-resolve.toml", "./.domain-resolve.toml"]
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf)
    }

    fn home_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".domain-resolve.toml", "domain-resolve.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|p| p.exists())
    }

    fn xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("domain-resolve").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations; values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(mut low), Some(high)) => {
                    if high.concurrency.is_some() {
                        low.concurrency = high.concurrency;
                    }
                    if high.timeout.is_some() {
                        low.timeout = high.timeout;
                    }
                    if high.thin_only.is_some() {
                        low.thin_only = high.thin_only;
                    }
                    if high.server.is_some() {
                        low.server = high.server;
                    }
                    if high.scrape.is_some() {
                        low.scrape = high.scrape;
                    }
                    Some(low)
                }
                (low, high) => high.or(low),
            },
            output: match (lower.output, higher.output) {
                (Some(mut low), Some(high)) => {
                    if high.default_format.is_some() {
                        low.default_format = high.default_format;
                    }
                    if high.json_pretty.is_some() {
                        low.json_pretty = high.json_pretty;
                    }
                    Some(low)
                }
                (low, high) => high.or(low),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), ResolveError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > 64 {
                    return Err(ResolveError::config(
                        "Concurrency must be between 1 and 64",
                    ));
                }
            }

            if let Some(timeout_str) = &defaults.timeout {
                if parse_timeout_string(timeout_str).is_none() {
                    return Err(ResolveError::config(format!(
                        "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                        timeout_str
                    )));
                }
            }
        }

        if let Some(output) = &config.output {
            if let Some(format) = &output.default_format {
                if !matches!(format.as_str(), "text" | "json") {
                    return Err(ResolveError::config(format!(
                        "Invalid output format '{}'. Use 'text' or 'json'",
                        format
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// These are the values settable via `DR_*` environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub timeout: Option<String>,
    pub thin_only: Option<bool>,
    pub server: Option<String>,
    pub scrape: Option<bool>,
    pub json: Option<bool>,
    pub file: Option<String>,
    pub config: Option<String>,
}

/// Load configuration from `DR_*` environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    let mut env_config = EnvConfig::default();

    if let Ok(val) = env::var("DR_CONCURRENCY") {
        match val.parse::<usize>() {
            Ok(n) if (1..=64).contains(&n) => env_config.concurrency = Some(n),
            _ => tracing::warn!("Invalid DR_CONCURRENCY='{}', must be 1-64", val),
        }
    }

    if let Ok(val) = env::var("DR_TIMEOUT") {
        if parse_timeout_string(&val).is_some() {
            env_config.timeout = Some(val);
        } else {
            tracing::warn!("Invalid DR_TIMEOUT='{}', use format like '5s', '2m'", val);
        }
    }

    if let Ok(val) = env::var("DR_THIN_ONLY") {
        match parse_bool(&val) {
            Some(b) => env_config.thin_only = Some(b),
            None => tracing::warn!("Invalid DR_THIN_ONLY='{}', use true/false", val),
        }
    }

    if let Ok(val) = env::var("DR_SERVER") {
        if !val.trim().is_empty() {
            env_config.server = Some(val);
        }
    }

    if let Ok(val) = env::var("DR_SCRAPE") {
        match parse_bool(&val) {
            Some(b) => env_config.scrape = Some(b),
            None => tracing::warn!("Invalid DR_SCRAPE='{}', use true/false", val),
        }
    }

    if let Ok(val) = env::var("DR_JSON") {
        match parse_bool(&val) {
            Some(b) => env_config.json = Some(b),
            None => tracing::warn!("Invalid DR_JSON='{}', use true/false", val),
        }
    }

    if let Ok(val) = env::var("DR_FILE") {
        if !val.trim().is_empty() {
            env_config.file = Some(val);
        }
    }

    if let Ok(val) = env::var("DR_CONFIG") {
        if !val.trim().is_empty() {
            env_config.config = Some(val);
        }
    }

    env_config
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(s) = timeout_str.strip_suffix('s') {
        s.parse::<u64>().ok()
    } else if let Some(m) = timeout_str.strip_suffix('m') {
        m.parse::<u64>().ok().map(|m| m * 60)
    } else {
        timeout_str.parse::<u64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_timeout_string() {
        assert_eq!(parse_timeout_string("5s"), Some(5));
        assert_eq!(parse_timeout_string("30s"), Some(30));
        assert_eq!(parse_timeout_string("2m"), Some(120));
        assert_eq!(parse_timeout_string("5"), Some(5));
        assert_eq!(parse_timeout_string("invalid"), None);
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[defaults]
concurrency = 16
timeout = "8s"
thin_only = true

[output]
default_format = "json"
json_pretty = true
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let manager = ConfigManager::new();
        let config = manager.load_file(temp_file.path()).unwrap();

        let defaults = config.defaults.unwrap();
        assert_eq!(defaults.concurrency, Some(16));
        assert_eq!(defaults.timeout.as_deref(), Some("8s"));
        assert_eq!(defaults.thin_only, Some(true));

        let output = config.output.unwrap();
        assert_eq!(output.default_format.as_deref(), Some("json"));
    }

    #[test]
    fn test_invalid_concurrency_rejected() {
        let config_content = r#"
[defaults]
concurrency = 0
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let manager = ConfigManager::new();
        assert!(manager.load_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_invalid_output_format_rejected() {
        let config_content = r#"
[output]
default_format = "yaml"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let manager = ConfigManager::new();
        assert!(manager.load_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_merge_configs() {
        let manager = ConfigManager::new();

        let lower = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(4),
                timeout: Some("5s".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let higher = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(16),
                thin_only: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = manager.merge_configs(lower, higher);
        let defaults = merged.defaults.unwrap();

        assert_eq!(defaults.concurrency, Some(16)); // higher wins
        assert_eq!(defaults.timeout.as_deref(), Some("5s")); // lower preserved
        assert_eq!(defaults.thin_only, Some(true));
    }
}
