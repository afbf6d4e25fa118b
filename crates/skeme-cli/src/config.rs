//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/JSON/TOML)
//!
//! Environment variables and command-line flags are applied on top by the
//! callers that consume each section.

use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use skeme_core::HttpTransportConfig;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resolution settings
    pub resolve: ResolveConfig,

    /// HTTP transport settings
    pub http: HttpConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Resolution configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Base URL for relative inputs
    pub base_url: Option<String>,

    /// Keep provenance of resolved references
    pub keep_refs: bool,

    /// Cache documents within a run
    pub cache: bool,

    /// Reject non-string `$ref` values
    pub strict_refs: bool,
}

/// HTTP configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Timeout, user agent and TLS settings
    #[serde(flatten)]
    pub transport: HttpTransportConfig,

    /// Headers sent with every request
    pub headers: BTreeMap<String, String>,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: String,

    /// Use colored output by default
    pub color: bool,

    /// Show progress indicators
    pub progress: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no -v flag is given
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: String,

    /// Log file path
    pub file: Option<PathBuf>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            keep_refs: false,
            cache: true,
            strict_refs: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "human".to_string(),
            color: true,
            progress: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: "compact".to_string(),
            file: None,
        }
    }
}

impl OutputConfig {
    /// The configured default output format
    pub fn output_format(&self) -> Result<OutputFormat> {
        OutputFormat::from_str(&self.format, true)
            .map_err(|_| Error::config(format!("unknown output format '{}'", self.format)))
    }
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFileFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFileFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Some(Self::Yaml),
            Some("json") => Some(Self::Json),
            Some("toml") => Some(Self::Toml),
            _ => None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let format = ConfigFileFormat::from_path(path).ok_or_else(|| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "YAML, JSON or TOML".to_string(),
        })?;
        let content = std::fs::read_to_string(path)?;

        let config = match format {
            ConfigFileFormat::Yaml => serde_yaml::from_str(&content)?,
            ConfigFileFormat::Json => serde_json::from_str(&content)?,
            ConfigFileFormat::Toml => toml::from_str(&content)?,
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in &Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        eprintln!("Warning: Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        // Return default config if no config file found
        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        const EXTENSIONS: [&str; 4] = ["yaml", "yml", "json", "toml"];
        let mut paths = Vec::new();

        // Current directory
        for ext in EXTENSIONS {
            paths.push(PathBuf::from(format!(".skeme.{}", ext)));
        }

        // User config directory
        if let Some(config_dir) = dirs::config_dir() {
            let skeme_dir = config_dir.join("skeme");
            for ext in EXTENSIONS {
                paths.push(skeme_dir.join(format!("config.{}", ext)));
            }
        }

        // Home directory
        if let Some(home_dir) = dirs::home_dir() {
            for ext in EXTENSIONS {
                paths.push(home_dir.join(format!(".skeme.{}", ext)));
            }
        }

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.resolve.cache);
        assert!(!config.resolve.keep_refs);
        assert_eq!(config.http.transport, HttpTransportConfig::default());
        assert_eq!(config.output.output_format().unwrap(), OutputFormat::Human);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("skeme.yaml");
        fs::write(
            &path,
            "resolve:\n  keep_refs: true\nhttp:\n  timeout_secs: 5\n  headers:\n    x-api-key: abc\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(config.resolve.keep_refs);
        assert!(config.resolve.cache);
        assert_eq!(config.http.transport.timeout_secs, 5);
        assert!(config.http.transport.validate_tls);
        assert_eq!(config.http.headers["x-api-key"], "abc");
    }

    #[test]
    fn test_toml_and_json_files() {
        let dir = tempdir().unwrap();

        let toml_path = dir.path().join("config.toml");
        fs::write(
            &toml_path,
            "[resolve]\nbase_url = \"http://host/specs/\"\n\n[output]\nformat = \"yaml\"\n",
        )
        .unwrap();
        let config = Config::from_file(&toml_path).unwrap();
        assert_eq!(config.resolve.base_url.as_deref(), Some("http://host/specs/"));
        assert_eq!(config.output.output_format().unwrap(), OutputFormat::Yaml);

        let json_path = dir.path().join("config.json");
        fs::write(&json_path, r#"{"logging": {"level": "debug", "format": "json"}}"#).unwrap();
        let config = Config::from_file(&json_path).unwrap();
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_missing_and_unknown_files() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Config::from_file(&dir.path().join("absent.yaml")),
            Err(Error::FileNotFound { .. })
        ));

        let ini = dir.path().join("config.ini");
        fs::write(&ini, "x=1").unwrap();
        assert!(matches!(Config::from_file(&ini), Err(Error::InvalidFormat { .. })));
    }

    #[test]
    fn test_unknown_output_format_is_config_error() {
        let output = OutputConfig {
            format: "xml".to_string(),
            ..OutputConfig::default()
        };
        assert!(matches!(output.output_format(), Err(Error::Config(_))));
    }

    #[test]
    fn test_default_paths_cover_all_formats() {
        let paths = Config::default_config_paths();
        assert!(paths.contains(&PathBuf::from(".skeme.yaml")));
        assert!(paths.contains(&PathBuf::from(".skeme.toml")));
    }
}
