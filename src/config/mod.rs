//! Configuration management for entclust
//!
//! This module handles loading and validating configuration from environment variables,
//! files, and command-line arguments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cluster::{ClusterConfig, Strategy};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input configuration
    pub input: InputConfig,

    /// Output configuration
    pub output: OutputConfig,

    /// Clustering configuration
    pub clustering: ClusterConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Where entity tables are read from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Table files or directories, concatenated in order
    pub paths: Vec<PathBuf>,
}

/// Where results are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory
    pub dir: PathBuf,

    /// Also write `run_report.json`
    pub write_report: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            write_report: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `ENTCLUST_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(paths) = std::env::var("ENTCLUST_INPUT") {
            self.input.paths = std::env::split_paths(&paths).collect();
        }

        if let Ok(dir) = std::env::var("ENTCLUST_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }

        if let Ok(strategy) = std::env::var("ENTCLUST_STRATEGY") {
            self.clustering.strategy = strategy
                .parse::<Strategy>()
                .context("Invalid ENTCLUST_STRATEGY")?;
        }

        if let Ok(seed) = std::env::var("ENTCLUST_SEED") {
            let seed = seed
                .parse::<u64>()
                .with_context(|| format!("Invalid ENTCLUST_SEED: {seed}"))?;
            self.clustering.seed = Some(seed);
        }

        if let Some(require) = std::env::var("ENTCLUST_REQUIRE_NAMES")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
        {
            self.clustering.require_names = require;
        }

        if let Ok(level) = std::env::var("ENTCLUST_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = std::env::var("ENTCLUST_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.output.dir.as_os_str().is_empty() {
            anyhow::bail!("output.dir must not be empty");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!(
                "logging.format must be 'text' or 'json', got '{}'",
                self.logging.format
            );
        }

        self.clustering
            .validate()
            .context("Invalid clustering configuration")?;

        Ok(())
    }
}
