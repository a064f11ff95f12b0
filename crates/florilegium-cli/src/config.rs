//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use florilegium_curator::CuratorConfig;
use florilegium_extractor::ExtractorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration, stored at `~/.florilegium/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database file
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Generator backend
    #[serde(default)]
    pub llm: LlmSettings,

    /// Output settings
    #[serde(default)]
    pub settings: Settings,

    /// Chunking, retry and failure policy for `extract`
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Batching, retry and timeouts for `curate`
    #[serde(default)]
    pub curator: CuratorConfig,
}

/// Ollama connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Ollama API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// HTTP timeout for a single request (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(home()?.join("config.toml"))
    }

    /// Load configuration from the default path, or defaults if it does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load configuration from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check the pipeline sections before anything touches the database.
    pub fn validate(&self) -> Result<()> {
        self.extractor
            .validate()
            .map_err(|e| CliError::Config(format!("[extractor] {}", e)))?;
        self.curator
            .validate()
            .map_err(|e| CliError::Config(format!("[curator] {}", e)))?;
        if self.llm.model.trim().is_empty() {
            return Err(CliError::Config("[llm] model must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            llm: LlmSettings::default(),
            settings: Settings::default(),
            extractor: ExtractorConfig::default(),
            curator: CuratorConfig::default(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn home() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
    Ok(home.join(".florilegium"))
}

fn default_database() -> PathBuf {
    home()
        .map(|dir| dir.join("florilegium.db"))
        .unwrap_or_else(|_| PathBuf::from("florilegium.db"))
}

fn default_endpoint() -> String {
    florilegium_llm::ollama::DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_request_timeout() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
