//! Configuration management for Co-Pilot Board
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! The resulting [`Config`] is built once at process start and handed to
//! each component by reference.

use crate::error::{CoboardError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure for Co-Pilot Board
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Completion provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Conversation store settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Context, summary and analysis tuning
    #[serde(default)]
    pub board: BoardConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Origins allowed by CORS; empty allows any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8787".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            allowed_origins: Vec::new(),
        }
    }
}

/// OpenAI-compatible completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API base URL; `/chat/completions` is appended
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API key, usually supplied through `OPENAI_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Model used for every completion
    #[serde(default = "default_model")]
    pub model: String,

    /// HTTP request timeout (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_seconds() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            model: default_model(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Conversation store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file; defaults to the platform data directory
    #[serde(default)]
    pub db_path: Option<String>,
}

impl StorageConfig {
    /// Resolve the database path, falling back to the user's data directory
    pub fn resolve_db_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(PathBuf::from(path));
        }

        let proj_dirs = ProjectDirs::from("com", "coboard", "coboard").ok_or_else(|| {
            CoboardError::Storage("Could not determine data directory".to_string())
        })?;

        Ok(proj_dirs.data_dir().join("board.db"))
    }
}

/// Context window, summarization and meta-analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Fixed system instruction opening every chat prompt
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Prior exchanges included in a chat prompt
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,

    /// New messages required before the rolling summary is regenerated
    #[serde(default = "default_summary_interval")]
    pub summary_interval: usize,

    /// Token bound for generated summaries
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,

    /// Sampling temperature for chat replies
    #[serde(default = "default_chat_temperature")]
    pub chat_temperature: f32,

    /// Token bound for chat replies
    #[serde(default = "default_chat_max_tokens")]
    pub chat_max_tokens: u32,

    /// Messages fed into one meta-analysis
    #[serde(default = "default_analysis_window")]
    pub analysis_window: usize,

    /// Sampling temperature for summaries and meta-analysis
    #[serde(default = "default_analysis_temperature")]
    pub analysis_temperature: f32,

    /// Token bound for meta-analysis replies
    #[serde(default = "default_analysis_max_tokens")]
    pub analysis_max_tokens: u32,

    /// Maximum points kept per category
    #[serde(default = "default_max_points")]
    pub max_points_per_category: usize,
}

fn default_system_prompt() -> String {
    "Du bist ein hilfreicher KI-Assistent. Antworte auf Deutsch und sei präzise und nützlich."
        .to_string()
}

fn default_recent_window() -> usize {
    10
}

fn default_summary_interval() -> usize {
    5
}

fn default_summary_max_tokens() -> u32 {
    400
}

fn default_chat_temperature() -> f32 {
    0.7
}

fn default_chat_max_tokens() -> u32 {
    1000
}

fn default_analysis_window() -> usize {
    20
}

fn default_analysis_temperature() -> f32 {
    0.3
}

fn default_analysis_max_tokens() -> u32 {
    1000
}

fn default_max_points() -> usize {
    5
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            recent_window: default_recent_window(),
            summary_interval: default_summary_interval(),
            summary_max_tokens: default_summary_max_tokens(),
            chat_temperature: default_chat_temperature(),
            chat_max_tokens: default_chat_max_tokens(),
            analysis_window: default_analysis_window(),
            analysis_temperature: default_analysis_temperature(),
            analysis_max_tokens: default_analysis_max_tokens(),
            max_points_per_category: default_max_points(),
        }
    }
}

impl Config {
    /// Load configuration from file, environment variables, and CLI
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - Parsed command line arguments
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CoboardError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| CoboardError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            if !api_key.trim().is_empty() {
                self.provider.api_key = Some(api_key);
            }
        }

        if let Ok(api_base) = std::env::var("COBOARD_API_BASE") {
            self.provider.api_base = api_base;
        }

        if let Ok(model) = std::env::var("COBOARD_MODEL") {
            self.provider.model = model;
        }

        if let Ok(bind_addr) = std::env::var("COBOARD_BIND_ADDR") {
            self.server.bind_addr = bind_addr;
        }

        if let Ok(db_path) = std::env::var("COBOARD_DB_PATH") {
            self.storage.db_path = Some(db_path);
        }

        if let Ok(window) = std::env::var("COBOARD_RECENT_WINDOW") {
            if let Ok(value) = window.parse() {
                self.board.recent_window = value;
            } else {
                tracing::warn!("Invalid COBOARD_RECENT_WINDOW: {}", window);
            }
        }

        if let Ok(interval) = std::env::var("COBOARD_SUMMARY_INTERVAL") {
            if let Ok(value) = interval.parse() {
                self.board.summary_interval = value;
            } else {
                tracing::warn!("Invalid COBOARD_SUMMARY_INTERVAL: {}", interval);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(db_path) = &cli.storage_path {
            tracing::info!("Using storage DB override from CLI: {}", db_path);
            self.storage.db_path = Some(db_path.clone());
        }

        if let crate::cli::Commands::Serve { bind: Some(bind) } = &cli.command {
            self.server.bind_addr = bind.clone();
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges.
    /// The API key is not checked here; the provider reports it missing
    /// when it is built, so store-only commands work without one.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.server.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(CoboardError::Config(format!(
                "server.bind_addr is not a valid socket address: {}",
                self.server.bind_addr
            ))
            .into());
        }

        if self.provider.api_base.trim().is_empty() {
            return Err(
                CoboardError::Config("provider.api_base cannot be empty".to_string()).into(),
            );
        }

        if self.provider.model.trim().is_empty() {
            return Err(CoboardError::Config("provider.model cannot be empty".to_string()).into());
        }

        if self.provider.timeout_seconds == 0 {
            return Err(CoboardError::Config(
                "provider.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.board.recent_window == 0 {
            return Err(CoboardError::Config(
                "board.recent_window must be greater than 0".to_string(),
            )
            .into());
        }

        if self.board.summary_interval == 0 {
            return Err(CoboardError::Config(
                "board.summary_interval must be greater than 0".to_string(),
            )
            .into());
        }

        if self.board.analysis_window == 0 {
            return Err(CoboardError::Config(
                "board.analysis_window must be greater than 0".to_string(),
            )
            .into());
        }

        if self.board.max_points_per_category == 0 {
            return Err(CoboardError::Config(
                "board.max_points_per_category must be greater than 0".to_string(),
            )
            .into());
        }

        for (name, value) in [
            ("board.chat_temperature", self.board.chat_temperature),
            ("board.analysis_temperature", self.board.analysis_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(
                    CoboardError::Config(format!("{} must be between 0.0 and 2.0", name)).into(),
                );
            }
        }

        Ok(())
    }
}
