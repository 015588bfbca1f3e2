use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::AppError;
use crate::loader::{TickColumns, TickSource};
use crate::stream::DEFAULT_PACING;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,
    #[serde(default = "default_bid_column")]
    pub bid_column: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_allowed_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("../data/cl_tick_data.csv")
}

fn default_timestamp_column() -> String {
    "jst".to_string()
}

fn default_bid_column() -> String {
    "bid".to_string()
}

fn default_pacing_ms() -> u64 {
    DEFAULT_PACING.as_millis() as u64
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            allowed_origin: default_allowed_origin(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            timestamp_column: default_timestamp_column(),
            bid_column: default_bid_column(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing_ms(),
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

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        self.bind_addr
            .parse()
            .map_err(|_| AppError::Config(format!("invalid bind_addr '{}'", self.bind_addr)))
    }
}

impl DataConfig {
    pub fn tick_source(&self) -> TickSource {
        TickSource::new(
            self.csv_path.clone(),
            TickColumns {
                timestamp: self.timestamp_column.clone(),
                bid: self.bid_column.clone(),
            },
        )
    }
}

impl StreamConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_path = std::env::var("TICK_EMBED_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut config = Self::from_path(&config_path)?;
        config.apply_env_overrides();
        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    /// Read a TOML config file; a missing file yields the built-in defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&config_str)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(bind) = std::env::var("TICK_EMBED_BIND") {
            self.server.bind_addr = bind;
        }
        if let Ok(origin) = std::env::var("TICK_EMBED_ALLOWED_ORIGIN") {
            self.server.allowed_origin = origin;
        }
        if let Ok(path) = std::env::var("TICK_EMBED_CSV_PATH") {
            self.data.csv_path = PathBuf::from(path);
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.server.socket_addr()?;
        if self.server.allowed_origin.trim().is_empty() {
            return Err(AppError::Origin(self.server.allowed_origin.clone()));
        }
        if self.stream.pacing_ms == 0 {
            return Err(AppError::Config("stream.pacing_ms must be > 0".to_string()));
        }
        if self.data.timestamp_column.is_empty() || self.data.bid_column.is_empty() {
            return Err(AppError::Config("data column names must not be empty".to_string()));
        }
        Ok(())
    }
}
