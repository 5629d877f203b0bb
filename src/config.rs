//! Runtime settings for the command-line and HTTP front ends.
//!
//! Values come from built-in defaults, then an optional JSON file, then
//! `GANTT_*` environment variables:
//! - `GANTT_CONFIG` - path of the JSON settings file
//! - `GANTT_HOLIDAYS` - holiday data file
//! - `GANTT_DATA` - where the task list is saved
//! - `GANTT_HTTP_ADDR` - listen address of the HTTP API

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_PATH_VAR: &str = "GANTT_CONFIG";
pub const HOLIDAYS_PATH_VAR: &str = "GANTT_HOLIDAYS";
pub const DATA_PATH_VAR: &str = "GANTT_DATA";
pub const HTTP_ADDR_VAR: &str = "GANTT_HTTP_ADDR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid listen address '{0}'")]
    InvalidAddr(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub holidays_path: PathBuf,
    pub data_path: PathBuf,
    pub http_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            holidays_path: PathBuf::from("data/holidays.json"),
            data_path: PathBuf::from("gantt-tasks.json"),
            http_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Defaults, the file named by `GANTT_CONFIG` if set, then variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => {
                let config = Self::from_file(&path)?;
                tracing::info!("Loaded settings from {}", path);
                config
            }
            None => Self::default(),
        };
        config.apply_overrides(lookup);
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(HOLIDAYS_PATH_VAR) {
            self.holidays_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(DATA_PATH_VAR) {
            self.data_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup(HTTP_ADDR_VAR) {
            self.http_addr = addr;
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.http_addr
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(self.http_addr.clone()))
    }
}
