//! Server configuration.
//!
//! Read from an optional TOML file, then overridden by command-line flags
//! and the `PING_MESSAGE` environment variable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use opticare_core::RepositoryOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable that replaces the ping message.
pub const PING_MESSAGE_ENV: &str = "PING_MESSAGE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    /// Body of `GET /api/ping`
    pub ping_message: String,
    /// Deadline for each store read
    pub load_timeout_secs: u64,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_path: PathBuf::from("opticare.db"),
            ping_message: "ping".to_string(),
            load_timeout_secs: 15,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file, or defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&content).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply the ping message override, if set and not blank.
    pub fn with_ping_override(mut self, value: Option<String>) -> Self {
        if let Some(message) = value.filter(|m| !m.trim().is_empty()) {
            self.ping_message = message;
        }
        self
    }

    /// Apply `PING_MESSAGE` from the process environment.
    pub fn with_env(self) -> Self {
        self.with_ping_override(std::env::var(PING_MESSAGE_ENV).ok())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn repository_options(&self) -> RepositoryOptions {
        RepositoryOptions {
            load_timeout: Duration::from_secs(self.load_timeout_secs),
        }
    }
}
