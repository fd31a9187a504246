//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                 | Default          |
//! |--------------------------|------------------|
//! | `VITRINA_HOST`           | `0.0.0.0`        |
//! | `VITRINA_PORT`           | `8080`           |
//! | `VITRINA_DB_PATH`        | `./vitrina.db`   |
//! | `VITRINA_DB_MAX_CONNECTIONS` | `5`          |
//! | `VITRINA_DEFAULT_BRANCH` | `Центральный`    |
//! | `VITRINA_MANUAL_LABELS`  | empty (comma-separated list) |

use serde::{Deserialize, Serialize};
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use vitrina_core::DEFAULT_BRANCH;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: IpAddr,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Branch recorded when neither sale nor product names one
    pub default_branch: String,

    /// Manual payment labels accepted in addition to the stored ones
    pub manual_labels: Vec<String>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = ApiConfig {
            host: lookup("VITRINA_HOST")
                .unwrap_or_else(|| "0.0.0.0".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("VITRINA_HOST".to_string()))?,

            port: lookup("VITRINA_PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("VITRINA_PORT".to_string()))?,

            database_path: lookup("VITRINA_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./vitrina.db")),

            max_connections: lookup("VITRINA_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("VITRINA_DB_MAX_CONNECTIONS".to_string()))?,

            default_branch: lookup("VITRINA_DEFAULT_BRANCH")
                .map(|b| b.trim().to_string())
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),

            manual_labels: lookup("VITRINA_MANUAL_LABELS")
                .map(|raw| raw.split(',').map(|l| l.trim().to_string()).collect())
                .unwrap_or_default(),
        };

        if config.default_branch.is_empty() {
            return Err(ConfigError::MissingRequired("VITRINA_DEFAULT_BRANCH".to_string()));
        }
        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("VITRINA_DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
