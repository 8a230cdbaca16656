//! Server Configuration
//!
//! Configuration is a JSON file:
//!
//! ```text
//! {
//!   "port": 8080,
//!   "authorization": true,
//!   "secretKey": "change-me",
//!   "users": [{ "login": "admin", "password": "admin" }],
//!   "dumpFile": "emberkv.dump.json",
//!   "dumpInterval": 60
//! }
//! ```
//!
//! Every field is optional. Persistence is enabled only when `dumpFile` is
//! set and `dumpInterval` is positive.

use crate::{DEFAULT_HOST, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A user allowed to log in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub password: String,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Require a login token on key endpoints
    pub authorization: bool,

    /// Mixed into issued tokens
    pub secret_key: String,

    /// Users allowed to log in
    pub users: Vec<User>,

    /// Snapshot file
    pub dump_file: Option<PathBuf>,

    /// Seconds between snapshots; zero or negative disables persistence
    pub dump_interval: i64,

    /// Milliseconds between expiry sweeps
    pub expiry_interval: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            authorization: false,
            secret_key: String::new(),
            users: Vec::new(),
            dump_file: None,
            dump_interval: 0,
            expiry_interval: 1000,
        }
    }
}

impl ServerConfig {
    /// Reads a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses a JSON config document.
    pub fn from_json(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }

    /// Returns the snapshot file and dump interval, if persistence is enabled.
    pub fn persistence(&self) -> Option<(PathBuf, Duration)> {
        match &self.dump_file {
            Some(file) if self.dump_interval > 0 => {
                Some((file.clone(), Duration::from_secs(self.dump_interval as u64)))
            }
            _ => None,
        }
    }

    /// Interval of the expiry reaper.
    pub fn expiry_tick(&self) -> Duration {
        Duration::from_millis(self.expiry_interval.max(1))
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
