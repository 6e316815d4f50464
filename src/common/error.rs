//! Error types for kvfab

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Config Errors ===
    #[error("Config error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    // === Cluster API Errors ===
    #[error("Cluster unavailable at {endpoint}: {reason}")]
    ClusterUnavailable { endpoint: String, reason: String },

    #[error("Member rejected ({status}): {reason}")]
    MemberRejected { status: u16, reason: String },

    #[error("No cluster endpoints configured")]
    NoEndpoints,

    // === Process Errors ===
    #[error("Failed to start {program}: {source}")]
    ProcessStart {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write pid file {}: {source}", .path.display())]
    PidFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Generic ===
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Is this a transport-level failure (cluster not reachable or not serving)?
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ClusterUnavailable { .. } | Error::NoEndpoints)
    }

    pub(crate) fn unavailable(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Error::ClusterUnavailable {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }
}
