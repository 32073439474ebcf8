//! Error types for the hashpatch update client.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fingerprinting the local installation tree
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Tree build aborted: {0}")]
    Aborted(String),
}

impl TreeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TreeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by the remote update service
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    #[error("No download available for content hash {hash}")]
    NotFound { hash: String },

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl GatewayError {
    /// Whether the failure is a missing artifact rather than a transport problem
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
    }
}

/// Top-level errors for an update run
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Invalid version {input:?}: {message}")]
    VersionParse { input: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl From<config::ConfigError> for UpdateError {
    fn from(err: config::ConfigError) -> Self {
        UpdateError::Config(err.to_string())
    }
}
