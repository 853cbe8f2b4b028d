//! Error types for the catalog core.
//!
//! Upstream failures never escape the catalog layer: providers collapse them
//! into empty lists. These types exist so the client and configuration can
//! report *why* something was empty.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single upstream call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Connection, TLS, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-2xx status.
    #[error("HTTP error! status: {0}")]
    Status(u16),

    /// Body was not valid JSON.
    #[error("invalid JSON: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            UpstreamError::Status(status.as_u16())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid API base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
