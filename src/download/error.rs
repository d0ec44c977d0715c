//! Error types for the download module.
//!
//! Every variant carries the URL or path it concerns so the log line that
//! terminates a run is enough to diagnose it.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching pages or artifacts.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    /// File system error while writing the artifact.
    #[error("IO error writing to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The URL has no usable last path segment to name the file after.
    #[error("cannot derive a filename from {url}")]
    InvalidFilename { url: String },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl DownloadError {
    /// Creates a network error, promoting reqwest timeouts to [`DownloadError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::Timeout { url: url.into() };
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid filename error.
    pub fn invalid_filename(url: impl Into<String>) -> Self {
        Self::InvalidFilename { url: url.into() }
    }
}
