//! Error types for the download streamer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while streaming a resolved download to disk.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The download was handed to the streamer before a target was set.
    #[error("no target path set for {file_name}")]
    MissingTarget {
        /// File name of the download lacking a target.
        file_name: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS, interrupted body).
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The direct link that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The direct link that timed out.
        url: String,
    },

    /// The direct link answered with a non-success status.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The direct link.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error (create directory, create file, write, flush).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The streaming HTTP client could not be constructed.
    #[error("HTTP client construction failed: {reason}")]
    Client {
        /// Why construction failed.
        reason: String,
    },
}

impl DownloadError {
    /// Creates a network error, promoting timeouts to [`DownloadError::Timeout`].
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

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a missing-target error.
    pub fn missing_target(file_name: impl Into<String>) -> Self {
        Self::MissingTarget {
            file_name: file_name.into(),
        }
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// URL or path the source error lacks.
