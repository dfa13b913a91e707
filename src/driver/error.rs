//! Error types for driver operations.
//!
//! Every failure a driver or the registry can produce is a [`DriverError`].
//! [`DriverError::kind`] collapses the variants into the coarse
//! [`ErrorKind`] taxonomy callers use to pick messaging and retry behavior.

use std::time::Duration;

use thiserror::Error;

/// Message used when a parsed page carries no usable direct link.
pub const NO_DOWNLOAD_LINK: &str = "unable to get download link";

/// Coarse classification of driver failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No registered driver claims the URL or name.
    NoMatchingDriver,
    /// Host rejected the request, wrong driver, transport or configuration failure.
    Driver,
    /// Authentication unsupported or rejected.
    Auth,
    /// File-level error reported by the host, or no usable direct link.
    Download,
    /// Host asked us to come back later.
    DownloadCooldown,
}

/// Errors that can occur while selecting a driver or resolving a URL.
#[derive(Debug, Error)]
pub enum DriverError {
    /// No registered driver matches the URL or name.
    #[error("no driver found for '{input}'\n  Suggestion: run `hostdl drivers` to list supported hosts")]
    NoMatchingDriver {
        /// URL or driver name that was looked up.
        input: String,
    },

    /// Two drivers were registered under the same name.
    #[error("driver '{name}' is registered twice")]
    DuplicateDriver {
        /// The duplicated driver name.
        name: String,
    },

    /// The URL was handed to a driver that does not recognize it.
    #[error("Wrong host for querying info: {driver} cannot handle {url}")]
    WrongHost {
        /// Driver that rejected the URL.
        driver: String,
        /// The rejected URL.
        url: String,
    },

    /// The host answered with a status other than 200.
    #[error("Unable to reach {url} (received {status} {status_text})")]
    Unreachable {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status.
        status_text: String,
    },

    /// The request never produced a response (DNS, TLS, timeout, body read).
    #[error("network error querying {url} for {driver}: {source}")]
    Transport {
        /// Driver issuing the request.
        driver: String,
        /// Requested URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed for {driver}: {reason}")]
    Client {
        /// Driver whose client failed.
        driver: String,
        /// Why construction failed.
        reason: String,
    },

    /// Credential store failure.
    #[error("credential store error for {driver}: {reason}")]
    Credential {
        /// Driver whose credential was touched.
        driver: String,
        /// Store error message.
        reason: String,
    },

    /// Authentication unsupported or rejected.
    #[error("authentication failed for {driver}: {reason}")]
    Auth {
        /// Driver that refused authentication.
        driver: String,
        /// Why authentication failed.
        reason: String,
    },

    /// File-level failure reported by the host, or no direct link found.
    #[error("{driver}: {message}")]
    Download {
        /// Driver that resolved the page.
        driver: String,
        /// Host error text (verbatim) or [`NO_DOWNLOAD_LINK`].
        message: String,
    },

    /// The host imposes a temporary wait before the next free download.
    #[error("{driver}: {message}")]
    DownloadCooldown {
        /// Driver that resolved the page.
        driver: String,
        /// Host cooldown text.
        message: String,
        /// Wait advertised by the host, when it could be parsed.
        wait: Option<Duration>,
    },
}

impl DriverError {
    /// Creates a `NoMatchingDriver` error.
    #[must_use]
    pub fn no_matching_driver(input: &str) -> Self {
        Self::NoMatchingDriver {
            input: input.to_string(),
        }
    }

    /// Creates a `WrongHost` error.
    #[must_use]
    pub fn wrong_host(driver: &str, url: &str) -> Self {
        Self::WrongHost {
            driver: driver.to_string(),
            url: url.to_string(),
        }
    }

    /// Creates an `Unreachable` error from a status code.
    #[must_use]
    pub fn unreachable(url: &str, status: reqwest::StatusCode) -> Self {
        Self::Unreachable {
            url: url.to_string(),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }

    /// Creates an `Auth` error.
    #[must_use]
    pub fn auth(driver: &str, reason: &str) -> Self {
        Self::Auth {
            driver: driver.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a content-level `Download` error.
    #[must_use]
    pub fn download(driver: &str, message: &str) -> Self {
        Self::Download {
            driver: driver.to_string(),
            message: message.to_string(),
        }
    }

    /// Creates a `Download` error for a page without a direct link.
    #[must_use]
    pub fn no_download_link(driver: &str) -> Self {
        Self::download(driver, NO_DOWNLOAD_LINK)
    }

    /// Creates a `DownloadCooldown` error.
    #[must_use]
    pub fn cooldown(driver: &str, message: &str, wait: Option<Duration>) -> Self {
        Self::DownloadCooldown {
            driver: driver.to_string(),
            message: message.to_string(),
            wait,
        }
    }

    /// Classifies the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoMatchingDriver { .. } => ErrorKind::NoMatchingDriver,
            Self::DuplicateDriver { .. }
            | Self::WrongHost { .. }
            | Self::Unreachable { .. }
            | Self::Transport { .. }
            | Self::Client { .. }
            | Self::Credential { .. } => ErrorKind::Driver,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::Download { .. } => ErrorKind::Download,
            Self::DownloadCooldown { .. } => ErrorKind::DownloadCooldown,
        }
    }

    /// Returns true when waiting and retrying may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::DownloadCooldown
    }

    /// Host-reported message for content-level failures.
    #[must_use]
    pub fn download_message(&self) -> Option<&str> {
        match self {
            Self::Download { message, .. } | Self::DownloadCooldown { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }
}
