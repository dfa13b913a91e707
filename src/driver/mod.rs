//! Host drivers: turning a file-host URL into a retrievable download.
//!
//! # Architecture
//!
//! - [`Driver`] - Async trait that each host adapter implements
//! - [`DriverRegistry`] - Registration-ordered collection, looked up by URL or name
//! - [`UnFichierDriver`] - Reference driver for `1fichier.com`
//! - [`Metadata`] - Read-only snapshot of a remote file
//! - [`Download`] - A resolved file with a confirmed direct link
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use hostdl_core::auth::MemoryCredentialStore;
//! use hostdl_core::driver::{HttpTimeouts, build_default_driver_registry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = build_default_driver_registry(
//!     Arc::new(MemoryCredentialStore::new()),
//!     HttpTimeouts::default(),
//! )?;
//!
//! let url = "https://1fichier.com/?abcdef123";
//! let download = registry.find_by_url(url)?.resolve_download(url).await?;
//! println!("{} -> {}", download.file_name(), download.url());
//! # Ok(())
//! # }
//! ```

mod error;
mod http_client;
mod registry;
mod unfichier;
mod utils;

pub use error::{DriverError, ErrorKind, NO_DOWNLOAD_LINK};
pub use http_client::{
    HttpTimeouts, PAGE_CONNECT_TIMEOUT_SECS, PAGE_READ_TIMEOUT_SECS, PageClient, PageResponse,
};
pub use registry::DriverRegistry;
pub use unfichier::{Cooldown, UnFichierDriver, UnFichierPage, parse_size};

pub(crate) use http_client::apply_env_proxy_fallback;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::CredentialStore;

/// Builds the registry of every supported host.
///
/// # Errors
///
/// Returns [`DriverError`] when a driver cannot build its HTTP client or two
/// drivers share a name.
pub fn build_default_driver_registry(
    store: Arc<dyn CredentialStore>,
    timeouts: HttpTimeouts,
) -> Result<DriverRegistry, DriverError> {
    let mut registry = DriverRegistry::new();
    registry.register(Box::new(UnFichierDriver::new(store, timeouts)?))?;
    Ok(registry)
}

/// Snapshot of a remote file, taken without starting a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    driver_name: String,
    file_name: Option<String>,
    file_size: Option<u64>,
    file_error: Option<String>,
}

impl Metadata {
    /// Creates a metadata snapshot.
    #[must_use]
    pub fn new(
        driver_name: impl Into<String>,
        file_name: Option<String>,
        file_size: Option<u64>,
        file_error: Option<String>,
    ) -> Self {
        Self {
            driver_name: driver_name.into(),
            file_name,
            file_size,
            file_error,
        }
    }

    /// Name of the driver that inspected the file.
    #[must_use]
    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    /// File name as published by the host.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// File size in bytes, when the host shows it.
    #[must_use]
    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    /// Error the host page itself reports (deleted file, cooldown, ...).
    #[must_use]
    pub fn file_error(&self) -> Option<&str> {
        self.file_error.as_deref()
    }
}

/// A resolved, streamable file.
///
/// A `Download` always carries a non-empty direct link; building one is the
/// signal that resolution succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    driver_name: String,
    file_name: String,
    file_size: Option<u64>,
    url: String,
    target: Option<PathBuf>,
}

impl Download {
    /// Creates a download, or `None` when `url` is blank.
    #[must_use]
    pub fn new(
        driver_name: &str,
        file_name: impl Into<String>,
        file_size: Option<u64>,
        url: impl Into<String>,
    ) -> Option<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return None;
        }
        Some(Self {
            driver_name: driver_name.to_string(),
            file_name: file_name.into(),
            file_size,
            url,
            target: None,
        })
    }

    /// Name of the driver that resolved the file.
    #[must_use]
    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    /// File name as published by the host (possibly percent-encoded).
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File size in bytes, when the host shows it.
    #[must_use]
    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    /// Direct download link.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Destination path, once set.
    #[must_use]
    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    /// Sets the destination path.
    pub fn set_target(&mut self, target: impl Into<PathBuf>) {
        self.target = Some(target.into());
    }
}

/// Contract every host adapter implements.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via `Box<dyn Driver>`.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Returns true if this driver handles `url`. Never performs I/O.
    fn matches(&self, url: &str) -> bool;

    /// Stable identifier, used for display and as the credential key.
    fn name(&self) -> &str;

    /// Establishes and persists a credential for this host.
    async fn authenticate(&self, login: &str, password: &str) -> Result<(), DriverError>;

    /// Erases any persisted credential. Succeeds when none existed.
    fn unauthenticate(&self) -> Result<(), DriverError>;

    /// Returns true when a credential is stored for this driver.
    fn is_authenticated(&self) -> Result<bool, DriverError>;

    /// Inspects the remote file without starting a download.
    async fn resolve_metadata(&self, url: &str) -> Result<Metadata, DriverError>;

    /// Resolves the remote file into a [`Download`].
    async fn resolve_download(&self, url: &str) -> Result<Download, DriverError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialStore;

    #[test]
    fn test_download_target_is_unset_until_caller_sets_it() {
        let mut download = Download::new(
            "UnFichier",
            "movie.mkv",
            Some(1_048_576),
            "https://a-1.1fichier.com/c123",
        )
        .unwrap();
        assert!(download.target().is_none());

        download.set_target("/tmp/movie.mkv");
        assert_eq!(download.target().unwrap(), Path::new("/tmp/movie.mkv"));
        assert_eq!(download.driver_name(), "UnFichier");
        assert_eq!(download.file_size(), Some(1_048_576));
    }

    #[test]
    fn test_download_requires_direct_link() {
        assert!(Download::new("UnFichier", "movie.mkv", None, "").is_none());
        assert!(Download::new("UnFichier", "movie.mkv", None, "   ").is_none());
    }

    #[test]
    fn test_metadata_accessors() {
        let metadata = Metadata::new(
            "UnFichier",
            Some("movie.mkv".to_string()),
            None,
            Some("File has been removed".to_string()),
        );
        assert_eq!(metadata.driver_name(), "UnFichier");
        assert_eq!(metadata.file_name(), Some("movie.mkv"));
        assert_eq!(metadata.file_size(), None);
        assert_eq!(metadata.file_error(), Some("File has been removed"));
    }

    #[test]
    fn test_default_registry_contains_unfichier() {
        let registry = build_default_driver_registry(
            Arc::new(MemoryCredentialStore::new()),
            HttpTimeouts::default(),
        )
        .unwrap();
        assert_eq!(registry.names(), vec!["UnFichier"]);
        assert!(registry.find_by_url("https://1fichier.com/?abc123").is_ok());
    }
}
