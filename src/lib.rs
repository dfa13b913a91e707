//! hostdl core library
//!
//! Resolves file-host URLs into direct downloads and streams them to disk.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`driver`] - Per-host drivers, the driver registry, and the resolution pipeline
//! - [`download`] - Streaming transfer of a resolved download to its target path
//! - [`batch`] - Sequential resolve-and-download over many URLs with per-URL isolation
//! - [`auth`] - Credential storage keyed by driver name

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod batch;
pub mod download;
pub mod driver;
mod user_agent;

// Re-export commonly used types
pub use auth::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use batch::{BatchError, BatchObserver, NoopObserver, UrlOutcome, process_urls};
pub use download::{DownloadError, DownloadStreamer, StreamReport};
pub use driver::{
    Download, Driver, DriverError, DriverRegistry, ErrorKind, HttpTimeouts, Metadata,
    UnFichierDriver, build_default_driver_registry,
};
