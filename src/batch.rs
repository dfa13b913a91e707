//! Sequential resolve-and-download over a list of URLs.
//!
//! Each URL is resolved and streamed to completion before the next one
//! starts. A failing URL is recorded in its [`UrlOutcome`] and the batch
//! moves on.

use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::download::{DownloadError, DownloadStreamer, StreamReport, target_path};
use crate::driver::{Download, DriverError, DriverRegistry, ErrorKind};

/// Why a single URL of a batch failed.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Driver selection or resolution failed.
    #[error(transparent)]
    Driver(#[from] DriverError),
    /// The transfer of the resolved file failed.
    #[error(transparent)]
    Download(#[from] DownloadError),
}

impl BatchError {
    /// Classifies the failure; transfer failures count as download errors.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Driver(error) => error.kind(),
            Self::Download(_) => ErrorKind::Download,
        }
    }
}

/// Result of processing one URL.
#[derive(Debug)]
pub struct UrlOutcome {
    /// 1-based position in the batch.
    pub index: usize,
    /// The URL as given.
    pub url: String,
    /// What happened.
    pub result: Result<StreamReport, BatchError>,
}

impl UrlOutcome {
    /// True when the file was written.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Receives batch events, typically to render them.
///
/// Every method has a no-op default.
pub trait BatchObserver {
    /// A URL is about to be processed.
    fn started(&mut self, _index: usize, _total: usize, _url: &str) {}
    /// The URL resolved and its target is set.
    fn resolved(&mut self, _download: &Download) {}
    /// Bytes received so far for the current file.
    fn progress(&mut self, _received: u64, _total: Option<u64>) {}
    /// The URL finished, successfully or not.
    fn finished(&mut self, _outcome: &UrlOutcome) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Processes `urls` in order, writing each file under `target_dir`.
///
/// Returns one outcome per URL, in input order.
pub async fn process_urls(
    registry: &DriverRegistry,
    streamer: &DownloadStreamer,
    urls: &[String],
    target_dir: &Path,
    observer: &mut dyn BatchObserver,
) -> Vec<UrlOutcome> {
    let total = urls.len();
    let mut outcomes = Vec::with_capacity(total);

    for (offset, url) in urls.iter().enumerate() {
        let index = offset + 1;
        observer.started(index, total, url);

        let result = process_url(registry, streamer, url, target_dir, observer).await;
        match &result {
            Ok(report) => info!(index, url = %url, bytes = report.bytes_written, "URL done"),
            Err(error) => warn!(index, url = %url, kind = ?error.kind(), error = %error, "URL failed"),
        }

        let outcome = UrlOutcome {
            index,
            url: url.clone(),
            result,
        };
        observer.finished(&outcome);
        outcomes.push(outcome);
    }

    outcomes
}

async fn process_url(
    registry: &DriverRegistry,
    streamer: &DownloadStreamer,
    url: &str,
    target_dir: &Path,
    observer: &mut dyn BatchObserver,
) -> Result<StreamReport, BatchError> {
    let driver = registry.find_by_url(url)?;
    let mut download = driver.resolve_download(url).await?;

    let target = target_path(target_dir, download.file_name());
    download.set_target(target);
    observer.resolved(&download);

    let report = streamer
        .start(download, |received, total| observer.progress(received, total))
        .await?;
    Ok(report)
}
