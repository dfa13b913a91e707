//! Streaming transfer of a resolved [`Download`] to its target path.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, ClientBuilder};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use super::constants::{DOWNLOAD_CONNECT_TIMEOUT_SECS, DOWNLOAD_READ_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::driver::{Download, HttpTimeouts, apply_env_proxy_fallback};
use crate::user_agent;

/// Result of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamReport {
    /// Where the file was written.
    pub path: PathBuf,
    /// Bytes written to disk.
    pub bytes_written: u64,
    /// Total advertised by the host page, when known.
    pub total: Option<u64>,
}

/// Streams direct links to disk.
///
/// Created once and reused for every URL of a run so connections are pooled.
#[derive(Debug, Clone)]
pub struct DownloadStreamer {
    client: Client,
}

impl DownloadStreamer {
    /// Creates a streamer with the default transfer timeouts
    /// (30 s connect, 5 min without receiving a byte).
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] when the HTTP client cannot be built.
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_timeouts(default_download_timeouts())
    }

    /// Creates a streamer with explicit timeouts.
    ///
    /// `read_secs` is a stall timeout: a transfer that keeps receiving bytes
    /// runs for as long as it needs.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] when the HTTP client cannot be built.
    pub fn with_timeouts(timeouts: HttpTimeouts) -> Result<Self, DownloadError> {
        Ok(Self {
            client: build_client(timeouts)?,
        })
    }

    /// Streams `download` to its target, calling `on_progress(received, total)`
    /// after every chunk written.
    ///
    /// `total` is the size the host page advertised, never the transfer's
    /// `Content-Length`. Parent directories are created as needed; an existing
    /// file at the target is overwritten; a partial file is removed when the
    /// transfer fails.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] if the target is unset, the request fails or
    /// answers with a non-success status, the body is interrupted, or the
    /// target cannot be written.
    #[instrument(skip(self, download, on_progress), fields(url = %download.url(), driver = download.driver_name()))]
    pub async fn start<F>(
        &self,
        download: Download,
        mut on_progress: F,
    ) -> Result<StreamReport, DownloadError>
    where
        F: FnMut(u64, Option<u64>),
    {
        let target = download
            .target()
            .ok_or_else(|| DownloadError::missing_target(download.file_name()))?
            .to_path_buf();
        let url = download.url();
        let total = download.file_size();

        if let Some(parent) = target.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent, e))?;
        }

        debug!(path = %target.display(), "starting transfer");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let mut file = File::create(&target)
            .await
            .map_err(|e| DownloadError::io(&target, e))?;
        let stream_result =
            stream_to_file(&mut file, response, url, &target, total, &mut on_progress).await;
        drop(file);

        let bytes_written = match stream_result {
            Ok(bytes) => bytes,
            Err(error) => {
                debug!(path = %target.display(), "cleaning up partial file after error");
                if let Err(cleanup) = tokio::fs::remove_file(&target).await {
                    warn!(path = %target.display(), error = %cleanup, "partial file cleanup failed");
                }
                return Err(error);
            }
        };

        if let Some(expected) = total
            && expected != bytes_written
        {
            warn!(expected, bytes_written, "transfer size differs from advertised size");
        }
        info!(path = %target.display(), bytes = bytes_written, "download complete");

        Ok(StreamReport {
            path: target,
            bytes_written,
            total,
        })
    }
}

/// Default transfer timeouts.
#[must_use]
pub fn default_download_timeouts() -> HttpTimeouts {
    HttpTimeouts::new(DOWNLOAD_CONNECT_TIMEOUT_SECS, DOWNLOAD_READ_TIMEOUT_SECS)
}

async fn stream_to_file<F>(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
    total: Option<u64>,
    on_progress: &mut F,
) -> Result<u64, DownloadError>
where
    F: FnMut(u64, Option<u64>),
{
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
        on_progress(bytes_written, total);
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn build_client(timeouts: HttpTimeouts) -> Result<Client, DownloadError> {
    let client_error = |reason: String| DownloadError::Client { reason };

    match try_build_client(timeouts, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            warn!(
                "HTTP client builder panicked while loading system proxy settings; retrying with env-proxy fallback"
            );
            match try_build_client(timeouts, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Build(error)) => Err(client_error(error.to_string())),
                Err(BuildClientFailure::Panic) => Err(client_error(
                    "HTTP client builder panicked while applying env-proxy fallback".to_string(),
                )),
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(client_error(error.to_string())),
    }
}

fn try_build_client(
    timeouts: HttpTimeouts,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_client_builder(timeouts);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_client_builder(timeouts: HttpTimeouts) -> ClientBuilder {
    // Bytes on disk are the bytes on the wire; no transparent decompression.
    // `read_secs` bounds the gap between two reads, never the whole transfer.
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .read_timeout(Duration::from_secs(timeouts.read_secs))
        .user_agent(user_agent::default_download_user_agent())
        .cookie_store(true)
        .no_gzip()
}
