//! Shared state handed to every command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use hostdl_core::{
    CredentialStore, DownloadStreamer, DriverRegistry, FileCredentialStore, MemoryCredentialStore,
    build_default_driver_registry,
};
use tracing::{debug, warn};

use super::settings::Settings;
use super::terminal::TerminalCaps;

/// Registry, streamer and target directory for one CLI run.
pub(crate) struct AppContext {
    pub(crate) registry: DriverRegistry,
    pub(crate) streamer: DownloadStreamer,
    pub(crate) target_dir: PathBuf,
    pub(crate) quiet: bool,
    pub(crate) terminal: TerminalCaps,
}

impl AppContext {
    pub(crate) fn build(settings: &Settings, quiet: bool, terminal: TerminalCaps) -> Result<Self> {
        let registry =
            build_default_driver_registry(open_credential_store(), settings.page_timeouts)
                .context("Failed to build driver registry")?;
        let streamer = DownloadStreamer::with_timeouts(settings.download_timeouts)
            .context("Failed to build download client")?;
        debug!(drivers = ?registry.names(), "Driver registry ready");

        Ok(Self {
            registry,
            streamer,
            target_dir: settings.target_dir.clone(),
            quiet,
            terminal,
        })
    }
}

fn open_credential_store() -> Arc<dyn CredentialStore> {
    match FileCredentialStore::open_default() {
        Ok(store) => {
            debug!(path = %store.path().display(), "Using credential file");
            Arc::new(store)
        }
        Err(error) => {
            warn!(%error, "No config directory for credentials; keeping them in memory for this run");
            Arc::new(MemoryCredentialStore::new())
        }
    }
}
