//! Merges CLI flags, config file values and defaults.
//!
//! Precedence for every setting: CLI flag > config file > built-in default.

use std::path::PathBuf;

use hostdl_core::HttpTimeouts;
use hostdl_core::download::{DOWNLOAD_CONNECT_TIMEOUT_SECS, DOWNLOAD_READ_TIMEOUT_SECS};
use hostdl_core::driver::{PAGE_CONNECT_TIMEOUT_SECS, PAGE_READ_TIMEOUT_SECS};

use crate::app_config::FileConfig;
use crate::cli::Cli;

/// Effective runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) page_timeouts: HttpTimeouts,
    pub(crate) download_timeouts: HttpTimeouts,
    pub(crate) target_dir: PathBuf,
    pub(crate) default_log_level: &'static str,
}

pub(crate) fn resolve_settings(
    cli: &Cli,
    target_flag: Option<&PathBuf>,
    file_config: &FileConfig,
) -> Settings {
    let page_timeouts = HttpTimeouts::new(
        cli.connect_timeout
            .or(file_config.connect_timeout_secs)
            .unwrap_or(PAGE_CONNECT_TIMEOUT_SECS),
        cli.read_timeout
            .or(file_config.read_timeout_secs)
            .unwrap_or(PAGE_READ_TIMEOUT_SECS),
    );
    let download_timeouts = HttpTimeouts::new(
        cli.download_connect_timeout
            .or(file_config.download_connect_timeout_secs)
            .unwrap_or(DOWNLOAD_CONNECT_TIMEOUT_SECS),
        cli.download_read_timeout
            .or(file_config.download_read_timeout_secs)
            .unwrap_or(DOWNLOAD_READ_TIMEOUT_SECS),
    );
    let target_dir = target_flag
        .cloned()
        .or_else(|| file_config.target_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    Settings {
        page_timeouts,
        download_timeouts,
        target_dir,
        default_log_level: resolve_default_log_level(cli, file_config),
    }
}

/// Log level used when `RUST_LOG` is unset.
///
/// Priority: quiet flag > verbose count > config verbosity > info.
pub(crate) fn resolve_default_log_level(cli: &Cli, file_config: &FileConfig) -> &'static str {
    if cli.quiet {
        return "error";
    }
    match cli.verbose {
        0 => file_config
            .verbosity
            .map_or("info", |verbosity| verbosity.filter_directive()),
        1 => "debug",
        _ => "trace",
    }
}
