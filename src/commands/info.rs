//! `hostdl info`: print what a host reports about each URL without downloading.

use anyhow::Result;
use tracing::warn;

use crate::app::AppContext;
use crate::{ProcessExit, output};

/// Prints metadata for every URL.
///
/// A URL counts as failed when no driver handles it, the host is unreachable,
/// or the page itself reports an error.
///
/// # Errors
///
/// Never fails by itself; failures are printed and reflected in the exit outcome.
pub async fn run_info_command(ctx: &AppContext, urls: &[String]) -> Result<ProcessExit> {
    let mut completed = 0;
    let mut failed = 0;

    for (offset, url) in urls.iter().enumerate() {
        if offset > 0 {
            println!();
        }
        let metadata = match ctx.registry.find_by_url(url) {
            Ok(driver) => driver.resolve_metadata(url).await,
            Err(error) => Err(error),
        };
        match metadata {
            Ok(metadata) => {
                for line in output::metadata_lines(url, &metadata) {
                    println!("{line}");
                }
                if metadata.file_error().is_some() {
                    failed += 1;
                } else {
                    completed += 1;
                }
            }
            Err(error) => {
                warn!(url = %url, kind = ?error.kind(), "Metadata lookup failed");
                eprintln!("Error: {error}");
                failed += 1;
            }
        }
    }

    Ok(ProcessExit::from_counts(completed, failed))
}
