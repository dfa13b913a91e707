//! CLI output formatting and display helpers.

use std::path::Path;

use hostdl_core::{Download, Metadata, UrlOutcome};

/// Renders a byte count with binary units ("1.5 MiB"); unknown sizes render as "unknown".
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: Option<u64>) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let Some(bytes) = bytes else {
        return "unknown".to_string();
    };
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Header printed before each URL when a run has several.
#[must_use]
pub fn batch_header(index: usize, total: usize) -> Option<String> {
    (total > 1).then(|| format!("Download {index}/{total}"))
}

/// Description lines printed once a URL resolved.
#[must_use]
pub fn download_lines(download: &Download) -> Vec<String> {
    let file = download
        .target()
        .map_or_else(|| "-".to_string(), |path| path.display().to_string());
    vec![
        format!("Host: {}", download.driver_name()),
        format!("Name: {}", download.file_name()),
        format!("File: {file}"),
        format!("Size: {}", format_size(download.file_size())),
    ]
}

/// Description lines for `hostdl info`.
#[must_use]
pub fn metadata_lines(url: &str, metadata: &Metadata) -> Vec<String> {
    let mut lines = vec![
        format!("URL:  {url}"),
        format!("Host: {}", metadata.driver_name()),
        format!("Name: {}", metadata.file_name().unwrap_or("unknown")),
        format!("Size: {}", format_size(metadata.file_size())),
    ];
    if let Some(error) = metadata.file_error() {
        lines.push(format!("Error: {error}"));
    }
    lines
}

/// Final line for a finished URL.
#[must_use]
pub fn outcome_line(outcome: &UrlOutcome) -> String {
    match &outcome.result {
        Ok(report) => format!("Saved {}", display_path(&report.path)),
        Err(error) => format!("Error: {error}"),
    }
}

/// Summary printed after a multi-URL run.
#[must_use]
pub fn summary_line(completed: usize, failed: usize) -> String {
    format!("{completed} downloaded, {failed} failed")
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
