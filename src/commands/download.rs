//! `hostdl download`: resolve each URL and stream it to the target directory.

use anyhow::Result;
use hostdl_core::{BatchObserver, Download, UrlOutcome, process_urls};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::app::AppContext;
use crate::{ProcessExit, output};

const BAR_TEMPLATE: &str =
    "{bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {wide_msg}";
const SPINNER_TEMPLATE: &str = "{spinner} {bytes} ({bytes_per_sec}) {wide_msg}";

/// Renders batch events on stdout with an `indicatif` bar on stderr.
struct TerminalObserver {
    show_progress: bool,
    quiet: bool,
    bar: Option<ProgressBar>,
}

impl TerminalObserver {
    fn new(quiet: bool, show_progress: bool) -> Self {
        Self {
            show_progress,
            quiet,
            bar: None,
        }
    }

    fn print(&self, line: &str) {
        if !self.quiet {
            println!("{line}");
        }
    }

    fn new_bar(total: Option<u64>) -> ProgressBar {
        match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                bar.set_style(
                    ProgressStyle::with_template(BAR_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template(SPINNER_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar
            }
        }
    }
}

impl BatchObserver for TerminalObserver {
    fn started(&mut self, index: usize, total: usize, _url: &str) {
        if let Some(header) = output::batch_header(index, total) {
            self.print(&header);
        }
    }

    fn resolved(&mut self, download: &Download) {
        for line in output::download_lines(download) {
            self.print(&line);
        }
        if self.show_progress {
            self.bar = Some(Self::new_bar(download.file_size()));
        }
    }

    fn progress(&mut self, received: u64, total: Option<u64>) {
        if let Some(bar) = &self.bar {
            if let Some(total) = total
                && received > total
            {
                bar.set_length(received);
            }
            bar.set_position(received);
        }
    }

    fn finished(&mut self, outcome: &UrlOutcome) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        let line = output::outcome_line(outcome);
        if outcome.is_success() {
            self.print(&line);
        } else {
            eprintln!("{line}");
        }
    }
}

/// Downloads every URL in order; one failure never stops the rest.
///
/// # Errors
///
/// Never fails by itself; per-URL failures are reported and reflected in the
/// returned exit outcome.
pub async fn run_download_command(ctx: &AppContext, urls: &[String]) -> Result<ProcessExit> {
    let mut observer = TerminalObserver::new(ctx.quiet, ctx.terminal.progress_bar(ctx.quiet));
    let outcomes = process_urls(
        &ctx.registry,
        &ctx.streamer,
        urls,
        &ctx.target_dir,
        &mut observer,
    )
    .await;

    let completed = outcomes.iter().filter(|o| o.is_success()).count();
    let failed = outcomes.len() - completed;
    info!(completed, failed, "Download run finished");
    if outcomes.len() > 1 {
        observer.print(&output::summary_line(completed, failed));
    }

    Ok(ProcessExit::from_counts(completed, failed))
}
