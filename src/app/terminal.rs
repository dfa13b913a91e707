//! Terminal capability detection and tracing setup.

use std::io::{self, IsTerminal};

/// What the attached terminal supports, sampled once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TerminalCaps {
    pub(crate) stderr_tty: bool,
    pub(crate) dumb: bool,
    pub(crate) no_color: bool,
}

impl TerminalCaps {
    pub(crate) fn detect() -> Self {
        Self {
            stderr_tty: io::stderr().is_terminal(),
            dumb: std::env::var("TERM").is_ok_and(|value| value.eq_ignore_ascii_case("dumb")),
            no_color: std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty()),
        }
    }

    pub(crate) fn ansi(self) -> bool {
        !self.no_color && !self.dumb
    }

    /// Progress bars need an interactive stderr and are hidden by `--quiet`.
    pub(crate) fn progress_bar(self, quiet: bool) -> bool {
        self.stderr_tty && !quiet && !self.dumb
    }
}

/// Installs the stderr subscriber. `RUST_LOG` overrides `default_level`.
pub(crate) fn init_tracing(default_level: &str, caps: TerminalCaps) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(caps.ansi())
        .with_env_filter(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::TerminalCaps;

    fn caps(stderr_tty: bool, dumb: bool, no_color: bool) -> TerminalCaps {
        TerminalCaps {
            stderr_tty,
            dumb,
            no_color,
        }
    }

    #[test]
    fn test_progress_bar_only_on_interactive_non_quiet_terminals() {
        assert!(caps(true, false, false).progress_bar(false));
        assert!(!caps(false, false, false).progress_bar(false));
        assert!(!caps(true, false, false).progress_bar(true));
        assert!(!caps(true, true, false).progress_bar(false));
    }

    #[test]
    fn test_no_color_keeps_progress_bar_but_drops_ansi() {
        let caps = caps(true, false, true);
        assert!(caps.progress_bar(false));
        assert!(!caps.ansi());
    }
}
