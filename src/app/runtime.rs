use anyhow::Result;
use clap::Parser;
use tracing::debug;

use super::context::AppContext;
use super::settings::resolve_settings;
use super::terminal;
use crate::app_config;
use crate::cli::{Cli, Command};
use crate::{ProcessExit, commands};

pub(crate) async fn run() -> Result<ProcessExit> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    let file_config = app_config::load_config(cli.config.as_deref())?;
    let target_flag = match &cli.command {
        Command::Download(args) => args.target.as_ref(),
        _ => None,
    };
    let settings = resolve_settings(&cli, target_flag, &file_config);
    let caps = terminal::TerminalCaps::detect();
    terminal::init_tracing(settings.default_log_level, caps);
    debug!(?settings, "Settings resolved");

    let ctx = AppContext::build(&settings, cli.quiet, caps)?;

    match &cli.command {
        Command::Download(args) => commands::run_download_command(&ctx, &args.urls).await,
        Command::Info(args) => commands::run_info_command(&ctx, &args.urls).await,
        Command::Login(args) => {
            commands::run_login_command(&ctx, &args.driver, &args.login, &args.password).await
        }
        Command::Revoke(args) => commands::run_revoke_command(&ctx, &args.driver),
        Command::Drivers => commands::run_drivers_command(&ctx),
    }
}
