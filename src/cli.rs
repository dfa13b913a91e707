//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Resolve and download files from third-party file hosts.
#[derive(Parser, Debug)]
#[command(name = "hostdl")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Connect timeout for host page requests in seconds (1-3600)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// Total timeout for host page requests in seconds (1-3600)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,

    /// Connect timeout for file transfers in seconds (1-3600)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub download_connect_timeout: Option<u64>,

    /// Longest pause without received data during a file transfer, in seconds (1-3600)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub download_read_timeout: Option<u64>,

    /// Config file to load instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve URLs and download the files
    Download(DownloadArgs),
    /// Show name, size and host-reported errors without downloading
    Info(InfoArgs),
    /// Store a credential for a driver
    Login(LoginArgs),
    /// Erase the stored credential of a driver
    Revoke(RevokeArgs),
    /// List supported hosts
    Drivers,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// File-host URLs to download
    #[arg(required = true, value_name = "URLS")]
    pub urls: Vec<String>,

    /// Directory the files are written to (default: config `target_dir`, then ".")
    #[arg(short, long, value_name = "DIR")]
    pub target: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// File-host URLs to inspect
    #[arg(required = true, value_name = "URLS")]
    pub urls: Vec<String>,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Driver name, as listed by `hostdl drivers`
    pub driver: String,

    /// Account login
    #[arg(long)]
    pub login: String,

    /// Account password
    #[arg(long, env = "HOSTDL_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct RevokeArgs {
    /// Driver name, as listed by `hostdl drivers`
    pub driver: String,
}
