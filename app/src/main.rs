mod upgrade;

use clap::{Args, Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

/// Upgrade the local Plex Media Server package to the latest published release
#[derive(Debug, Parser)]
#[command(name = "plex-upgrade", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    options: Options,

    /// Enable debug diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download, install and restart (the default)
    Upgrade,
    /// Show the published and installed versions without changing anything
    Check,
}

#[derive(Debug, Default, Args)]
pub struct Options {
    /// Downloads manifest endpoint
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Temporary directory for the downloaded package
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Append-only run log
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// systemd unit to restart
    #[arg(long, global = true)]
    pub service: Option<String>,

    /// Package name passed to dpkg-query
    #[arg(long, global = true)]
    pub package: Option<String>,

    /// Release build tag
    #[arg(long, global = true)]
    pub build: Option<String>,

    /// Release distro tag
    #[arg(long, global = true)]
    pub distro: Option<String>,

    /// Manifest request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Package download timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub download_timeout: Option<u64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    pretty_env_logger::env_logger::builder()
        .format_timestamp(None)
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    let config = upgrade::build_config(&cli.options);
    info!("using configuration {:?}", config);

    let result = match cli.command.unwrap_or(Command::Upgrade) {
        Command::Upgrade => upgrade::perform_upgrade(config),
        Command::Check => upgrade::perform_check(config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
