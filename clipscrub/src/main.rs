// clipscrub/src/main.rs
//! clipscrub entry point.
//!
//! Parses the command line, initialises logging and the rule store, and
//! dispatches to the command implementations.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::{debug, info};

use clipscrub::cli::{Cli, Commands};
use clipscrub::commands::{check, init, redact, rules, sites};
use clipscrub::logger;
use clipscrub::utils::app_state::{resolve_state_dir, AppState};
use clipscrub_core::SiteMatchMode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    logger::init_logger(logger::level_from_flags(cli.quiet, cli.debug));
    info!("clipscrub started. Version: {}", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    let state_dir = resolve_state_dir(cli.state_dir.as_deref())?;
    let state = AppState::open(state_dir, cli.defaults.as_deref());
    let site_mode: SiteMatchMode = cli.site_mode.into();

    match cli.command {
        Commands::Init => init::run_init(&state).await?,
        Commands::Redact(cmd) => {
            let opts = redact::RedactOptions::from_command(cmd, site_mode);
            redact::run_redact(&state, opts).await?;
        }
        Commands::Rules(cmd) => rules::run_rules(&state, cmd).await?,
        Commands::Sites(cmd) => sites::run_sites(&state, cmd).await?,
        Commands::Check { url, json } => {
            if !check::run_check(&state, &url, site_mode, json).await? {
                return Ok(ExitCode::from(1));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
