// clipscrub/src/commands/sites.rs
//! `clipscrub sites ...`: edits the allowlist.

use anyhow::{Context, Result};

use super::report_mutation;
use crate::cli::SitesCommand;
use crate::utils::app_state::AppState;

pub async fn run_sites(state: &AppState, command: SitesCommand) -> Result<()> {
    let store = &state.store;
    match command {
        SitesCommand::List => {
            let rule_set = store.load().await.context("Failed to load sites")?;
            for site in &rule_set.sites {
                println!("{}", site);
            }
        }
        SitesCommand::Add { site } => {
            let outcome = store.add_site(&site).await.context("Failed to add site")?;
            report_mutation(&outcome, format!("Added site: {}", site));
        }
        SitesCommand::Delete { site } => {
            let outcome = store.delete_site(&site).await.context("Failed to delete site")?;
            report_mutation(&outcome, format!("Deleted site: {}", site));
        }
    }
    Ok(())
}
