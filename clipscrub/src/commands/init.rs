// clipscrub/src/commands/init.rs
use anyhow::{Context, Result};
use log::info;

use crate::utils::app_state::AppState;

/// Seeds the store if nothing is persisted yet and prints what is in it.
pub async fn run_init(state: &AppState) -> Result<()> {
    info!("Initialising rule store in {}", state.state_dir.display());
    let already_seeded = state
        .store
        .read()
        .await
        .context("Failed to read the persisted rules")?
        .is_some();

    let rule_set = state
        .store
        .initialize()
        .await
        .context("Failed to initialise the rule store")?;

    let verb = if already_seeded { "Loaded" } else { "Seeded" };
    println!(
        "{} {} rules and {} sites ({})",
        verb,
        rule_set.rules.len(),
        rule_set.sites.len(),
        state.rules_path().display()
    );
    Ok(())
}
