// clipscrub/src/commands/rules.rs
//! `clipscrub rules ...`: CRUD over the ordered rule list.

use anyhow::{Context, Result};
use log::info;

use super::report_mutation;
use crate::cli::RulesCommand;
use crate::utils::app_state::AppState;

pub async fn run_rules(state: &AppState, command: RulesCommand) -> Result<()> {
    let store = &state.store;
    match command {
        RulesCommand::List { json } => {
            let rule_set = store.load().await.context("Failed to load rules")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rule_set)?);
            } else {
                for (index, rule) in rule_set.rules.iter().enumerate() {
                    println!("{}\t{}\t{}", index, rule.pattern, rule.replacement);
                }
            }
        }
        RulesCommand::Add { pattern, replacement } => {
            info!("Adding rule '{}'", pattern);
            let outcome = store
                .add_rule(&pattern, &replacement)
                .await
                .context("Failed to add rule")?;
            report_mutation(&outcome, format!("Added rule: {} -> {}", pattern, replacement));
        }
        RulesCommand::Update { index, pattern, replacement } => {
            let outcome = store
                .update_rule(index, &pattern, &replacement)
                .await
                .context("Failed to update rule")?;
            report_mutation(&outcome, format!("Updated rule #{}: {} -> {}", index, pattern, replacement));
        }
        RulesCommand::Delete { index } => {
            let outcome = store.delete_rule(index).await.context("Failed to delete rule")?;
            report_mutation(&outcome, format!("Deleted rule #{}", index));
        }
        RulesCommand::Reset => {
            let rule_set = store
                .reset_to_defaults()
                .await
                .context("Failed to reset rules to defaults")?;
            println!(
                "Reset to defaults: {} rules, {} sites",
                rule_set.rules.len(),
                rule_set.sites.len()
            );
        }
    }
    Ok(())
}
