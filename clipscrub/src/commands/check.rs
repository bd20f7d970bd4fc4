// clipscrub/src/commands/check.rs
use anyhow::{Context, Result};
use serde::Serialize;

use clipscrub_core::{SiteGate, SiteMatchMode};

use crate::utils::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub url: String,
    pub allowed: bool,
    pub matched_site: Option<String>,
}

/// Prints whether redaction runs on `url`. Returns `true` if it does.
pub async fn run_check(state: &AppState, url: &str, mode: SiteMatchMode, json: bool) -> Result<bool> {
    let rule_set = state.store.load().await.context("Failed to load sites")?;
    let gate = SiteGate::from_rule_set(&rule_set, mode);
    let report = CheckReport {
        url: url.to_string(),
        allowed: gate.is_allowed(url),
        matched_site: gate.matching_site(url).map(str::to_string),
    };

    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        match &report.matched_site {
            Some(site) => println!("allowed: {} (matches '{}')", url, site),
            None => println!("not allowed: {}", url),
        }
    }
    Ok(report.allowed)
}
