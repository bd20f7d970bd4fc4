//! Site allowlist gating.
//!
//! Redaction only runs on pages whose URL matches an allowlist entry. An empty
//! allowlist matches nothing: missing configuration never means "everywhere".

use std::sync::Arc;

use log::{debug, warn};
use regex::Regex;

use crate::config::RuleSet;
use crate::sanitizers::compiler::{compile_wildcard, SiteMatchMode};

/// Compiled allowlist.
#[derive(Debug, Clone, Default)]
pub struct SiteGate {
    matchers: Vec<(String, Arc<Regex>)>,
    mode: SiteMatchMode,
}

impl SiteGate {
    /// Compiles `sites` under `mode`. Entries that fail to compile (only
    /// possible in [`SiteMatchMode::LegacyRegex`]) are dropped with a warning.
    pub fn new(sites: &[String], mode: SiteMatchMode) -> Self {
        let matchers = sites
            .iter()
            .filter_map(|site| match compile_wildcard(site, mode) {
                Ok(re) => Some((site.clone(), re)),
                Err(e) => {
                    warn!("Ignoring site pattern '{}': {}", site, e);
                    None
                }
            })
            .collect();
        Self { matchers, mode }
    }

    pub fn from_rule_set(rule_set: &RuleSet, mode: SiteMatchMode) -> Self {
        Self::new(&rule_set.sites, mode)
    }

    pub fn mode(&self) -> SiteMatchMode {
        self.mode
    }

    /// Returns the first allowlist entry matching `url`, if any.
    pub fn matching_site(&self, url: &str) -> Option<&str> {
        self.matchers
            .iter()
            .find(|(_, re)| re.is_match(url))
            .map(|(site, _)| site.as_str())
    }

    pub fn is_allowed(&self, url: &str) -> bool {
        match self.matching_site(url) {
            Some(site) => {
                debug!("URL allowed by site pattern '{}'.", site);
                true
            }
            None => {
                debug!("URL matched none of {} site patterns.", self.matchers.len());
                false
            }
        }
    }
}

/// One-shot check of `url` against `sites` using the default glob mode.
pub fn is_allowed(url: &str, sites: &[String]) -> bool {
    SiteGate::new(sites, SiteMatchMode::default()).is_allowed(url)
}
