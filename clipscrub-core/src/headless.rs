// File: clipscrub-core/src/headless.rs

//! `headless.rs`
//! Convenience wrappers for using the core engine in headless mode (non-UI).
//! Provides a one-shot, gate-then-redact call over an in-memory rule set.

use anyhow::Result;
use log::debug;

use crate::config::RuleSet;
use crate::context::RedactionContext;
use crate::engine::SanitizationEngine;
use crate::engines::regex_engine::RegexEngine;
use crate::sanitizers::compiler::SiteMatchMode;
use crate::site_gate::SiteGate;

/// Whether the site allowlist is consulted in headless mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlessGate {
    /// Only redact when `url` matches the allowlist.
    Enforce(SiteMatchMode),
    /// Always redact.
    Bypass,
}

/// Redacts `content` as a paste on `url` would be redacted.
///
/// # Arguments
///
/// * `rule_set` - The stored rules and allowlist.
/// * `context` - Username / hostname for context rules.
/// * `url` - Page URL checked against the allowlist.
/// * `content` - The string to be redacted.
/// * `gate` - Whether to honour the allowlist.
pub fn headless_redact_string(
    rule_set: RuleSet,
    context: &RedactionContext,
    url: &str,
    content: &str,
    gate: HeadlessGate,
) -> Result<String> {
    if let HeadlessGate::Enforce(mode) = gate {
        if !SiteGate::from_rule_set(&rule_set, mode).is_allowed(url) {
            debug!("Headless redaction skipped: URL not on the allowlist.");
            return Ok(content.to_string());
        }
    }

    let engine: Box<dyn SanitizationEngine> = Box::new(RegexEngine::new(rule_set));
    Ok(engine.redact(content, context))
}
