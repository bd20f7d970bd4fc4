//! Derivation of per-invocation context rules.
//!
//! The current username and page hostname are turned into whole-word rules
//! that are appended after the stored rules on every redaction pass. They are
//! never written back to the rule store.

use log::debug;
use url::Url;

use crate::config::{Rule, HOSTNAME_TOKEN, USERDOMAIN_TOKEN, USERNAME_TOKEN};
use crate::sanitizers::compiler::{escape_literal, word_boundary};

/// Runtime values that identify the current user and page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedactionContext {
    pub username: Option<String>,
    pub hostname: Option<String>,
    /// Additional `(value, replacement token)` pairs, derived after the
    /// username and hostname rules.
    pub extra: Vec<(String, String)>,
}

impl RedactionContext {
    pub fn new(username: Option<String>, hostname: Option<String>) -> Self {
        Self {
            username,
            hostname,
            extra: Vec::new(),
        }
    }

    /// Replaces the hostname with the host of `url`. An unparsable URL, or
    /// one without a host, clears it.
    pub fn with_url(mut self, url: &str) -> Self {
        self.hostname = hostname_from_url(url);
        self
    }

    pub fn with_extra(mut self, value: impl Into<String>, token: impl Into<String>) -> Self {
        self.extra.push((value.into(), token.into()));
        self
    }

    /// Builds a context from the process environment: `USER`/`USERNAME` and
    /// `HOSTNAME`/`COMPUTERNAME`. A Windows `USERDOMAIN` becomes an extra
    /// rule replaced by `userdomain`.
    pub fn from_environment() -> Self {
        let username = first_env(&["USER", "USERNAME"]);
        let hostname = first_env(&["HOSTNAME", "COMPUTERNAME"]);
        debug!(
            "Environment context: username present={}, hostname present={}",
            username.is_some(),
            hostname.is_some()
        );
        let mut context = Self::new(username, hostname);
        if let Some(domain) = first_env(&["USERDOMAIN"]) {
            context = context.with_extra(domain, USERDOMAIN_TOKEN);
        }
        context
    }
}

/// Extracts the host component of a URL.
pub fn hostname_from_url(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .filter(|h| !h.is_empty())
}

/// Produces the context rules for `context`: username first, then hostname,
/// then any extras. Empty values produce no rule.
pub fn derive_context_rules(context: &RedactionContext) -> Vec<Rule> {
    let mut rules = Vec::with_capacity(2 + context.extra.len());

    let fixed = [
        (context.username.as_deref(), USERNAME_TOKEN),
        (context.hostname.as_deref(), HOSTNAME_TOKEN),
    ];
    for (value, token) in fixed {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            rules.push(context_rule(value, token));
        }
    }
    for (value, token) in &context.extra {
        if !value.is_empty() {
            rules.push(context_rule(value, token));
        }
    }
    rules
}

fn context_rule(value: &str, token: &str) -> Rule {
    Rule::new(word_boundary(&escape_literal(value)), token)
}

fn first_env(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| std::env::var(k).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}
