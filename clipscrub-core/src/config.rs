//! Configuration management for `clipscrub-core`.
//!
//! This module defines the persisted aggregate ([`RuleSet`]) and its parts:
//! redaction [`Rule`]s and the site allowlist. It handles
//! serialization/deserialization of JSON (and YAML) rule documents, validates
//! them at the persistence boundary, and implements the pure in-memory
//! mutations the [`crate::store::RuleStore`] persists.
//!
//! License: MIT OR Apache-2.0

use std::collections::HashSet;
use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{ClipscrubError, Result};

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// Replacement token used for the derived username rule.
pub const USERNAME_TOKEN: &str = "username";
/// Replacement token used for the derived hostname rule.
pub const HOSTNAME_TOKEN: &str = "hostname";

/// Replacement token for the Windows user domain.
pub const USERDOMAIN_TOKEN: &str = "userdomain";

/// A single pattern → replacement pair.
///
/// `pattern` is regex source matched globally and case-sensitively.
/// `replacement` is inserted literally; `$1` and friends are not expanded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub pattern: String,
    pub replacement: String,
}

impl Rule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// The single persisted aggregate: allowed sites plus ordered rules.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleSet {
    /// Glob-style URL patterns; unique.
    pub sites: Vec<String>,
    /// Applied in order. Duplicates are allowed.
    pub rules: Vec<Rule>,
}

/// Where a rule applied during a redaction pass came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    Stored,
    Context,
}

/// Represents a single item in the redaction summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedactionSummaryItem {
    /// Position in the effective (stored ++ context) rule list.
    pub rule_index: usize,
    pub pattern: String,
    pub replacement: String,
    pub source: RuleSource,
    pub occurrences: usize,
}

/// A rule that was skipped during compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleWarning {
    pub rule_index: usize,
    pub pattern: String,
    pub message: String,
}

impl fmt::Display for RuleWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "rule #{} ('{}') skipped: {}",
            self.rule_index, self.pattern, self.message
        )
    }
}

/// Why a mutation request was turned into a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRejection {
    IndexOutOfRange { index: i64, len: usize },
    EmptyPattern,
    EmptySite,
    DuplicateSite(String),
    SiteNotFound(String),
}

impl fmt::Display for MutationRejection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "rule index {} is out of range (0..{})", index, len)
            }
            Self::EmptyPattern => write!(f, "rule pattern is empty"),
            Self::EmptySite => write!(f, "site pattern is empty"),
            Self::DuplicateSite(site) => write!(f, "site '{}' is already allowed", site),
            Self::SiteNotFound(site) => write!(f, "site '{}' is not in the allowlist", site),
        }
    }
}

impl RuleSet {
    /// Loads the rule document bundled with the library.
    pub fn load_default_rules() -> Result<Self> {
        debug!("Loading default rules from embedded string...");
        let default_json = include_str!("../config/default_rules.json");
        let rule_set = Self::from_json_str(default_json)?;
        debug!(
            "Loaded {} default rules and {} default sites.",
            rule_set.rules.len(),
            rule_set.sites.len()
        );
        Ok(rule_set)
    }

    /// Parses and validates a JSON rule document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let rule_set: RuleSet = serde_json::from_str(text)
            .map_err(|e| ClipscrubError::ConfigMissing(format!("malformed rule document: {}", e)))?;
        rule_set.validate()?;
        Ok(rule_set)
    }

    /// Parses and validates a YAML rule document (same schema as JSON).
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let rule_set: RuleSet = serde_yml::from_str(text)
            .map_err(|e| ClipscrubError::ConfigMissing(format!("malformed rule document: {}", e)))?;
        rule_set.validate()?;
        Ok(rule_set)
    }

    /// Converts a value read from the persistence layer, rejecting anything
    /// that does not match the schema.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        let rule_set: RuleSet = serde_json::from_value(value)
            .map_err(|e| ClipscrubError::ConfigMissing(format!("malformed stored rule set: {}", e)))?;
        rule_set.validate()?;
        Ok(rule_set)
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Checks the aggregate invariants: no empty and no duplicate sites, no
    /// empty rule patterns.
    ///
    /// Rule patterns are not compiled here; a bad pattern only disables its
    /// own rule at redaction time.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let mut errors = Vec::new();

        for site in &self.sites {
            if site.is_empty() {
                errors.push("the allowlist contains an empty site".to_string());
            } else if !seen.insert(site.as_str()) {
                errors.push(format!("duplicate site '{}'", site));
            }
        }

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.pattern.is_empty() {
                errors.push(format!("rule #{} has an empty pattern", index));
            } else if rule.pattern.len() > MAX_PATTERN_LENGTH {
                warn!(
                    "Rule #{} exceeds the maximum pattern length and will be skipped at redaction time.",
                    index
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ClipscrubError::ConfigMissing(format!(
                "rule set validation failed: {}",
                errors.join("; ")
            )))
        }
    }

    /// Stable SHA-256 over the canonical JSON encoding. Used as the revision
    /// carried by change notifications.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hex::encode(hasher.finalize())
    }

    /// Appends `rule`. An empty pattern would match between every character,
    /// so it is rejected.
    pub fn add_rule(&mut self, rule: Rule) -> std::result::Result<(), MutationRejection> {
        if rule.pattern.is_empty() {
            return Err(MutationRejection::EmptyPattern);
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Removes the rule at `index`. Negative and past-the-end indices are rejected.
    pub fn delete_rule(&mut self, index: i64) -> std::result::Result<Rule, MutationRejection> {
        let position = self.checked_index(index)?;
        Ok(self.rules.remove(position))
    }

    /// Replaces the rule at `index` in place, keeping its position.
    pub fn update_rule(&mut self, index: i64, rule: Rule) -> std::result::Result<Rule, MutationRejection> {
        let position = self.checked_index(index)?;
        if rule.pattern.is_empty() {
            return Err(MutationRejection::EmptyPattern);
        }
        Ok(std::mem::replace(&mut self.rules[position], rule))
    }

    pub fn add_site(&mut self, site: &str) -> std::result::Result<(), MutationRejection> {
        if site.is_empty() {
            return Err(MutationRejection::EmptySite);
        }
        if self.sites.iter().any(|s| s == site) {
            return Err(MutationRejection::DuplicateSite(site.to_string()));
        }
        self.sites.push(site.to_string());
        Ok(())
    }

    pub fn delete_site(&mut self, site: &str) -> std::result::Result<(), MutationRejection> {
        let before = self.sites.len();
        self.sites.retain(|s| s != site);
        if self.sites.len() == before {
            Err(MutationRejection::SiteNotFound(site.to_string()))
        } else {
            Ok(())
        }
    }

    fn checked_index(&self, index: i64) -> std::result::Result<usize, MutationRejection> {
        let len = self.rules.len();
        usize::try_from(index)
            .ok()
            .filter(|&i| i < len)
            .ok_or(MutationRejection::IndexOutOfRange { index, len })
    }
}
