//! compiler.rs - Turns rule patterns and site entries into matchers.
//!
//! Rule patterns are compiled one by one so that a single malformed pattern
//! only disables its own rule. Compiled regexes are memoised in a small
//! process-wide cache keyed by pattern source, since the same stored rules
//! are recompiled on every paste.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::config::{Rule, RuleSource, RuleWarning, MAX_PATTERN_LENGTH};
use crate::errors::ClipscrubError;

const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);
const MAX_CACHED_PATTERNS: usize = 1024;

lazy_static! {
    static ref COMPILED_PATTERN_CACHE: RwLock<HashMap<String, Arc<Regex>>> = RwLock::new(HashMap::new());
}

/// How site allowlist entries are turned into URL matchers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SiteMatchMode {
    /// `*` matches any run of characters, everything else is literal, and the
    /// entry must match the whole URL.
    #[default]
    Glob,
    /// `*` becomes `.*`, every other character is raw regex syntax, and the
    /// entry may match anywhere in the URL.
    LegacyRegex,
}

/// A single compiled rule ready to run over a text buffer.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub regex: Arc<Regex>,
    pub replacement: String,
    /// Position in the effective rule list.
    pub index: usize,
    pub source: RuleSource,
}

impl CompiledRule {
    /// Replaces every non-overlapping match with the literal replacement and
    /// returns the new buffer plus the number of replacements.
    pub fn apply(&self, text: &str) -> (String, usize) {
        let mut out = String::with_capacity(text.len());
        let mut last_end = 0usize;
        let mut occurrences = 0usize;
        for m in self.regex.find_iter(text) {
            out.push_str(&text[last_end..m.start()]);
            out.push_str(&self.replacement);
            last_end = m.end();
            occurrences += 1;
        }
        if occurrences == 0 {
            return (text.to_string(), 0);
        }
        out.push_str(&text[last_end..]);
        (out, occurrences)
    }
}

/// The ordered pipeline of compiled rules plus the rules that were skipped.
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    pub rules: Vec<CompiledRule>,
    pub warnings: Vec<RuleWarning>,
}

/// Escapes every regex metacharacter so `s` only matches itself.
pub fn escape_literal(s: &str) -> String {
    regex::escape(s)
}

/// Anchors an already-escaped pattern on word boundaries.
pub fn word_boundary(escaped: &str) -> String {
    format!(r"\b{}\b", escaped)
}

/// Builds the regex source for a site entry under the given mode.
pub fn wildcard_source(site: &str, mode: SiteMatchMode) -> String {
    match mode {
        SiteMatchMode::Glob => {
            let body = site
                .split('*')
                .map(escape_literal)
                .collect::<Vec<_>>()
                .join(".*");
            format!("^{}$", body)
        }
        SiteMatchMode::LegacyRegex => site.replace('*', ".*"),
    }
}

/// Compiles a site entry into a URL matcher.
pub fn compile_wildcard(site: &str, mode: SiteMatchMode) -> Result<Arc<Regex>, regex::Error> {
    cached_regex(&wildcard_source(site, mode))
}

/// Compiles one rule. Fails on over-long or syntactically invalid patterns.
pub fn compile_rule(rule: &Rule, index: usize, source: RuleSource) -> Result<CompiledRule, ClipscrubError> {
    if rule.pattern.is_empty() {
        return Err(ClipscrubError::EmptyPattern(index));
    }
    if rule.pattern.len() > MAX_PATTERN_LENGTH {
        return Err(ClipscrubError::PatternLengthExceeded(
            index,
            rule.pattern.len(),
            MAX_PATTERN_LENGTH,
        ));
    }
    let regex = cached_regex(&rule.pattern).map_err(|e| ClipscrubError::RulePatternInvalid {
        index,
        pattern: rule.pattern.clone(),
        source: e,
    })?;
    Ok(CompiledRule {
        regex,
        replacement: rule.replacement.clone(),
        index,
        source,
    })
}

/// Compiles `rules` in order, numbering them from `first_index` and tagging
/// them with `source`.
///
/// Never fails as a whole: rules that do not compile are reported in
/// [`CompiledRules::warnings`] and left out of the pipeline.
pub fn compile_rules(rules: &[Rule], first_index: usize, source: RuleSource) -> CompiledRules {
    debug!("Starting compilation of {} rules.", rules.len());
    let mut compiled = CompiledRules::default();

    for (offset, rule) in rules.iter().enumerate() {
        let index = first_index + offset;
        match compile_rule(rule, index, source) {
            Ok(c) => {
                log::debug!(
                    target: "clipscrub_core::sanitizer",
                    "Rule #{} compiled successfully.",
                    index
                );
                compiled.rules.push(c);
            }
            Err(e) => {
                warn!("Skipping rule: {}", e);
                compiled.warnings.push(RuleWarning {
                    rule_index: index,
                    pattern: rule.pattern.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    debug!(
        "Finished compiling rules. Total compiled: {}, skipped: {}.",
        compiled.rules.len(),
        compiled.warnings.len()
    );
    compiled
}

fn cached_regex(pattern: &str) -> Result<Arc<Regex>, regex::Error> {
    {
        let cache = COMPILED_PATTERN_CACHE
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(regex) = cache.get(pattern) {
            return Ok(Arc::clone(regex));
        }
    }

    let regex = Arc::new(
        RegexBuilder::new(pattern)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()?,
    );

    let mut cache = COMPILED_PATTERN_CACHE
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if cache.len() >= MAX_CACHED_PATTERNS {
        debug!("Compiled pattern cache full ({} entries); clearing.", cache.len());
        cache.clear();
    }
    cache.insert(pattern.to_string(), Arc::clone(&regex));
    Ok(regex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_literal_matches_only_itself() {
        let escaped = escape_literal("a.b*c(d)");
        let re = Regex::new(&escaped).unwrap();
        assert!(re.is_match("xx a.b*c(d) yy"));
        assert!(!re.is_match("aXb*c(d)"));
    }

    #[test]
    fn test_word_boundary_wraps_pattern() {
        assert_eq!(word_boundary("al"), r"\bal\b");
    }

    #[test]
    fn test_glob_source_escapes_and_anchors() {
        assert_eq!(
            wildcard_source("https://a.com/*", SiteMatchMode::Glob),
            r"^https://a\.com/.*$"
        );
    }

    #[test]
    fn test_legacy_source_is_raw() {
        assert_eq!(
            wildcard_source("https://a.com/*", SiteMatchMode::LegacyRegex),
            "https://a.com/.*"
        );
    }

    #[test]
    fn test_invalid_rule_is_reported_not_fatal() {
        let rules = vec![Rule::new("(", "x"), Rule::new("a", "b")];
        let compiled = compile_rules(&rules, 0, RuleSource::Stored);
        assert_eq!(compiled.rules.len(), 1);
        assert_eq!(compiled.rules[0].index, 1);
        assert_eq!(compiled.warnings.len(), 1);
        assert_eq!(compiled.warnings[0].rule_index, 0);
    }

    #[test]
    fn test_overlong_pattern_is_rejected() {
        let rule = Rule::new("a".repeat(MAX_PATTERN_LENGTH + 1), "x");
        let err = compile_rule(&rule, 3, RuleSource::Stored).unwrap_err();
        assert!(matches!(err, ClipscrubError::PatternLengthExceeded(3, _, MAX_PATTERN_LENGTH)));
    }

    #[test]
    fn test_empty_pattern_is_skipped() {
        let rules = vec![Rule::new("", "X"), Rule::new("a", "b")];
        let compiled = compile_rules(&rules, 0, RuleSource::Stored);
        assert_eq!(compiled.rules.len(), 1);
        assert_eq!(compiled.rules[0].index, 1);
        assert_eq!(compiled.warnings.len(), 1);
        assert_eq!(compiled.warnings[0].rule_index, 0);
    }

    #[test]
    fn test_indices_start_at_offset() {
        let rules = vec![Rule::new("a", "b"), Rule::new("c", "d")];
        let compiled = compile_rules(&rules, 5, RuleSource::Context);
        assert_eq!(compiled.rules[0].index, 5);
        assert_eq!(compiled.rules[1].index, 6);
        assert_eq!(compiled.rules[1].source, RuleSource::Context);
    }

    #[test]
    fn test_apply_is_literal_and_counts() {
        let rule = compile_rule(&Rule::new(r"(\d)", "$1#"), 0, RuleSource::Stored).unwrap();
        let (out, n) = rule.apply("a1b22");
        assert_eq!(out, "a$1#b$1#$1#");
        assert_eq!(n, 3);
    }
}
