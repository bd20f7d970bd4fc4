// clipscrub-core/src/engines/regex_engine.rs
//! A `SanitizationEngine` implementation that applies regex rules
//! sequentially over a single text buffer.
//!
//! Rules run strictly in order and each one sees the output of the previous
//! one. That makes the pass deterministic but not idempotent: a replacement
//! token can be matched again by a later rule (`a→b` then `b→c` turns `a`
//! into `c`). Context rules always run last.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, warn};

use crate::config::{RedactionSummaryItem, RuleSet, RuleSource};
use crate::context::{derive_context_rules, RedactionContext};
use crate::engine::{RedactionOutcome, SanitizationEngine};
use crate::redaction_match::log_redaction_action_debug;
use crate::sanitizers::compiler::{compile_rules, CompiledRule, CompiledRules};

#[derive(Debug, Clone)]
pub struct RegexEngine {
    compiled_rules: CompiledRules,
    rule_set: RuleSet,
}

impl RegexEngine {
    /// Compiles the stored rules of `rule_set` once. Invalid patterns are
    /// kept as warnings and reported on every pass.
    pub fn new(rule_set: RuleSet) -> Self {
        let compiled_rules = compile_rules(&rule_set.rules, 0, RuleSource::Stored);
        Self {
            compiled_rules,
            rule_set,
        }
    }

    fn run_pipeline<'a>(
        rules: impl Iterator<Item = &'a CompiledRule>,
        content: &str,
    ) -> (String, Vec<RedactionSummaryItem>) {
        let mut buffer = content.to_string();
        let mut summary = Vec::new();

        for rule in rules {
            let (next, occurrences) = rule.apply(&buffer);
            if occurrences == 0 {
                continue;
            }
            log_redaction_action_debug(
                module_path!(),
                rule.index,
                &buffer,
                &next,
                occurrences,
            );
            summary.push(RedactionSummaryItem {
                rule_index: rule.index,
                pattern: rule.regex.as_str().to_string(),
                replacement: rule.replacement.clone(),
                source: rule.source,
                occurrences,
            });
            buffer = next;
        }
        (buffer, summary)
    }
}

impl SanitizationEngine for RegexEngine {
    fn redact_detailed(&self, content: &str, context: &RedactionContext) -> RedactionOutcome {
        let context_rules = derive_context_rules(context);
        let compiled_context = compile_rules(&context_rules, self.rule_set.rules.len(), RuleSource::Context);

        let mut warnings = self.compiled_rules.warnings.clone();
        warnings.extend(compiled_context.warnings.iter().cloned());
        for w in &warnings {
            warn!("Redaction pass skipped {}", w);
        }

        let pipeline = self
            .compiled_rules
            .rules
            .iter()
            .chain(compiled_context.rules.iter());
        let (text, summary) = Self::run_pipeline(pipeline, content);

        debug!(
            "Redaction pass complete: {} stored + {} context rules, {} matched.",
            self.compiled_rules.rules.len(),
            compiled_context.rules.len(),
            summary.len()
        );

        RedactionOutcome {
            text,
            summary,
            warnings,
        }
    }

    fn compiled_rules(&self) -> &CompiledRules {
        &self.compiled_rules
    }

    fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }
}

/// Redacts `text` with the stored rules of `rule_set` followed by the
/// context rules. Does not consult the site allowlist.
pub fn redact(text: &str, rule_set: &RuleSet, context: &RedactionContext) -> String {
    RegexEngine::new(rule_set.clone()).redact(text, context)
}
