// clipscrub-core/src/engine.rs
//! Defines the core SanitizationEngine trait and related data structures.
//!
//! The `SanitizationEngine` trait decouples the paste pipeline from the way
//! rules are matched, so callers hold a `Box<dyn SanitizationEngine>` and
//! never depend on the regex implementation directly.
//!
//! License: MIT OR APACHE 2.0

use serde::Serialize;

use crate::config::{RedactionSummaryItem, RuleSet, RuleWarning};
use crate::context::RedactionContext;
use crate::sanitizers::compiler::CompiledRules;

/// Result of a single redaction pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedactionOutcome {
    /// The redacted buffer.
    pub text: String,
    /// One item per rule that matched at least once, in application order.
    pub summary: Vec<RedactionSummaryItem>,
    /// Rules that were skipped because they did not compile.
    pub warnings: Vec<RuleWarning>,
}

impl RedactionOutcome {
    pub fn total_replacements(&self) -> usize {
        self.summary.iter().map(|s| s.occurrences).sum()
    }

    pub fn changed(&self) -> bool {
        !self.summary.is_empty()
    }
}

/// A trait that defines the core functionality of a sanitization engine.
pub trait SanitizationEngine: Send + Sync {
    /// Applies the stored rules followed by the rules derived from `context`
    /// and reports what happened.
    ///
    /// Never fails: a rule that cannot be compiled is skipped and reported in
    /// [`RedactionOutcome::warnings`].
    fn redact_detailed(&self, content: &str, context: &RedactionContext) -> RedactionOutcome;

    /// Same as [`SanitizationEngine::redact_detailed`] but returns only the text.
    fn redact(&self, content: &str, context: &RedactionContext) -> String {
        self.redact_detailed(content, context).text
    }

    /// Returns the compiled stored rules used by the engine.
    fn compiled_rules(&self) -> &CompiledRules;

    /// Returns the rule set the engine was built from.
    fn rule_set(&self) -> &RuleSet;
}
