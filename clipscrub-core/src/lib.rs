// clipscrub-core/src/lib.rs
//! # ClipScrub Core Library
//!
//! `clipscrub-core` provides the platform-independent logic for redacting text
//! at paste time. It defines the persisted rule model, compiles rules and
//! site patterns, derives per-paste context rules, gates redaction on a site
//! allowlist, and owns the bootstrap/mutation protocol of the rule store.
//!
//! ## Modules
//!
//! * `config`: `Rule` and `RuleSet`, schema validation and in-memory mutations.
//! * `sanitizers`: pattern compilation (`compiler`): literal escaping, site globs, rule pipelines.
//! * `context`: derivation of username / hostname context rules.
//! * `site_gate`: the fail-closed site allowlist matcher.
//! * `engine`: the `SanitizationEngine` trait.
//! * `engines`: concrete engines (`regex_engine`).
//! * `storage`: the async key-value persistence boundary and its backends.
//! * `store`: `RuleStore`, bootstrap-or-load plus single-writer mutations.
//! * `paste`: paste-event orchestration with latest-wins semantics.
//! * `headless`: one-shot redaction helpers.
//! * `redaction_match`: PII-safe logging helpers.
//!
//! ## Usage Example
//!
//! ```rust
//! use clipscrub_core::{headless_redact_string, HeadlessGate, RedactionContext, Rule, RuleSet, SiteMatchMode};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let rules = RuleSet {
//!         sites: vec!["https://bank.com/*".to_string()],
//!         rules: vec![Rule::new(r"\d{4}", "[REDACTED]")],
//!     };
//!     let context = RedactionContext::new(Some("alice".into()), None);
//!
//!     let out = headless_redact_string(
//!         rules,
//!         &context,
//!         "https://bank.com/login",
//!         "alice card 1234",
//!         HeadlessGate::Enforce(SiteMatchMode::Glob),
//!     )?;
//!     assert_eq!(out, "username card [REDACTED]");
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Fallible library operations return [`ClipscrubError`]. Rejected mutations
//! are reported as [`MutationOutcome::Rejected`] rather than errors, and a
//! rule with a bad pattern only produces a [`RuleWarning`].
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod config;
pub mod context;
pub mod engine;
pub mod engines;
pub mod errors;
pub mod headless;
pub mod paste;
pub mod redaction_match;
pub mod sanitizers;
pub mod site_gate;
pub mod storage;
pub mod store;

/// Re-exports the rule model.
pub use config::{
    MutationRejection, RedactionSummaryItem, Rule, RuleSet, RuleSource, RuleWarning,
    HOSTNAME_TOKEN, MAX_PATTERN_LENGTH, USERDOMAIN_TOKEN, USERNAME_TOKEN,
};

/// Re-exports the custom error type for clear error reporting.
pub use errors::ClipscrubError;

pub use context::{derive_context_rules, hostname_from_url, RedactionContext};

pub use engine::{RedactionOutcome, SanitizationEngine};
pub use engines::regex_engine::{redact, RegexEngine};

pub use site_gate::{is_allowed, SiteGate};

pub use sanitizers::compiler::{
    compile_rule, compile_rules, compile_wildcard, escape_literal, word_boundary, CompiledRule,
    CompiledRules, SiteMatchMode,
};

pub use storage::{JsonFileStore, KeyLock, KeyValueStore, MemoryStore, RULES_KEY};
pub use store::{
    ChangeReason, DefaultRulesSource, EmbeddedDefaults, FetchPolicy, FileDefaults,
    MutationOutcome, RuleSetChanged, RuleStore,
};

pub use paste::{Clipboard, EditableField, PasteDisposition, PasteEvent, PasteHandler, PasteOutcome};

/// Re-exports types and functions for one-shot, non-interactive use.
pub use headless::{headless_redact_string, HeadlessGate};

pub use redaction_match::redact_sensitive;
