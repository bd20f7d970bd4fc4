// clipscrub-core/src/redaction_match.rs
//! Helpers for logging redaction activity without leaking what was redacted.
//!
//! Matched originals only reach debug logs in masked form unless
//! `CLIPSCRUB_ALLOW_DEBUG_PII=true` is set in the environment.

use lazy_static::lazy_static;
use log::debug;

lazy_static! {
    /// A static boolean that is initialized once to determine if PII is allowed in debug logs.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("CLIPSCRUB_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    let len = s.chars().count();
    if len <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", len)
    }
}

fn get_loggable_content(sensitive_content: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        sensitive_content.to_string()
    } else {
        redact_sensitive(sensitive_content)
    }
}

pub fn log_redaction_action_debug(
    module_path: &str,
    rule_index: usize,
    original_sensitive_content: &str,
    sanitized_content: &str,
    occurrences: usize,
) {
    debug!(
        "{} Rule #{} replaced {} occurrence(s): Original='{}', Redacted='{}'",
        module_path,
        rule_index,
        occurrences,
        get_loggable_content(original_sensitive_content),
        get_loggable_content(sanitized_content)
    );
}
