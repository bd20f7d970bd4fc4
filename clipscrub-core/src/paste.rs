// clipscrub-core/src/paste.rs
//! Paste-event orchestration.
//!
//! A paste flows through the rule store, the site gate and the engine, and
//! comes out as a [`PasteOutcome`] the host applies: optionally rewrite the
//! clipboard, then splice the text into the focused field.
//!
//! Failures never block a paste. If the rules cannot be loaded the original
//! text is handed back (and the failure logged); if the page is not allowed
//! the original text is handed back unchanged. Only the latest paste may be
//! applied; older ones finish as [`PasteDisposition::Superseded`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info, warn};

use crate::config::RuleWarning;
use crate::context::RedactionContext;
use crate::engine::SanitizationEngine;
use crate::engines::regex_engine::RegexEngine;
use crate::errors::Result;
use crate::sanitizers::compiler::SiteMatchMode;
use crate::site_gate::SiteGate;
use crate::store::RuleStore;

/// Host clipboard primitives.
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn read_text(&self) -> Result<String>;
    async fn write_text(&self, text: &str) -> Result<()>;
}

/// The focused editable field at paste time. Offsets count characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditableField {
    pub value: String,
    pub selection_start: usize,
    pub selection_end: usize,
}

impl EditableField {
    pub fn new(value: impl Into<String>, selection_start: usize, selection_end: usize) -> Self {
        Self {
            value: value.into(),
            selection_start,
            selection_end,
        }
    }

    /// Replaces the current selection with `text` and moves the cursor to the
    /// end of the inserted text. Offsets past the end are clamped.
    pub fn splice(&mut self, text: &str) {
        let len = self.value.chars().count();
        let start = self.selection_start.min(len);
        let end = self.selection_end.clamp(start, len);

        let start_byte = char_to_byte(&self.value, start);
        let end_byte = char_to_byte(&self.value, end);
        self.value.replace_range(start_byte..end_byte, text);

        let cursor = start + text.chars().count();
        self.selection_start = cursor;
        self.selection_end = cursor;
    }

    pub fn cursor(&self) -> usize {
        self.selection_end
    }
}

fn char_to_byte(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(byte, _)| byte)
        .unwrap_or(s.len())
}

/// A paste as seen by the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteEvent {
    pub text: String,
    pub url: String,
    pub field: Option<EditableField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteDisposition {
    /// Rules ran. `replacements` may be zero.
    Redacted {
        replacements: usize,
        warnings: Vec<RuleWarning>,
    },
    /// The page is not on the allowlist; text passes through unchanged.
    SiteNotAllowed,
    /// Rules could not be loaded; text passes through unchanged.
    PassThrough { reason: String },
    /// A newer paste started before this one finished. Apply nothing.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteOutcome {
    pub generation: u64,
    /// Text to insert. Equal to the pasted text unless rules changed it.
    pub text: String,
    pub disposition: PasteDisposition,
    /// The field after splicing `text` in. `None` if no field was focused
    /// or the paste was superseded.
    pub field: Option<EditableField>,
}

impl PasteOutcome {
    pub fn is_superseded(&self) -> bool {
        matches!(self.disposition, PasteDisposition::Superseded)
    }

    /// True when the clipboard should be overwritten with [`PasteOutcome::text`].
    pub fn should_write_clipboard(&self) -> bool {
        matches!(
            self.disposition,
            PasteDisposition::Redacted { replacements, .. } if replacements > 0
        )
    }
}

pub struct PasteHandler {
    store: Arc<RuleStore>,
    site_mode: SiteMatchMode,
    generation: AtomicU64,
}

impl PasteHandler {
    pub fn new(store: Arc<RuleStore>) -> Self {
        Self::with_site_mode(store, SiteMatchMode::default())
    }

    pub fn with_site_mode(store: Arc<RuleStore>, site_mode: SiteMatchMode) -> Self {
        Self {
            store,
            site_mode,
            generation: AtomicU64::new(0),
        }
    }

    /// True if no paste has started since `generation`.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Runs one paste through the pipeline.
    ///
    /// When `context` has no hostname it is taken from `event.url`.
    pub async fn handle(&self, event: PasteEvent, context: &RedactionContext) -> PasteOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Paste #{} on {}", generation, event.url);

        let rule_set = match self.store.load().await {
            Ok(rule_set) => rule_set,
            Err(e) => {
                error!(
                    "Paste #{}: rules unavailable, passing text through unredacted: {}",
                    generation, e
                );
                let reason = e.to_string();
                return self.finish(generation, event.text, PasteDisposition::PassThrough { reason }, event.field);
            }
        };

        let gate = SiteGate::from_rule_set(&rule_set, self.site_mode);
        if !gate.is_allowed(&event.url) {
            info!("Paste #{}: site not allowed, leaving text unchanged.", generation);
            return self.finish(generation, event.text, PasteDisposition::SiteNotAllowed, event.field);
        }

        let context = if context.hostname.is_none() {
            context.clone().with_url(&event.url)
        } else {
            context.clone()
        };

        let outcome = RegexEngine::new(rule_set).redact_detailed(&event.text, &context);
        let disposition = PasteDisposition::Redacted {
            replacements: outcome.total_replacements(),
            warnings: outcome.warnings,
        };
        self.finish(generation, outcome.text, disposition, event.field)
    }

    /// Reads the clipboard, handles the paste, and writes the redacted text
    /// back when it changed and the paste is still current.
    pub async fn process_clipboard(
        &self,
        clipboard: &dyn Clipboard,
        url: &str,
        field: Option<EditableField>,
        context: &RedactionContext,
    ) -> Result<PasteOutcome> {
        let text = clipboard.read_text().await?;
        let event = PasteEvent {
            text,
            url: url.to_string(),
            field,
        };
        let outcome = self.handle(event, context).await;

        if outcome.should_write_clipboard() && self.is_current(outcome.generation) {
            if let Err(e) = clipboard.write_text(&outcome.text).await {
                warn!("Failed to write redacted text to clipboard: {}", e);
            }
        }
        Ok(outcome)
    }

    fn finish(
        &self,
        generation: u64,
        text: String,
        disposition: PasteDisposition,
        field: Option<EditableField>,
    ) -> PasteOutcome {
        if !self.is_current(generation) {
            debug!("Paste #{} superseded; discarding result.", generation);
            return PasteOutcome {
                generation,
                text,
                disposition: PasteDisposition::Superseded,
                field: None,
            };
        }

        let field = field.map(|mut f| {
            f.splice(&text);
            f
        });
        PasteOutcome {
            generation,
            text,
            disposition,
            field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splice_replaces_selection_and_moves_cursor() {
        let mut field = EditableField::new("hello world", 6, 11);
        field.splice("there");
        assert_eq!(field.value, "hello there");
        assert_eq!(field.cursor(), 11);
        assert_eq!(field.selection_start, 11);
    }

    #[test]
    fn test_splice_inserts_at_cursor() {
        let mut field = EditableField::new("ab", 1, 1);
        field.splice("XY");
        assert_eq!(field.value, "aXYb");
        assert_eq!(field.cursor(), 3);
    }

    #[test]
    fn test_splice_clamps_out_of_range() {
        let mut field = EditableField::new("abc", 10, 2);
        field.splice("!");
        assert_eq!(field.value, "abc!");
        assert_eq!(field.cursor(), 4);
    }

    #[test]
    fn test_splice_counts_characters() {
        let mut field = EditableField::new("héllo", 2, 2);
        field.splice("é");
        assert_eq!(field.value, "héélo");
        assert_eq!(field.cursor(), 3);
    }

    #[test]
    fn test_write_clipboard_only_when_changed() {
        let base = PasteOutcome {
            generation: 1,
            text: String::new(),
            disposition: PasteDisposition::Redacted {
                replacements: 0,
                warnings: vec![],
            },
            field: None,
        };
        assert!(!base.should_write_clipboard());
        let changed = PasteOutcome {
            disposition: PasteDisposition::Redacted {
                replacements: 2,
                warnings: vec![],
            },
            ..base.clone()
        };
        assert!(changed.should_write_clipboard());
        let blocked = PasteOutcome {
            disposition: PasteDisposition::SiteNotAllowed,
            ..base
        };
        assert!(!blocked.should_write_clipboard());
    }
}
