// clipscrub/src/utils/clipboard.rs
//! System clipboard access through `arboard`.
//!
//! `arboard` is blocking, so every call runs on the blocking pool. Builds
//! without the `clipboard` feature get a clipboard that always fails.

use async_trait::async_trait;
use log::debug;
use thiserror::Error;

use clipscrub_core::errors::Result as CoreResult;
use clipscrub_core::{ClipscrubError, Clipboard};

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard support is not compiled in (enable the `clipboard` feature)")]
    NotCompiled,
    #[error("system clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard task failed: {0}")]
    Task(String),
}

impl From<ClipboardError> for ClipscrubError {
    fn from(e: ClipboardError) -> Self {
        ClipscrubError::IoError(std::io::Error::other(e))
    }
}

/// The host clipboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

#[cfg(feature = "clipboard")]
#[async_trait]
impl Clipboard for SystemClipboard {
    async fn read_text(&self) -> CoreResult<String> {
        let text = tokio::task::spawn_blocking(|| {
            arboard::Clipboard::new()
                .and_then(|mut cb| cb.get_text())
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))
        })
        .await
        .map_err(|e| ClipboardError::Task(e.to_string()))??;
        debug!("Read {} chars from the system clipboard.", text.chars().count());
        Ok(text)
    }

    async fn write_text(&self, text: &str) -> CoreResult<()> {
        let owned = text.to_string();
        tokio::task::spawn_blocking(move || {
            arboard::Clipboard::new()
                .and_then(|mut cb| cb.set_text(owned))
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))
        })
        .await
        .map_err(|e| ClipboardError::Task(e.to_string()))??;
        debug!("Wrote redacted text to the system clipboard.");
        Ok(())
    }
}

#[cfg(not(feature = "clipboard"))]
#[async_trait]
impl Clipboard for SystemClipboard {
    async fn read_text(&self) -> CoreResult<String> {
        Err(ClipboardError::NotCompiled.into())
    }

    async fn write_text(&self, _text: &str) -> CoreResult<()> {
        Err(ClipboardError::NotCompiled.into())
    }
}
