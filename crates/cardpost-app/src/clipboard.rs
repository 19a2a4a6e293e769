//! Clipboard sink abstraction with explicit copy outcomes.
//!
//! Clipboard writes must never block or fail the primary flow, so sinks
//! report a [`CopyOutcome`] instead of propagating an error.

/// Result of one clipboard write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Text landed on the clipboard.
    Copied,
    /// The write failed; the reason is surfaced as a non-blocking notice.
    Failed(String),
}

impl CopyOutcome {
    /// Returns `true` when the text was copied.
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Copied)
    }
}

/// Abstract clipboard target.
pub trait ClipboardSink {
    /// Writes `text` to the clipboard and reports the outcome.
    fn copy_text(&self, text: &str) -> CopyOutcome;
}

/// System clipboard backed by `arboard`.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn copy_text(&self, text: &str) -> CopyOutcome {
        let attempt = arboard::Clipboard::new()
            .and_then(|mut clipboard| clipboard.set_text(text.to_string()));

        match attempt {
            Ok(()) => CopyOutcome::Copied,
            Err(error) => CopyOutcome::Failed(error.to_string()),
        }
    }
}
