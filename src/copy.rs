use std::time::{Duration, Instant};
use thiserror::Error;

pub const COPY_LABEL: &str = "Copy";
pub const CONFIRMATION_LABEL: &str = "Copied!";
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(2000);

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard rejected write: {0}")]
    Write(String),
}

pub trait ClipboardSink {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard backed by arboard. The handle is opened lazily and kept
/// for the session, since some platforms drop the contents with the owner.
#[derive(Default)]
pub struct SystemClipboard {
    handle: Option<arboard::Clipboard>,
}

impl ClipboardSink for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.handle.is_none() {
            let clipboard =
                arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            self.handle = Some(clipboard);
        }

        match self.handle.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text.to_string())
                .map_err(|e| ClipboardError::Write(e.to_string())),
            None => Err(ClipboardError::Unavailable("no clipboard handle".to_string())),
        }
    }
}

/// Transient "Copied!" label on the copy control.
#[derive(Debug, Clone)]
pub struct CopyFeedback {
    base_label: String,
    window: Duration,
    showing_until: Option<Instant>,
}

impl CopyFeedback {
    pub fn new(base_label: impl Into<String>, window: Duration) -> Self {
        CopyFeedback {
            base_label: base_label.into(),
            window,
            showing_until: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Shows the confirmation until `now + window`. A trigger inside an open
    /// window restarts it; the label restored afterwards is still the one
    /// shown before the first click.
    pub fn trigger(&mut self, now: Instant) {
        self.showing_until = Some(now + self.window);
    }

    pub fn label(&self, now: Instant) -> &str {
        match self.showing_until {
            Some(until) if now < until => CONFIRMATION_LABEL,
            _ => &self.base_label,
        }
    }

    /// Clears the confirmation once its window has elapsed. Returns true if
    /// the label changed back.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.showing_until {
            Some(until) if now >= until => {
                self.showing_until = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for CopyFeedback {
    fn default() -> Self {
        CopyFeedback::new(COPY_LABEL, DEFAULT_WINDOW)
    }
}
