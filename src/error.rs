use thiserror::Error;

use crate::api::ClientError;
use crate::copy::ClipboardError;
use crate::session::Action;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("message is empty")]
    Validation,

    #[error("a request is already in flight")]
    Busy,

    #[error("{action:?} failed: {source}")]
    Transport {
        action: Action,
        #[source]
        source: ClientError,
    },

    #[error("clipboard write failed: {0}")]
    Clipboard(#[from] ClipboardError),
}

impl ControllerError {
    /// Text shown to the operator in the blocking notice.
    pub fn notice(&self) -> &'static str {
        match self {
            ControllerError::Validation => "Please enter a message",
            ControllerError::Busy => "Please wait for the current request to finish",
            ControllerError::Transport { action: Action::Submit, .. } => {
                "Failed to generate response. Please try again."
            }
            ControllerError::Transport { action: Action::Regenerate, .. } => {
                "Failed to regenerate response. Please try again."
            }
            ControllerError::Clipboard(_) => "Failed to copy to clipboard",
        }
    }
}
