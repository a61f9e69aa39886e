use std::time::Instant;

use crate::api::{ClientError, GenerationRequest, GenerationResult, RelatedExchange};
use crate::copy::{ClipboardSink, CopyFeedback};
use crate::error::ControllerError;

pub const SUBMIT_LABEL: &str = "Generate Response";
pub const SUBMIT_BUSY_LABEL: &str = "Generating...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Agent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub text: String,
    pub role: Role,
}

/// Append-only chat log, oldest first.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            text: text.into(),
            role,
        });
    }

    /// Replaces the text of the newest agent entry. Returns false if there is none.
    pub fn replace_last_agent(&mut self, text: impl Into<String>) -> bool {
        match self.entries.iter_mut().rev().find(|e| e.role == Role::Agent) {
            Some(entry) => {
                entry.text = text.into();
                true
            }
            None => false,
        }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Submit,
    Regenerate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Busy(Action),
}

/// State behind the response generation window.
#[derive(Debug, Clone)]
pub struct Session {
    selected_context: String,
    last_user_message: String,
    phase: Phase,
    transcript: Transcript,
    answer: String,
    related: Vec<RelatedExchange>,
    input: String,
}

impl Session {
    pub fn new(context: impl Into<String>) -> Self {
        Session {
            selected_context: context.into(),
            last_user_message: String::new(),
            phase: Phase::Idle,
            transcript: Transcript::default(),
            answer: String::new(),
            related: Vec::new(),
            input: String::new(),
        }
    }

    pub fn selected_context(&self) -> &str {
        &self.selected_context
    }

    pub fn set_context(&mut self, context: impl Into<String>) {
        self.selected_context = context.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    #[allow(dead_code)]
    pub fn last_user_message(&self) -> &str {
        &self.last_user_message
    }

    #[allow(dead_code)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Busy(_))
    }

    pub fn controls_enabled(&self) -> bool {
        self.phase == Phase::Idle
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn related(&self) -> &[RelatedExchange] {
        &self.related
    }

    /// Regenerate needs a previous successful submission.
    pub fn can_regenerate(&self) -> bool {
        self.controls_enabled() && !self.last_user_message.is_empty()
    }

    pub fn can_copy(&self) -> bool {
        self.controls_enabled() && !self.answer.is_empty()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_busy() {
            SUBMIT_BUSY_LABEL
        } else {
            SUBMIT_LABEL
        }
    }

    /// Validates the input and moves to `Busy(Submit)`.
    ///
    /// The user entry is appended before the request resolves and is not
    /// rolled back if the request fails.
    pub fn begin_submit(&mut self) -> Result<GenerationRequest, ControllerError> {
        if self.is_busy() {
            return Err(ControllerError::Busy);
        }

        let message = self.input.trim();
        if message.is_empty() {
            return Err(ControllerError::Validation);
        }
        let message = message.to_string();

        self.phase = Phase::Busy(Action::Submit);
        self.transcript.push(Role::User, message.clone());

        tracing::info!(
            action = "submit",
            company = %self.selected_context,
            message_len = message.len(),
            "generation started"
        );

        Ok(GenerationRequest {
            message,
            context: self.selected_context.clone(),
        })
    }

    pub fn finish_submit(
        &mut self,
        message: String,
        outcome: Result<GenerationResult, ClientError>,
    ) -> Result<(), ControllerError> {
        self.phase = Phase::Idle;

        let result = outcome.map_err(|source| {
            tracing::error!(action = "submit", error = %source, "generation failed");
            ControllerError::Transport {
                action: Action::Submit,
                source,
            }
        })?;

        tracing::info!(
            action = "submit",
            reply_len = result.reply.len(),
            related = result.related.len(),
            "generation finished"
        );

        self.transcript.push(Role::Agent, result.reply.clone());
        self.answer = result.reply;
        self.related = result.related;
        self.last_user_message = message;
        self.input.clear();
        Ok(())
    }

    /// Re-issues the last successful message with the currently selected
    /// context. `Ok(None)` when nothing has been submitted yet.
    pub fn begin_regenerate(&mut self) -> Result<Option<GenerationRequest>, ControllerError> {
        if self.is_busy() {
            return Err(ControllerError::Busy);
        }
        if self.last_user_message.is_empty() {
            return Ok(None);
        }

        self.phase = Phase::Busy(Action::Regenerate);
        tracing::info!(
            action = "regenerate",
            company = %self.selected_context,
            "generation started"
        );

        Ok(Some(GenerationRequest {
            message: self.last_user_message.clone(),
            context: self.selected_context.clone(),
        }))
    }

    pub fn finish_regenerate(
        &mut self,
        outcome: Result<GenerationResult, ClientError>,
    ) -> Result<(), ControllerError> {
        self.phase = Phase::Idle;

        let result = outcome.map_err(|source| {
            tracing::error!(action = "regenerate", error = %source, "generation failed");
            ControllerError::Transport {
                action: Action::Regenerate,
                source,
            }
        })?;

        if !self.transcript.replace_last_agent(result.reply.clone()) {
            tracing::debug!("no agent entry to replace; transcript left as is");
        }
        self.answer = result.reply;
        self.related = result.related;
        Ok(())
    }

    /// Copies the current answer and starts the confirmation window.
    pub fn copy_answer(
        &self,
        clipboard: &mut dyn ClipboardSink,
        feedback: &mut CopyFeedback,
        now: Instant,
    ) -> Result<(), ControllerError> {
        if self.is_busy() {
            return Err(ControllerError::Busy);
        }

        clipboard.write_text(&self.answer).map_err(|e| {
            tracing::warn!(error = %e, "copy to clipboard failed");
            ControllerError::from(e)
        })?;

        feedback.trigger(now);
        Ok(())
    }
}
