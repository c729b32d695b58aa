use std::time::{Duration, Instant};

use menuforge_contracts::{ExtractionInput, GenerationError, ImageAttachment, MenuItemMetadata};
use uuid::Uuid;

/// How long the transient "copied" flag stays up after a copy.
pub const COPIED_FLAG_WINDOW: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    AwaitingInput,
    Loading,
    Success,
    Failed,
}

/// Best-effort copy surface. Failure is logged by the controller,
/// never surfaced as an error state.
pub trait Clipboard {
    fn copy_text(&mut self, text: &str) -> anyhow::Result<()>;
}

/// One accepted submission, handed to a worker to execute. The token
/// is what makes late results recognizably stale.
#[derive(Debug, Clone)]
pub struct Submission {
    pub token: Uuid,
    pub input: ExtractionInput,
}

/// Application state controller.
///
/// All mutation happens on the caller's thread in response to a
/// discrete user action or a completed asynchronous operation.
/// Workers only report back through `apply_outcome` with the token
/// they were given; outcomes for a superseded token are discarded.
pub struct SessionController<C: Clipboard> {
    clipboard: C,
    phase: SessionPhase,
    input: ExtractionInput,
    result: Option<MenuItemMetadata>,
    error: Option<String>,
    active_token: Option<Uuid>,
    copied_until: Option<Instant>,
}

impl<C: Clipboard> SessionController<C> {
    pub fn new(clipboard: C) -> Self {
        Self {
            clipboard,
            phase: SessionPhase::Idle,
            input: ExtractionInput::default(),
            result: None,
            error: None,
            active_token: None,
            copied_until: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn result(&self) -> Option<&MenuItemMetadata> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn input(&self) -> &ExtractionInput {
        &self.input
    }

    pub fn copied(&self) -> bool {
        self.copied_until.is_some()
    }

    fn ensure_editable(&self) -> Result<(), GenerationError> {
        if self.phase == SessionPhase::Loading {
            return Err(GenerationError::Validation(
                "a submission is in flight; wait for it or reset".to_string(),
            ));
        }
        Ok(())
    }

    pub fn set_image(&mut self, bytes: Vec<u8>, mime_type: &str) -> Result<(), GenerationError> {
        self.ensure_editable()?;
        self.input.image = Some(ImageAttachment::new(bytes, mime_type)?);
        self.mark_awaiting();
        Ok(())
    }

    pub fn set_item_name(&mut self, value: &str) -> Result<(), GenerationError> {
        self.ensure_editable()?;
        self.input.item_name = Some(value.to_string());
        self.mark_awaiting();
        Ok(())
    }

    pub fn set_description(&mut self, value: &str) -> Result<(), GenerationError> {
        self.ensure_editable()?;
        self.input.description = Some(value.to_string());
        self.mark_awaiting();
        Ok(())
    }

    fn mark_awaiting(&mut self) {
        if self.phase == SessionPhase::Idle {
            self.phase = SessionPhase::AwaitingInput;
        }
    }

    /// Accept the current input for execution. Fails without leaving
    /// the current phase when the input is empty or a submission is
    /// already in flight.
    pub fn begin_submission(&mut self) -> Result<Submission, GenerationError> {
        if self.active_token.is_some() {
            return Err(GenerationError::Validation(
                "a submission is already in flight".to_string(),
            ));
        }
        self.input.validate_for_submission()?;

        let token = Uuid::new_v4();
        self.active_token = Some(token);
        self.phase = SessionPhase::Loading;
        self.copied_until = None;
        Ok(Submission {
            token,
            input: self.input.clone(),
        })
    }

    /// Apply a worker's outcome. Outcomes whose token no longer
    /// matches the active submission are dropped without any state
    /// change (stale-response guard). Returns whether the outcome was
    /// applied.
    pub fn apply_outcome(
        &mut self,
        token: Uuid,
        outcome: Result<MenuItemMetadata, GenerationError>,
    ) -> bool {
        if self.active_token != Some(token) {
            return false;
        }
        self.active_token = None;
        match outcome {
            Ok(metadata) => {
                self.result = Some(metadata);
                self.error = None;
                self.phase = SessionPhase::Success;
            }
            Err(err) => {
                self.result = None;
                self.error = Some(format!("failed to extract metadata ({}): {err}", err.kind()));
                self.phase = SessionPhase::Failed;
            }
        }
        true
    }

    /// Clear everything and return to Idle. An in-flight submission's
    /// eventual outcome is discarded because its token is forgotten.
    pub fn reset(&mut self) {
        self.phase = SessionPhase::Idle;
        self.input = ExtractionInput::default();
        self.result = None;
        self.error = None;
        self.active_token = None;
        self.copied_until = None;
    }

    /// Copy the current result as pretty JSON. Only valid in Success.
    /// A second copy inside the window restarts it rather than
    /// stacking a second pending clear.
    pub fn copy_result(&mut self, now: Instant) -> Result<(), GenerationError> {
        let Some(result) = self.result.as_ref().filter(|_| self.phase == SessionPhase::Success)
        else {
            return Err(GenerationError::Validation(
                "there is no result to copy".to_string(),
            ));
        };
        let text = result
            .to_pretty_json()
            .map_err(|err| GenerationError::Validation(err.to_string()))?;
        match self.clipboard.copy_text(&text) {
            Ok(()) => {
                self.copied_until = Some(now + COPIED_FLAG_WINDOW);
            }
            Err(err) => {
                eprintln!("clipboard copy failed: {err:#}");
            }
        }
        Ok(())
    }

    /// Expire the copied flag once its window has passed. Independent
    /// of every other transition.
    pub fn tick(&mut self, now: Instant) {
        if self.copied_until.is_some_and(|deadline| now >= deadline) {
            self.copied_until = None;
        }
    }
}
