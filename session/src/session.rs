//! Session state machine.
//!
//! A [`Session`] is a plain value mutated only through its transition
//! methods; network and device I/O happen outside (see the controller).
//! Submissions are guarded by a monotonically increasing generation token:
//! [`Session::begin_submit`] tags the request, and [`Session::resolve`]
//! applies a completion only if its token matches the current in-flight
//! generation. A late response after cancellation or a mode switch is
//! silently discarded and never mutates newer state.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::asset::{AssetMeta, AudioAsset};
use crate::directory::Directory;
use crate::error::{SessionError, ValidationError};

/// Operating mode of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Enroll a voice sample under a free-text name.
    #[default]
    Enroll,
    /// Match a voice sample against an enrolled name.
    Verify,
}

impl Mode {
    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Enroll => "enroll",
            Mode::Verify => "verify",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State of the current submission cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

/// Derived controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No asset staged, nothing in flight.
    Idle,
    /// Asset staged, not yet submitted.
    Staged,
    /// Exactly one request in flight.
    Submitting,
    /// Last submission completed successfully.
    Succeeded,
    /// Last submission failed; retry permitted without re-staging.
    Failed,
}

/// Successful completion of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Outcome {
    /// Enrollment accepted; carries the backend confirmation message.
    Enrolled { message: String },
    /// Verification matched the subject.
    Matched,
    /// Verification did not match the subject. Still a successful request.
    NotMatched,
}

/// Description of the network call a submission requires.
///
/// Produced by [`Session::begin_submit`]; the driver performs the call and
/// feeds the result back through [`Session::resolve`] with the same
/// generation token.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Generation token identifying this request.
    pub generation: u64,
    /// Mode the request was issued in.
    pub mode: Mode,
    /// Validated subject name.
    pub name: String,
    /// Staged audio payload.
    pub audio: Bytes,
    /// File name reported to the backend.
    pub filename: String,
}

/// The session controller's state.
///
/// Created fresh on each application load; nothing is persisted.
#[derive(Debug, Default)]
pub struct Session {
    mode: Mode,
    subject_name: String,
    staged: Option<AudioAsset>,
    request: RequestState,
    last_result: Option<Outcome>,
    error_message: Option<String>,
    generation: u64,
    inflight: Option<u64>,
}

impl Session {
    /// Creates a new session in enroll mode with no staged asset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the current subject name.
    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }

    /// Returns the staged asset, if any.
    pub fn staged(&self) -> Option<&AudioAsset> {
        self.staged.as_ref()
    }

    /// Returns the request state.
    pub fn request_state(&self) -> RequestState {
        self.request
    }

    /// Returns the last successful outcome, if any.
    pub fn last_result(&self) -> Option<&Outcome> {
        self.last_result.as_ref()
    }

    /// Returns the last error message, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns the derived controller state.
    pub fn state(&self) -> SessionState {
        if self.inflight.is_some() {
            return SessionState::Submitting;
        }
        match self.request {
            RequestState::Failed => SessionState::Failed,
            RequestState::Succeeded => SessionState::Succeeded,
            _ if self.staged.is_some() => SessionState::Staged,
            _ => SessionState::Idle,
        }
    }

    /// Sets the subject name (free text in enroll mode; membership in the
    /// directory is enforced at submit time in verify mode).
    pub fn set_subject(&mut self, name: impl Into<String>) {
        self.subject_name = name.into();
    }

    /// Stages a validated asset, replacing (and releasing) any previous
    /// one and clearing the last result and error.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Busy`] while a submission is in flight: the
    /// in-flight request owns the staged asset until it completes.
    pub fn stage(&mut self, asset: AudioAsset) -> Result<(), SessionError> {
        if self.inflight.is_some() {
            return Err(SessionError::Busy);
        }

        tracing::debug!(source = asset.source_name(), origin = %asset.origin(), "asset staged");
        self.staged = Some(asset);
        self.request = RequestState::Idle;
        self.last_result = None;
        self.error_message = None;
        Ok(())
    }

    /// Discards the staged asset, if any.
    pub fn clear_staged(&mut self) {
        self.staged = None;
    }

    /// Switches the operating mode. Atomically clears the staged asset,
    /// last result, and error message, and invalidates any in-flight
    /// request so its late completion is discarded.
    ///
    /// Returns true if an in-flight request was cancelled; the driver must
    /// also abort the underlying network call.
    pub fn switch_mode(&mut self, mode: Mode) -> bool {
        if mode == self.mode {
            return false;
        }

        let cancelled = self.inflight.is_some();
        if cancelled {
            tracing::debug!(from = %self.mode, to = %mode, "mode switch cancels in-flight request");
        }

        self.mode = mode;
        self.staged = None;
        self.last_result = None;
        self.error_message = None;
        self.request = RequestState::Idle;
        self.inflight = None;
        // Invalidate any completion still carrying the old token.
        self.generation += 1;
        cancelled
    }

    /// Validates the session and transitions to `Submitting`.
    ///
    /// Returns `Ok(None)` if a request is already in flight: a second
    /// submit is a no-op, not a queued retry. Validation violations
    /// short-circuit locally; no request is issued.
    pub fn begin_submit(
        &mut self,
        directory: &Directory,
    ) -> Result<Option<SubmitRequest>, ValidationError> {
        if self.inflight.is_some() {
            tracing::debug!("submit ignored: request already in flight");
            return Ok(None);
        }

        let name = self.subject_name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        let staged = self.staged.as_ref().ok_or(ValidationError::MissingAsset)?;
        if self.mode == Mode::Verify && !directory.contains(name) {
            return Err(ValidationError::UnknownSubject {
                name: name.to_string(),
            });
        }

        self.generation += 1;
        self.inflight = Some(self.generation);
        self.request = RequestState::InFlight;
        self.last_result = None;
        self.error_message = None;

        tracing::debug!(generation = self.generation, mode = %self.mode, name, "submission started");
        Ok(Some(SubmitRequest {
            generation: self.generation,
            mode: self.mode,
            name: name.to_string(),
            audio: staged.bytes(),
            filename: staged.source_name().to_string(),
        }))
    }

    /// Applies a submission completion tagged with `generation`.
    ///
    /// Returns true if the completion was applied. A token that does not
    /// match the current in-flight generation identifies a stale response
    /// (cancelled or superseded); it is discarded without mutating state.
    ///
    /// On success the staged asset is consumed (one submission per staged
    /// asset). An enrollment additionally resets the session to idle and
    /// clears the subject name for the next enrollment. On failure the
    /// asset is kept so the same bytes can be resubmitted.
    pub fn resolve(&mut self, generation: u64, result: Result<Outcome, String>) -> bool {
        if self.inflight != Some(generation) {
            tracing::debug!(generation, "stale completion discarded");
            return false;
        }
        self.inflight = None;

        match result {
            Ok(outcome) => {
                self.staged = None;
                self.request = match outcome {
                    Outcome::Enrolled { .. } => {
                        self.subject_name.clear();
                        RequestState::Idle
                    }
                    _ => RequestState::Succeeded,
                };
                self.last_result = Some(outcome);
            }
            Err(message) => {
                tracing::debug!(generation, %message, "submission failed");
                self.error_message = Some(message);
                self.request = RequestState::Failed;
            }
        }
        true
    }

    /// Serializable snapshot of the session (asset payload excluded).
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            subject_name: self.subject_name.clone(),
            state: self.state(),
            staged: self.staged.as_ref().map(|a| a.meta()),
            request: self.request,
            last_result: self.last_result.clone(),
            error_message: self.error_message.clone(),
        }
    }
}

/// Serializable view of a [`Session`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub mode: Mode,
    pub subject_name: String,
    pub state: SessionState,
    pub staged: Option<AssetMeta>,
    pub request: RequestState,
    pub last_result: Option<Outcome>,
    pub error_message: Option<String>,
}
