//! Error taxonomy for the session controller.
//!
//! Validation failures are local and never reach the network. Capture
//! failures are recoverable by re-arming. A directory failure is non-fatal.
//! Request failures leave the session in `Failed` with retry permitted.
//! No error is fatal to the process.

use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Local validation failure. Short-circuits before any network call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Subject name is empty.
    #[error("subject name is required")]
    MissingName,

    /// No asset is staged.
    #[error("no audio asset is staged")]
    MissingAsset,

    /// Declared media type is not a WAV container.
    #[error("unsupported audio format: {media_type} (expected audio/wav)")]
    UnsupportedFormat { media_type: String },

    /// Verify-mode subject is not in the user directory.
    #[error("unknown subject: {name}")]
    UnknownSubject { name: String },
}

/// Error type for session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Local validation failure.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Capture unit failure (device or recording).
    #[error(transparent)]
    Capture(#[from] voiceid_capture::CaptureError),

    /// The user directory could not be fetched. Non-fatal: verify mode
    /// degrades to an empty selectable set.
    #[error("user directory unavailable: {0}")]
    DirectoryUnavailable(#[source] voiceid_gateway::Error),

    /// The enroll or verify request failed (transport or server error).
    #[error("request failed: {0}")]
    Request(#[source] voiceid_gateway::Error),

    /// A submission is already in flight; the operation was rejected.
    #[error("a submission is in flight")]
    Busy,

    /// The controller task has shut down.
    #[error("session controller is closed")]
    Closed,
}

impl SessionError {
    /// Returns true for local validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, SessionError::Validation(_))
    }
}
