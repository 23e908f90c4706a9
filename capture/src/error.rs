//! Error types for audio capture.

use thiserror::Error;

/// Result type alias for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Errors returned by capture operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The recording device could not be acquired (permission denied,
    /// no device, or already owned by another recorder).
    #[error("recording device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A recording was stopped with zero buffered frames.
    #[error("recording produced no audio")]
    EmptyRecording,

    /// The recorder is not armed.
    #[error("recorder is not armed")]
    NotArmed,

    /// The recorder is not capturing.
    #[error("recorder is not capturing")]
    NotCapturing,

    /// WAV container encoding failed.
    #[error("wav encode error: {0}")]
    Wav(#[from] hound::Error),

    /// Backend frame source failure.
    #[error("capture backend error: {0}")]
    Backend(String),
}
