//! Recorder state machine.
//!
//! `Idle -> Armed -> Capturing -> Idle`. Arming claims exclusive ownership
//! of the recording device; stopping finalizes the buffered frames into
//! exactly one WAV recording and releases the device. Cancellation (or
//! dropping the recorder mid-capture) releases the device without
//! producing a partial recording.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;

use crate::backend::{CaptureBackend, DeviceGuard, CHANNELS, SAMPLE_RATE};
use crate::error::{CaptureError, Result};
use crate::wav;

/// State of a [`Recorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Armed,
    Capturing,
}

impl RecorderState {
    /// Returns the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecorderState::Idle => "idle",
            RecorderState::Armed => "armed",
            RecorderState::Capturing => "capturing",
        }
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A finalized recording: one WAV payload per completed capture.
#[derive(Debug, Clone)]
pub struct Recording {
    /// WAV container bytes.
    pub wav: Bytes,
    /// Duration of the captured audio.
    pub duration: Duration,
}

/// Microphone recorder over a [`CaptureBackend`].
pub struct Recorder<B: CaptureBackend> {
    backend: B,
    state: RecorderState,
    guard: Option<DeviceGuard>,
    frames: Vec<i16>,
}

impl<B: CaptureBackend> Recorder<B> {
    /// Creates an idle recorder over the given backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: RecorderState::Idle,
            guard: None,
            frames: Vec::new(),
        }
    }

    /// Returns the current recorder state.
    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Claims the recording device. `Idle -> Armed`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::DeviceUnavailable`] if the device is owned
    /// by another recorder or the backend cannot open it.
    pub fn arm(&mut self) -> Result<()> {
        if self.state != RecorderState::Idle {
            return Ok(());
        }

        let guard = DeviceGuard::claim()?;
        if let Err(e) = self.backend.open() {
            // Guard drops here, releasing the claim.
            drop(guard);
            return Err(e);
        }

        self.guard = Some(guard);
        self.state = RecorderState::Armed;
        tracing::debug!("recorder armed");
        Ok(())
    }

    /// Begins buffering audio frames. `Armed -> Capturing`.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            RecorderState::Armed => {
                self.frames.clear();
                self.state = RecorderState::Capturing;
                tracing::debug!("capture started");
                Ok(())
            }
            RecorderState::Capturing => Ok(()),
            RecorderState::Idle => Err(CaptureError::NotArmed),
        }
    }

    /// Reads the next block of frames from the backend into the buffer.
    /// Returns the number of samples read (zero when none were ready).
    pub fn poll(&mut self) -> Result<usize> {
        if self.state != RecorderState::Capturing {
            return Err(CaptureError::NotCapturing);
        }

        let block = self.backend.read()?;
        let read = block.len();
        self.frames.extend_from_slice(&block);
        Ok(read)
    }

    /// Duration of audio buffered so far.
    pub fn captured_duration(&self) -> Duration {
        let samples = self.frames.len() as u64 / CHANNELS as u64;
        Duration::from_micros(samples * 1_000_000 / SAMPLE_RATE as u64)
    }

    /// Finalizes the buffered frames into one recording and releases the
    /// device. `Capturing -> Idle`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::EmptyRecording`] if no frames were buffered;
    /// the device is still released.
    pub fn stop(&mut self) -> Result<Recording> {
        if self.state != RecorderState::Capturing {
            return Err(CaptureError::NotCapturing);
        }

        let frames = std::mem::take(&mut self.frames);
        self.release();

        if frames.is_empty() {
            return Err(CaptureError::EmptyRecording);
        }

        let duration =
            Duration::from_micros(frames.len() as u64 * 1_000_000 / SAMPLE_RATE as u64);
        let wav = wav::encode_wav(&frames, SAMPLE_RATE, CHANNELS)?;
        tracing::debug!(samples = frames.len(), ?duration, "recording finalized");

        Ok(Recording {
            wav: Bytes::from(wav),
            duration,
        })
    }

    /// Stops and releases the device without producing a recording.
    /// Safe to call in any state.
    pub fn cancel(&mut self) {
        if self.state != RecorderState::Idle {
            tracing::debug!(state = %self.state, "capture cancelled");
        }
        self.frames.clear();
        self.release();
    }

    fn release(&mut self) {
        self.backend.close();
        self.guard = None;
        self.state = RecorderState::Idle;
    }
}

impl<B: CaptureBackend> Drop for Recorder<B> {
    fn drop(&mut self) {
        self.cancel();
    }
}
