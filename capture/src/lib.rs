//! Microphone capture unit.
//!
//! Produces one WAV [`Recording`] per completed capture via a small state
//! machine (`Idle -> Armed -> Capturing -> Idle`) with exclusive device
//! ownership while armed. Frame sources are pluggable through the
//! [`CaptureBackend`] trait; hardware backends live behind that seam and
//! out of this crate.
//!
//! # Example
//!
//! ```rust
//! use voiceid_capture::{Recorder, ScriptedBackend};
//!
//! let backend = ScriptedBackend::with_blocks(vec![vec![0i16; 1600]]);
//! let mut recorder = Recorder::new(backend);
//!
//! recorder.arm()?;
//! recorder.start()?;
//! while recorder.poll()? > 0 {}
//! let recording = recorder.stop()?;
//! assert_eq!(&recording.wav[0..4], b"RIFF");
//! # Ok::<(), voiceid_capture::CaptureError>(())
//! ```

mod backend;
mod error;
mod recorder;
pub mod wav;

pub use backend::{CaptureBackend, ScriptedBackend, CHANNELS, SAMPLE_RATE};
pub use error::{CaptureError, Result};
pub use recorder::{Recorder, Recording, RecorderState};
