//! Capture backend seam.
//!
//! A [`CaptureBackend`] is the frame source behind a recorder: a real
//! microphone backend (PortAudio, ALSA, CoreAudio) plugs in here, while
//! tests and headless environments use [`ScriptedBackend`]. The backend
//! follows a blocking open/read/close model with i16 samples.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{CaptureError, Result};

/// Sample rate recordings are captured at.
pub const SAMPLE_RATE: u32 = 16_000;

/// Number of channels recordings are captured with.
pub const CHANNELS: u16 = 1;

/// Source of PCM audio frames.
pub trait CaptureBackend: Send {
    /// Opens the underlying frame source.
    fn open(&mut self) -> Result<()>;

    /// Reads the next block of samples. An empty block means the source
    /// is exhausted (scripted backends) or no frames are ready yet.
    fn read(&mut self) -> Result<Vec<i16>>;

    /// Closes the underlying frame source. Must be safe to call twice.
    fn close(&mut self);
}

/// Process-wide microphone ownership flag. The hardware device is a
/// single-owner resource no matter how many recorders exist.
static DEVICE_OWNED: AtomicBool = AtomicBool::new(false);

/// Exclusive claim on the recording device, released on drop.
#[derive(Debug)]
pub(crate) struct DeviceGuard(());

impl DeviceGuard {
    /// Claims the device, failing if another recorder holds it.
    pub(crate) fn claim() -> Result<Self> {
        if DEVICE_OWNED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CaptureError::DeviceUnavailable(
                "already owned by another recorder".to_string(),
            ));
        }
        Ok(DeviceGuard(()))
    }
}

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        DEVICE_OWNED.store(false, Ordering::Release);
        tracing::debug!("recording device released");
    }
}

/// Backend that replays queued sample blocks.
///
/// Used in tests and headless environments where no hardware device is
/// present.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    blocks: VecDeque<Vec<i16>>,
    open: bool,
    fail_open: Option<String>,
}

impl ScriptedBackend {
    /// Creates an empty scripted backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that replays the given sample blocks in order.
    pub fn with_blocks(blocks: Vec<Vec<i16>>) -> Self {
        Self {
            blocks: blocks.into(),
            open: false,
            fail_open: None,
        }
    }

    /// Creates a backend whose `open` fails, simulating a missing device
    /// or denied permission.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            blocks: VecDeque::new(),
            open: false,
            fail_open: Some(reason.into()),
        }
    }

    /// Queues another block of samples.
    pub fn push_block(&mut self, block: Vec<i16>) {
        self.blocks.push_back(block);
    }
}

impl CaptureBackend for ScriptedBackend {
    fn open(&mut self) -> Result<()> {
        if let Some(reason) = &self.fail_open {
            return Err(CaptureError::DeviceUnavailable(reason.clone()));
        }
        self.open = true;
        Ok(())
    }

    fn read(&mut self) -> Result<Vec<i16>> {
        if !self.open {
            return Err(CaptureError::Backend("read on closed backend".to_string()));
        }
        Ok(self.blocks.pop_front().unwrap_or_default())
    }

    fn close(&mut self) {
        self.open = false;
    }
}
