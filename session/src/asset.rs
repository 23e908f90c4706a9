//! Audio asset acquisition.
//!
//! All three input sources (file pick, drag-and-drop, live recording) are
//! normalized into one immutable [`AudioAsset`] value with identical
//! validation: a payload whose declared type is not a WAV container is
//! rejected before it can ever be staged.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use voiceid_capture::{wav, Recording};

use crate::error::ValidationError;

/// Where an asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetOrigin {
    /// Chosen through a file picker.
    Picked,
    /// Dropped onto the client.
    Dropped,
    /// Captured live from the microphone.
    Recorded,
}

impl AssetOrigin {
    /// Returns the string representation of the origin.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetOrigin::Picked => "picked",
            AssetOrigin::Dropped => "dropped",
            AssetOrigin::Recorded => "recorded",
        }
    }
}

impl fmt::Display for AssetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An in-memory, validated audio payload staged for exactly one submission.
///
/// Immutable once acquired. The payload is held as [`Bytes`] so a retry can
/// reuse it without copying; any transient resources are released when the
/// asset is dropped (replacement, clear, or submission completion).
#[derive(Debug, Clone)]
pub struct AudioAsset {
    bytes: Bytes,
    media_type: String,
    source_name: String,
    origin: AssetOrigin,
}

impl AudioAsset {
    /// Returns the audio payload.
    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    /// Returns the declared media type.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Returns the original file or recording name.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Returns where the asset came from.
    pub fn origin(&self) -> AssetOrigin {
        self.origin
    }

    /// Returns the payload size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Serializable metadata view of the asset (payload excluded).
    pub fn meta(&self) -> AssetMeta {
        AssetMeta {
            media_type: self.media_type.clone(),
            source_name: self.source_name.clone(),
            origin: self.origin,
            size_bytes: self.bytes.len(),
        }
    }
}

impl Drop for AudioAsset {
    fn drop(&mut self) {
        // Release point for any transient handle tied to the payload.
        tracing::trace!(source = %self.source_name, "audio asset released");
    }
}

/// Serializable asset metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetMeta {
    pub media_type: String,
    pub source_name: String,
    pub origin: AssetOrigin,
    pub size_bytes: usize,
}

/// Validates a candidate payload from a file picker.
pub fn acquire_picked(
    bytes: Bytes,
    media_type: impl Into<String>,
    source_name: impl Into<String>,
) -> std::result::Result<AudioAsset, ValidationError> {
    acquire(bytes, media_type.into(), source_name.into(), AssetOrigin::Picked)
}

/// Validates a candidate payload from drag-and-drop. Behaviorally
/// identical to [`acquire_picked`] once normalized.
pub fn acquire_dropped(
    bytes: Bytes,
    media_type: impl Into<String>,
    source_name: impl Into<String>,
) -> std::result::Result<AudioAsset, ValidationError> {
    acquire(bytes, media_type.into(), source_name.into(), AssetOrigin::Dropped)
}

/// Validates a finalized recording from the capture unit.
///
/// Recordings are WAV by construction but still pass through the same
/// validation path as picked and dropped payloads.
pub fn acquire_recording(
    recording: Recording,
    source_name: impl Into<String>,
) -> std::result::Result<AudioAsset, ValidationError> {
    acquire(
        recording.wav,
        wav::WAV_MEDIA_TYPE.to_string(),
        source_name.into(),
        AssetOrigin::Recorded,
    )
}

fn acquire(
    bytes: Bytes,
    media_type: String,
    source_name: String,
    origin: AssetOrigin,
) -> std::result::Result<AudioAsset, ValidationError> {
    if !wav::is_wav_media_type(&media_type) {
        tracing::debug!(%media_type, %origin, "rejected non-wav payload");
        return Err(ValidationError::UnsupportedFormat { media_type });
    }

    Ok(AudioAsset {
        bytes,
        media_type,
        source_name,
        origin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes() -> Bytes {
        Bytes::from(voiceid_capture::wav::encode_wav(&[0i16; 16], 16_000, 1).unwrap())
    }

    #[test]
    fn picked_wav_is_acquired() {
        let asset = acquire_picked(wav_bytes(), "audio/wav", "sample.wav").unwrap();
        assert_eq!(asset.origin(), AssetOrigin::Picked);
        assert_eq!(asset.source_name(), "sample.wav");
        assert!(!asset.is_empty());
    }

    #[test]
    fn dropped_behaves_like_picked() {
        let picked = acquire_picked(wav_bytes(), "audio/x-wav", "a.wav").unwrap();
        let dropped = acquire_dropped(wav_bytes(), "audio/x-wav", "a.wav").unwrap();
        assert_eq!(picked.media_type(), dropped.media_type());
        assert_eq!(picked.len(), dropped.len());
    }

    #[test]
    fn non_wav_is_rejected_for_every_origin() {
        let expected = ValidationError::UnsupportedFormat {
            media_type: "audio/mpeg".to_string(),
        };
        let err = acquire_picked(wav_bytes(), "audio/mpeg", "song.mp3").unwrap_err();
        assert_eq!(err, expected);
        let err = acquire_dropped(wav_bytes(), "audio/mpeg", "song.mp3").unwrap_err();
        assert_eq!(err, expected);
    }

    #[test]
    fn recording_is_acquired_as_recorded() {
        let recording = Recording {
            wav: wav_bytes(),
            duration: std::time::Duration::from_millis(1),
        };
        let asset = acquire_recording(recording, "capture-1").unwrap();
        assert_eq!(asset.origin(), AssetOrigin::Recorded);
        assert_eq!(asset.media_type(), "audio/wav");
    }

    #[test]
    fn meta_excludes_payload() {
        let asset = acquire_picked(wav_bytes(), "audio/wav", "sample.wav").unwrap();
        let meta = asset.meta();
        assert_eq!(meta.size_bytes, asset.len());
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["origin"], "picked");
    }
}
