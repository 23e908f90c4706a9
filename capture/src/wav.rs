//! WAV container helpers.
//!
//! Recordings are finalized as 16 kHz mono 16-bit PCM in a standard
//! RIFF/WAVE container, the only encoding the backend accepts.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::Result;

/// Media type reported for finalized recordings.
pub const WAV_MEDIA_TYPE: &str = "audio/wav";

/// Media type aliases accepted as a WAV declaration.
const WAV_MEDIA_TYPES: [&str; 3] = ["audio/wav", "audio/x-wav", "audio/wave"];

/// Returns true if the declared media type indicates a WAV container.
///
/// Matching ignores case and any parameters (`audio/wav; rate=16000`).
pub fn is_wav_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    WAV_MEDIA_TYPES.contains(&essence.as_str())
}

/// Encodes i16 PCM samples into a WAV container.
pub fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}
