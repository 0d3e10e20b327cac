use super::capture::{AudioData, BITS_PER_SAMPLE};
use crate::{CareChatError, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use tracing::debug;

/// Encode PCM samples into an in-memory WAV file
///
/// # Arguments
/// * `audio` - 16-bit samples plus their rate and channel count
///
/// # Returns
/// * The complete RIFF/WAVE byte stream
pub fn encode_wav(audio: &AudioData) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: audio.channels,
        sample_rate: audio.sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + audio.samples.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(|e| {
            CareChatError::AudioProcessingError(format!("Failed to create WAV writer: {}", e))
        })?;

        let mut sample_writer = writer.get_i16_writer(audio.samples.len() as u32);
        for &sample in &audio.samples {
            sample_writer.write_sample(sample);
        }
        sample_writer.flush().map_err(|e| {
            CareChatError::AudioProcessingError(format!("Failed to write samples: {}", e))
        })?;

        writer.finalize().map_err(|e| {
            CareChatError::AudioProcessingError(format!("Failed to finalize WAV data: {}", e))
        })?;
    }

    let bytes = cursor.into_inner();
    debug!(
        "Encoded {} samples ({:.2}s) into {} WAV bytes",
        audio.samples.len(),
        audio.duration_seconds(),
        bytes.len()
    );
    Ok(bytes)
}
