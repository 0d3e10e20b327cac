use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bit depth of every buffer handed to the transcriber.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Raw signed 16-bit PCM captured from an input device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioData {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioData {
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Convert normalized float samples (-1.0..=1.0) to 16-bit PCM
    pub fn bits_per_sample(&self) -> u16 {
        BITS_PER_SAMPLE
    }

    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Source of fixed-length recordings.
///
/// `capture` blocks for the whole recording and is only ever called on the
/// turn worker thread.
pub trait AudioCapture: Send {
    fn capture(&mut self, duration: Duration, sample_rate: u32) -> Result<AudioData>;
}

/// Scale a float sample in `[-1, 1]` to 16-bit PCM, clamping overshoot.
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Number of mono frames needed to cover `duration` at `sample_rate`.
pub fn frames_for(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * sample_rate as f64).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_to_i16_clamps_and_scales() {
        let samples: Vec<i16> = [0.0, 1.0, -1.0, 2.0, -2.0].into_iter().map(f32_to_i16).collect();
        assert_eq!(samples, vec![0, i16::MAX, -i16::MAX, i16::MAX, -i16::MAX]);
    }

    #[test]
    fn test_duration_seconds() {
        let audio = AudioData::new(vec![0; 44_100 * 3], 44_100, 1);
        assert!((audio.duration_seconds() - 3.0).abs() < f32::EPSILON);
        assert_eq!(AudioData::new(vec![], 0, 1).duration_seconds(), 0.0);
    }

    #[test]
    fn test_frames_for_default_policy() {
        assert_eq!(frames_for(Duration::from_secs(3), 44_100), 132_300);
        assert_eq!(frames_for(Duration::from_millis(500), 16_000), 8_000);
    }
}
