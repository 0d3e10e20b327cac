use super::capture::{f32_to_i16, frames_for, AudioCapture, AudioData};
use crate::{CareChatError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SampleRate, Stream, StreamConfig, SupportedStreamConfig};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Extra time allowed for the device to deliver the tail of a recording
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Fixed-length recorder on the default input device
pub struct MicrophoneCapture {
    device: Device,
}

impl MicrophoneCapture {
    /// Create a recorder bound to the default input device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host.default_input_device().ok_or_else(|| {
            CareChatError::AudioDeviceError("No input device available".into())
        })?;

        info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        Ok(Self { device })
    }

    /// Pick a device configuration at `sample_rate`, falling back to the
    /// device default when the rate is not supported
    fn select_config(&self, sample_rate: u32) -> Result<SupportedStreamConfig> {
        let wanted = SampleRate(sample_rate);
        let supported = self
            .device
            .supported_input_configs()
            .map_err(|e| {
                CareChatError::AudioDeviceError(format!("Failed to query input configs: {}", e))
            })?
            .filter(|range| {
                matches!(range.sample_format(), SampleFormat::F32 | SampleFormat::I16)
                    && range.min_sample_rate() <= wanted
                    && range.max_sample_rate() >= wanted
            })
            .min_by_key(|range| range.channels());

        if let Some(range) = supported {
            return Ok(range.with_sample_rate(wanted));
        }

        let fallback = self.device.default_input_config().map_err(|e| {
            CareChatError::AudioDeviceError(format!("Failed to get input config: {}", e))
        })?;
        warn!(
            "Input device does not support {} Hz, recording at {} Hz",
            sample_rate,
            fallback.sample_rate().0
        );
        Ok(fallback)
    }

    fn build_stream(
        &self,
        supported: &SupportedStreamConfig,
        chunk_tx: Sender<Vec<i16>>,
    ) -> Result<Stream> {
        let config: StreamConfig = supported.config();
        let channels = config.channels as usize;

        let err_fn = |err| {
            error!("Audio input stream error: {}", err);
        };

        let stream = match supported.sample_format() {
            SampleFormat::F32 => self.device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let samples = data.iter().copied().map(f32_to_i16);
                    let _ = chunk_tx.try_send(downmix(samples, channels));
                },
                err_fn,
                None,
            ),
            SampleFormat::I16 => self.device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let _ = chunk_tx.try_send(downmix(data.iter().copied(), channels));
                },
                err_fn,
                None,
            ),
            other => {
                return Err(CareChatError::AudioDeviceError(format!(
                    "Unsupported sample format: {:?}",
                    other
                )))
            }
        };

        stream.map_err(|e| {
            CareChatError::AudioDeviceError(format!("Failed to build input stream: {}", e))
        })
    }
}

impl AudioCapture for MicrophoneCapture {
    fn capture(&mut self, duration: Duration, sample_rate: u32) -> Result<AudioData> {
        let supported = self.select_config(sample_rate)?;
        let actual_rate = supported.sample_rate().0;
        let wanted_frames = frames_for(duration, actual_rate);

        let (chunk_tx, chunk_rx) = bounded(256);
        let stream = self.build_stream(&supported, chunk_tx)?;
        stream.play().map_err(|e| {
            CareChatError::AudioDeviceError(format!("Failed to start input stream: {}", e))
        })?;

        info!("Recording {:.1}s at {} Hz", duration.as_secs_f32(), actual_rate);
        let samples = collect_frames(&chunk_rx, wanted_frames, duration + DRAIN_GRACE);
        drop(stream);

        if samples.len() < wanted_frames {
            warn!(
                "Recording ended short: {} of {} frames",
                samples.len(),
                wanted_frames
            );
        }
        debug!("Captured {} frames", samples.len());

        Ok(AudioData::new(samples, actual_rate, 1))
    }
}

/// Average interleaved frames down to mono
fn downmix(samples: impl Iterator<Item = i16>, channels: usize) -> Vec<i16> {
    if channels <= 1 {
        return samples.collect();
    }
    let interleaved: Vec<i16> = samples.collect();
    interleaved
        .chunks(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

/// Drain chunks until `wanted` frames arrived or `deadline` passed
fn collect_frames(chunk_rx: &Receiver<Vec<i16>>, wanted: usize, deadline: Duration) -> Vec<i16> {
    let started = Instant::now();
    let mut samples = Vec::with_capacity(wanted);

    while samples.len() < wanted {
        let remaining = match deadline.checked_sub(started.elapsed()) {
            Some(remaining) => remaining,
            None => break,
        };
        match chunk_rx.recv_timeout(remaining) {
            Ok(chunk) => samples.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Timeout) => break,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    samples.truncate(wanted);
    samples
}
