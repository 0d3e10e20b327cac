//! Configuration for the chat session
//!
//! Provides centralized configuration for all components.

use crate::audio::BITS_PER_SAMPLE;
use crate::llm::CompletionConfig;
use crate::speech::SpeechConfig;
use crate::{CareChatError, Result};
use std::time::Duration;

/// Environment variable holding the API credential
pub const API_KEY_VAR: &str = "API_KEY";
/// Optional separate credential for speech recognition
pub const SPEECH_API_KEY_VAR: &str = "CARECHAT_SPEECH_API_KEY";
/// Optional recognition language override
pub const LANGUAGE_VAR: &str = "CARECHAT_LANGUAGE";
/// Optional recording length override, in seconds
pub const RECORD_SECONDS_VAR: &str = "CARECHAT_RECORD_SECONDS";

/// Longest recording a voice turn may ask for
pub const MAX_RECORDING_DURATION: Duration = Duration::from_secs(60);

/// Fixed-length capture policy for voice input
#[derive(Clone, Debug, PartialEq)]
pub struct RecordingConfig {
    /// Length of every recording
    pub duration: Duration,
    /// Requested capture rate in Hz
    pub sample_rate: u32,
    /// Always mono
    pub channels: u16,
    /// Always 16-bit
    pub bits_per_sample: u16,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(3),
            sample_rate: 44_100,
            channels: 1,
            bits_per_sample: BITS_PER_SAMPLE,
        }
    }
}

/// Presentation settings for the chat window
#[derive(Clone, Debug, PartialEq)]
pub struct ShellConfig {
    pub title: String,
    pub user_marker: String,
    pub assistant_marker: String,
    pub input_hint: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            title: "Health Care ChatBot".to_string(),
            user_marker: "👤".to_string(),
            assistant_marker: "🧑🏻‍⚕️".to_string(),
            input_hint: "How can I help?".to_string(),
        }
    }
}

/// Configuration for the complete application
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// Completion service configuration
    pub completion: CompletionConfig,

    /// Speech recognition configuration
    pub speech: SpeechConfig,

    /// Voice capture policy
    pub recording: RecordingConfig,

    /// Window presentation
    pub shell: ShellConfig,

    /// Whether the microphone is used at all
    pub enable_audio_input: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            completion: CompletionConfig::default(),
            speech: SpeechConfig::default(),
            recording: RecordingConfig::default(),
            shell: ShellConfig::default(),
            enable_audio_input: true,
        }
    }
}

impl AppConfig {
    /// Create a configuration with one credential shared by both services
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        let mut config = Self::default();
        config.completion.api_key = api_key.clone();
        config.speech.api_key = api_key;
        config
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup
    ///
    /// A missing or blank `API_KEY` is a fatal configuration error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = non_blank(API_KEY_VAR).ok_or_else(|| {
            CareChatError::ConfigError(format!("{} is not set", API_KEY_VAR))
        })?;

        let mut config = Self::with_api_key(api_key.trim());

        if let Some(key) = non_blank(SPEECH_API_KEY_VAR) {
            config.speech.api_key = key.trim().to_string();
        }

        if let Some(language) = non_blank(LANGUAGE_VAR) {
            config.speech.language = language.trim().to_string();
        }

        if let Some(raw) = non_blank(RECORD_SECONDS_VAR) {
            let secs: f32 = raw.trim().parse().map_err(|_| {
                CareChatError::ConfigError(format!(
                    "{} must be a number of seconds, got {:?}",
                    RECORD_SECONDS_VAR, raw
                ))
            })?;
            if !secs.is_finite() || secs <= 0.0 {
                return Err(CareChatError::ConfigError(format!(
                    "{} must be positive, got {}",
                    RECORD_SECONDS_VAR, secs
                )));
            }
            config.recording.duration = Duration::try_from_secs_f32(secs).map_err(|e| {
                CareChatError::ConfigError(format!("{} is out of range: {}", RECORD_SECONDS_VAR, e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the recording length
    pub fn with_recording_duration(mut self, duration: Duration) -> Self {
        self.recording.duration = duration;
        self
    }

    /// Disable audio input (text-only mode)
    pub fn without_audio_input(mut self) -> Self {
        self.enable_audio_input = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.completion.api_key.trim().is_empty() {
            return Err(CareChatError::ConfigError(
                "completion API key is required".to_string(),
            ));
        }

        if self.enable_audio_input {
            if self.speech.api_key.trim().is_empty() {
                return Err(CareChatError::ConfigError(
                    "speech API key is required when audio input is enabled".to_string(),
                ));
            }
            if self.recording.duration.is_zero() {
                return Err(CareChatError::ConfigError(
                    "recording duration must be positive".to_string(),
                ));
            }
            if self.recording.duration > MAX_RECORDING_DURATION {
                return Err(CareChatError::ConfigError(format!(
                    "recording duration must be at most {}s, got {:?}",
                    MAX_RECORDING_DURATION.as_secs(),
                    self.recording.duration
                )));
            }
        }

        if self.recording.channels != 1 || self.recording.bits_per_sample != BITS_PER_SAMPLE {
            return Err(CareChatError::ConfigError(
                "recordings must be mono 16-bit".to_string(),
            ));
        }

        Ok(())
    }
}
