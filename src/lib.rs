pub mod audio;
pub mod integration;
pub mod llm;
pub mod messages;
pub mod speech;
pub mod ui;

use crate::integration::TurnState;
use crate::llm::CompletionFailure;
use crate::speech::TranscriptionFailure;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CareChatError {
    #[error("Input validation error: {0}")]
    InputValidation(String),

    #[error("Transcription error: {0}")]
    Transcription(#[from] TranscriptionFailure),

    #[error("No speech was recognized in the recording")]
    NoSpeech,

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionFailure),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("A turn is already in flight ({0:?})")]
    TurnInFlight(TurnState),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for CareChatError {
    fn from(e: std::io::Error) -> Self {
        CareChatError::IOError(e.to_string())
    }
}

impl CareChatError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The user simply tries again
            CareChatError::InputValidation(_) => true,
            CareChatError::Transcription(_) => true,
            CareChatError::NoSpeech => true,
            CareChatError::Completion(_) => true,
            CareChatError::TurnInFlight(_) => true,
            CareChatError::AudioProcessingError(_) => true,
            // Hardware/device errors may require user intervention
            CareChatError::AudioDeviceError(_) => false,
            CareChatError::ConfigError(_) => false,
            CareChatError::ChannelError(_) => false,
            CareChatError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            CareChatError::InputValidation(_) => "Please enter a message first.".to_string(),
            CareChatError::Transcription(TranscriptionFailure::Unintelligible) => {
                "Sorry, I couldn't understand the audio.".to_string()
            }
            CareChatError::Transcription(TranscriptionFailure::ServiceUnavailable(detail)) => {
                format!(
                    "Could not request results from the speech recognition service; {}",
                    detail
                )
            }
            CareChatError::NoSpeech => "No speech was detected. Please try again.".to_string(),
            CareChatError::Completion(CompletionFailure::ServiceUnavailable(detail)) => {
                format!("The assistant is unavailable right now; {}", detail)
            }
            CareChatError::Completion(CompletionFailure::Other(detail)) => {
                format!("The assistant could not answer; {}", detail)
            }
            CareChatError::ConfigError(_) => {
                "Configuration error. Please check your environment.".to_string()
            }
            CareChatError::AudioDeviceError(_) => {
                "Audio device error. Please check your microphone.".to_string()
            }
            CareChatError::AudioProcessingError(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
            CareChatError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            CareChatError::TurnInFlight(_) => {
                "Please wait for the current answer to finish.".to_string()
            }
            CareChatError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CareChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcription_messages_match_wording() {
        let err = CareChatError::from(TranscriptionFailure::Unintelligible);
        assert_eq!(err.user_message(), "Sorry, I couldn't understand the audio.");

        let err = CareChatError::from(TranscriptionFailure::ServiceUnavailable(
            "connection refused".to_string(),
        ));
        assert!(err.user_message().ends_with("; connection refused"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_config_error_is_fatal() {
        let err = CareChatError::ConfigError("API_KEY is not set".to_string());
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "Configuration error: API_KEY is not set");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CareChatError = io.into();
        assert!(matches!(err, CareChatError::IOError(ref m) if m == "missing"));
    }
}
