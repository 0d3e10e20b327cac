//! Speech processing
//!
//! Turns recorded audio into text through a remote recognition service.

pub mod stt;

pub use stt::{
    GoogleSpeechTranscriber, SpeechConfig, Transcriber, TranscriptionFailure, TranscriptionResult,
};
