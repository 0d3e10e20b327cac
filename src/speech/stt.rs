//! Speech-to-text adapter
//!
//! Wraps a remote recognition service behind the [`Transcriber`] trait. The
//! default implementation posts an in-memory WAV file to Google Cloud
//! Speech-to-Text.

use crate::audio::{encode_wav, AudioData};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default recognition endpoint
pub const DEFAULT_SPEECH_ENDPOINT: &str = "https://speech.googleapis.com/v1/speech:recognize";

/// Why a recording could not be turned into text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionFailure {
    /// The service answered but found no intelligible speech
    #[error("speech was unintelligible")]
    Unintelligible,

    /// The request itself failed
    #[error("speech service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Recognized text (possibly empty) or a classified failure
pub type TranscriptionResult = std::result::Result<String, TranscriptionFailure>;

/// Converts captured audio into text
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &AudioData) -> TranscriptionResult;
}

/// Configuration for the speech recognition service
#[derive(Clone, Debug, PartialEq)]
pub struct SpeechConfig {
    /// API key sent as the `key` query parameter
    pub api_key: String,
    /// BCP-47 language code of the expected speech
    pub language: String,
    /// Recognition endpoint URL
    pub endpoint: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: "en-US".to_string(),
            endpoint: DEFAULT_SPEECH_ENDPOINT.to_string(),
        }
    }
}

impl SpeechConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    encoding: &'static str,
    sample_rate_hertz: u32,
    audio_channel_count: u16,
    language_code: &'a str,
}

#[derive(Serialize, Debug)]
struct RecognitionAudio {
    content: String,
}

#[derive(Serialize, Debug)]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Deserialize, Debug, Default)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Deserialize, Debug)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Deserialize, Debug)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// Google Cloud Speech-to-Text client
pub struct GoogleSpeechTranscriber {
    config: SpeechConfig,
    client: reqwest::Client,
}

impl GoogleSpeechTranscriber {
    pub fn new(config: SpeechConfig) -> Self {
        info!("Speech recognition via {} ({})", config.endpoint, config.language);
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }

    fn build_request(
        &self,
        audio: &AudioData,
    ) -> std::result::Result<RecognizeRequest<'_>, TranscriptionFailure> {
        let wav = encode_wav(audio).map_err(|e| {
            TranscriptionFailure::ServiceUnavailable(format!("could not encode audio: {}", e))
        })?;

        Ok(RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: audio.sample_rate,
                audio_channel_count: audio.channels,
                language_code: &self.config.language,
            },
            audio: RecognitionAudio {
                content: BASE64.encode(wav),
            },
        })
    }
}

#[async_trait]
impl Transcriber for GoogleSpeechTranscriber {
    async fn transcribe(&self, audio: &AudioData) -> TranscriptionResult {
        let request = self.build_request(audio)?;

        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| TranscriptionFailure::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TranscriptionFailure::ServiceUnavailable(e.to_string()))?;

        if !status.is_success() {
            let detail = api_error_message(&body).unwrap_or_else(|| body.clone());
            warn!("Speech service returned HTTP {}: {}", status, detail);
            return Err(TranscriptionFailure::ServiceUnavailable(format!(
                "HTTP {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let text = parse_transcript(&body)?;
        debug!("Recognized {} characters", text.len());
        Ok(text)
    }
}

/// Join the best alternative of every result. No alternatives at all means
/// the service could not make out any speech.
fn parse_transcript(body: &str) -> TranscriptionResult {
    let response: RecognizeResponse = serde_json::from_str(body).map_err(|e| {
        TranscriptionFailure::ServiceUnavailable(format!("invalid recognition response: {}", e))
    })?;

    let parts: Vec<&str> = response
        .results
        .iter()
        .filter_map(|result| result.alternatives.first())
        .map(|alt| alt.transcript.trim())
        .collect();

    if parts.is_empty() {
        return Err(TranscriptionFailure::Unintelligible);
    }

    Ok(parts.join(" ").trim().to_string())
}

fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .map(|b| b.error.message)
        .filter(|m| !m.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_result() {
        let body = r#"{"results":[{"alternatives":[{"transcript":"I have a headache","confidence":0.92}]}]}"#;
        assert_eq!(parse_transcript(body).unwrap(), "I have a headache");
    }

    #[test]
    fn test_parse_joins_results_in_order() {
        let body = r#"{"results":[
            {"alternatives":[{"transcript":"my throat hurts"},{"transcript":"my goat hurts"}]},
            {"alternatives":[{"transcript":" since yesterday"}]}
        ]}"#;
        assert_eq!(
            parse_transcript(body).unwrap(),
            "my throat hurts since yesterday"
        );
    }

    #[test]
    fn test_parse_empty_response_is_unintelligible() {
        assert_eq!(parse_transcript("{}"), Err(TranscriptionFailure::Unintelligible));
        assert_eq!(
            parse_transcript(r#"{"results":[{"alternatives":[]}]}"#),
            Err(TranscriptionFailure::Unintelligible)
        );
    }

    #[test]
    fn test_parse_garbage_is_service_failure() {
        assert!(matches!(
            parse_transcript("<html>bad gateway</html>"),
            Err(TranscriptionFailure::ServiceUnavailable(_))
        ));
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(api_error_message(body).as_deref(), Some("API key not valid"));
        assert_eq!(api_error_message("not json"), None);
    }

    #[test]
    fn test_request_carries_wav_content() {
        let transcriber = GoogleSpeechTranscriber::new(SpeechConfig::new("key"));
        let audio = AudioData::new(vec![0; 441], 44_100, 1);
        let request = transcriber.build_request(&audio).unwrap();

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["config"]["encoding"], "LINEAR16");
        assert_eq!(json["config"]["sampleRateHertz"], 44_100);
        assert_eq!(json["config"]["audioChannelCount"], 1);
        assert_eq!(json["config"]["languageCode"], "en-US");

        let wav = BASE64
            .decode(json["audio"]["content"].as_str().unwrap())
            .unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        let config = SpeechConfig::new("key").with_endpoint("http://127.0.0.1:9/speech:recognize");
        let transcriber = GoogleSpeechTranscriber::new(config);
        let audio = AudioData::new(vec![0; 441], 44_100, 1);

        let result = transcriber.transcribe(&audio).await;
        assert!(matches!(result, Err(TranscriptionFailure::ServiceUnavailable(_))));
    }
}
