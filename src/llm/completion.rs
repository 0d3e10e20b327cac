//! Completion adapter for the hosted Gemini model
//!
//! Each call is stateless: only the prompt is sent, never the conversation.

use crate::llm::config::CompletionConfig;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why the completion service produced no answer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionFailure {
    /// Network failure, rate limiting or a server-side error
    #[error("completion service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Any other failure, e.g. a rejected request or a blocked prompt
    #[error("completion failed: {0}")]
    Other(String),
}

/// Full response text or a failure carrying the underlying error
pub type CompletionResult = std::result::Result<String, CompletionFailure>;

/// Sends one prompt to a generative-text service
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, prompt: &str) -> CompletionResult;
}

#[derive(Serialize, Debug)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize, Debug)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
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

/// Client for the Gemini `generateContent` endpoint
pub struct GeminiCompleter {
    config: CompletionConfig,
    client: reqwest::Client,
}

impl GeminiCompleter {
    pub fn new(config: CompletionConfig) -> Self {
        info!("Completions via model {}", config.model());
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }
}

#[async_trait]
impl Completer for GeminiCompleter {
    async fn complete(&self, prompt: &str) -> CompletionResult {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        debug!("Sending prompt ({} chars) to {}", prompt.len(), self.config.model());
        let started = Instant::now();

        let response = self
            .client
            .post(self.config.generate_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionFailure::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CompletionFailure::ServiceUnavailable(e.to_string()))?;

        if !status.is_success() {
            let detail = api_error_message(&body).unwrap_or(body);
            warn!("Completion service returned HTTP {}: {}", status, detail);
            return Err(classify_status(status, detail));
        }

        let text = extract_text(&body)?;
        debug!(
            "Received response ({} chars) in {}ms",
            text.len(),
            started.elapsed().as_millis()
        );
        Ok(text)
    }
}

/// Rate limiting, timeouts and server errors are transient; anything else
/// means the request itself was refused.
fn classify_status(status: StatusCode, detail: String) -> CompletionFailure {
    let message = format!("HTTP {}: {}", status.as_u16(), detail);
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        CompletionFailure::ServiceUnavailable(message)
    } else {
        CompletionFailure::Other(message)
    }
}

fn extract_text(body: &str) -> CompletionResult {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| CompletionFailure::Other(format!("invalid completion response: {}", e)))?;

    let Some(candidate) = response.candidates.first() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(CompletionFailure::Other(format!(
            "prompt was not answered ({})",
            reason
        )));
    };

    let text: String = candidate
        .content
        .iter()
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.text.as_deref())
        .collect();

    if text.is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("UNKNOWN");
        return Err(CompletionFailure::Other(format!(
            "response contained no text (finish reason {})",
            reason
        )));
    }

    Ok(text)
}

fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .map(|b| b.error.message)
        .filter(|m| !m.is_empty())
}
