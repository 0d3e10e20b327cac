//! Configuration for the hosted completion service

/// Model used for every completion request
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Default REST base of the Generative Language API
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the completion client
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionConfig {
    /// API credential, required
    pub api_key: String,

    /// REST base URL; the model path is appended to it
    pub base_url: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

impl CompletionConfig {
    /// Create a configuration with the given credential
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Point the client at a different base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The model identifier, fixed for the whole session
    pub fn model(&self) -> &'static str {
        GEMINI_MODEL
    }

    /// Full `generateContent` URL for the fixed model
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            GEMINI_MODEL
        )
    }
}
