//! Text completion through a hosted LLM

pub mod completion;
pub mod config;

pub use completion::{Completer, CompletionFailure, CompletionResult, GeminiCompleter};
pub use config::{CompletionConfig, GEMINI_MODEL};
