// src/services/completion.rs

use async_trait::async_trait;
use std::fmt;

/// Failure of a text-completion call.
#[derive(Debug)]
pub enum CompletionError {
    /// Connection, TLS or body decoding failure.
    Transport(String),

    /// The provider answered with a non-success status.
    Api { status: u16, message: String },

    /// The provider answered but produced no text (e.g. blocked prompt).
    EmptyResponse(String),
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::Transport(msg) => write!(f, "transport error: {}", msg),
            CompletionError::Api { status, message } => {
                write!(f, "API error ({}): {}", status, message)
            }
            CompletionError::EmptyResponse(reason) => write!(f, "empty response: {}", reason),
        }
    }
}

impl std::error::Error for CompletionError {}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Transport(err.to_string())
    }
}

/// An opaque text-completion service: prompt in, raw text out.
///
/// Implementations must be cancel-safe: the caller drops the future when
/// the generation budget runs out.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
