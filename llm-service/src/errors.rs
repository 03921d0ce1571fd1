//! Errors produced by the LLM clients.

use reqwest::StatusCode;
use thiserror::Error;

pub type LlmResult<T> = Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    /// API key is missing for a provider that requires one.
    #[error("missing API key for provider")]
    MissingApiKey,

    /// Invalid endpoint (empty or missing http/https).
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Transport/HTTP client error (includes timeouts).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-successful HTTP status from upstream.
    #[error("unexpected HTTP status {status} from {url}: {snippet}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        snippet: String,
    },

    /// Unexpected/invalid JSON response.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The completion returned no content.
    #[error("empty response: no content returned")]
    Empty,
}

impl LlmError {
    /// True for transport-level timeouts, surfaced as typed failures.
    pub fn is_timeout(&self) -> bool {
        matches!(self, LlmError::Transport(e) if e.is_timeout())
    }
}
