//! Model configuration shared by all providers.

use serde::{Deserialize, Serialize};

/// Supported inference backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    Ollama,
    /// Any OpenAI-compatible chat/embeddings gateway.
    OpenAi,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

/// Universal per-model configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub provider: LlmProvider,
    /// Base endpoint, e.g. `http://127.0.0.1:11434` or `https://api.openai.com`.
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Hard per-request timeout.
    pub timeout_secs: u64,
    pub temperature: Option<f32>,
}

impl ModelConfig {
    /// Generation profile from environment variables.
    ///
    /// - `LLM_PROVIDER` (`ollama` | `openai`, default `ollama`)
    /// - `LLM_ENDPOINT` (default `http://127.0.0.1:11434`)
    /// - `LLM_MODEL` (default `qwen2.5-coder:7b`)
    /// - `LLM_API_KEY`, `LLM_TIMEOUT_SECS` (default 30), `LLM_TEMPERATURE`
    pub fn generation_from_env() -> Self {
        Self::from_env_prefixed("LLM", "qwen2.5-coder:7b", 30)
    }

    /// Embedding profile from environment variables (`EMBED_*` keys,
    /// default model `nomic-embed-text`, default timeout 10 s).
    pub fn embedding_from_env() -> Self {
        Self::from_env_prefixed("EMBED", "nomic-embed-text", 10)
    }

    fn from_env_prefixed(prefix: &str, default_model: &str, default_timeout: u64) -> Self {
        let get = |suffix: &str| std::env::var(format!("{prefix}_{suffix}")).ok();
        let provider = match get("PROVIDER").as_deref() {
            Some("openai") => LlmProvider::OpenAi,
            _ => LlmProvider::Ollama,
        };
        Self {
            provider,
            endpoint: get("ENDPOINT").unwrap_or_else(|| "http://127.0.0.1:11434".to_string()),
            model: get("MODEL").unwrap_or_else(|| default_model.to_string()),
            api_key: get("API_KEY"),
            timeout_secs: get("TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_timeout),
            temperature: get("TEMPERATURE").and_then(|v| v.parse().ok()),
        }
    }
}

/// Rough token estimate used when a provider reports no usage
/// (heuristic: ~4 chars per token).
pub fn estimate_tokens(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    ((text.len() as f64 / 4.0).ceil() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_estimate_is_monotonic() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens(&"x".repeat(40)), 10);
    }
}
