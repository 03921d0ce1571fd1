//! Environment-driven configuration for retrieval and answering.

/// Config bag for the Q&A engine. All fields have defaults via `from_env`.
#[derive(Debug, Clone)]
pub struct QaConfig {
    /// Vector leg candidate count.
    pub vector_k: u64,
    /// Trigram leg candidate count.
    pub trigram_k: usize,
    /// Final merged source count handed to the model.
    pub final_k: usize,

    /// Snippet truncation bound.
    pub snippet_max_chars: usize,
    /// Snippet cache TTL in seconds.
    pub snippet_ttl_secs: u64,

    /// Output token cap for the answer generation.
    pub answer_max_tokens: u32,
    /// Extra full-call retries after a parse failure.
    pub retry_on_parse_failure: u32,

    /// Per-leg retrieval deadline.
    pub retriever_timeout_secs: u64,
    /// Provider fetch deadline (snippet hydration).
    pub provider_timeout_secs: u64,
    /// LLM call deadline.
    pub llm_timeout_secs: u64,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            vector_k: 15,
            trigram_k: 10,
            final_k: 15,
            snippet_max_chars: 500,
            snippet_ttl_secs: 3600,
            answer_max_tokens: 1500,
            retry_on_parse_failure: 1,
            retriever_timeout_secs: 5,
            provider_timeout_secs: 10,
            llm_timeout_secs: 30,
        }
    }
}

impl QaConfig {
    /// Build from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            vector_k: parse("RETRIEVER_VECTOR_K", d.vector_k),
            trigram_k: parse("RETRIEVER_TRIGRAM_K", d.trigram_k),
            final_k: parse("RETRIEVER_FINAL_K", d.final_k),
            snippet_max_chars: parse("SNIPPET_MAX_CHARS", d.snippet_max_chars),
            snippet_ttl_secs: parse("SNIPPET_TTL_SECS", d.snippet_ttl_secs),
            answer_max_tokens: parse("ANSWERER_MAX_TOKENS", d.answer_max_tokens),
            retry_on_parse_failure: parse("ANSWERER_RETRY", d.retry_on_parse_failure),
            retriever_timeout_secs: parse("RETRIEVER_TIMEOUT_SECS", d.retriever_timeout_secs),
            provider_timeout_secs: parse("PROVIDER_TIMEOUT_SECS", d.provider_timeout_secs),
            llm_timeout_secs: parse("LLM_TIMEOUT_SECS", d.llm_timeout_secs),
        }
    }
}

fn parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
