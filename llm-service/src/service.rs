//! Provider dispatch without async-trait or boxed clients.

use tracing::info;

use crate::config::{LlmProvider, ModelConfig, estimate_tokens};
use crate::errors::LlmResult;
use crate::ollama::OllamaClient;
use crate::openai::OpenAiClient;

/// One generation result with token usage.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Concrete LLM client (enum-dispatch).
#[derive(Debug, Clone)]
pub enum LlmClient {
    Ollama(OllamaClient),
    OpenAi(OpenAiClient),
}

impl LlmClient {
    /// Constructs a concrete client from generic config.
    pub fn from_config(cfg: ModelConfig) -> LlmResult<Self> {
        info!(provider = %cfg.provider, model = %cfg.model, endpoint = %cfg.endpoint, "llm client init");
        Ok(match cfg.provider {
            LlmProvider::Ollama => Self::Ollama(OllamaClient::new(cfg)?),
            LlmProvider::OpenAi => Self::OpenAi(OpenAiClient::new(cfg)?),
        })
    }

    /// Generates text, returning content plus input/output token counts.
    pub async fn generate(&self, prompt: &str, max_tokens: u32) -> LlmResult<Generation> {
        match self {
            Self::Ollama(c) => c.generate(prompt, max_tokens).await,
            Self::OpenAi(c) => c.generate(prompt, max_tokens).await,
        }
    }

    /// Computes an embedding vector for the input text.
    pub async fn embed(&self, input: &str) -> LlmResult<Vec<f32>> {
        match self {
            Self::Ollama(c) => c.embeddings(input).await,
            Self::OpenAi(c) => c.embeddings(input).await,
        }
    }

    /// Token estimate for embedding inputs (providers report no usage there).
    pub fn embedding_tokens(&self, input: &str) -> u32 {
        estimate_tokens(input)
    }
}
