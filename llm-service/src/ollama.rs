//! Ollama client for text generation and embeddings.
//!
//! Operations:
//! - `POST {endpoint}/api/generate`   — non-streaming generation
//! - `POST {endpoint}/api/embeddings` — embedding retrieval
//!
//! Ollama reports `prompt_eval_count`/`eval_count`, which map directly onto
//! input/output token usage.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ModelConfig, estimate_tokens};
use crate::errors::{LlmError, LlmResult};
use crate::service::Generation;

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    cfg: ModelConfig,
    url_generate: String,
    url_embeddings: String,
}

impl OllamaClient {
    /// Creates a client from the given config.
    ///
    /// # Errors
    /// - [`LlmError::InvalidEndpoint`] if `cfg.endpoint` is not http(s)
    /// - [`LlmError::Transport`] if the HTTP client cannot be built
    pub fn new(cfg: ModelConfig) -> LlmResult<Self> {
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(LlmError::InvalidEndpoint(cfg.endpoint));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        Ok(Self {
            url_generate: format!("{base}/api/generate"),
            url_embeddings: format!("{base}/api/embeddings"),
            client,
            cfg,
        })
    }

    /// Non-streaming generation with usage accounting.
    pub async fn generate(&self, prompt: &str, max_tokens: u32) -> LlmResult<Generation> {
        let body = GenerateRequest {
            model: &self.cfg.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: max_tokens,
                temperature: self.cfg.temperature,
            },
        };

        debug!(model = %self.cfg.model, "POST {}", self.url_generate);
        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await?;
        let resp = check_status(resp, &self.url_generate).await?;

        let out: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Decode(format!("serde error: {e}; expected `response`")))?;

        if out.response.is_empty() {
            return Err(LlmError::Empty);
        }
        Ok(Generation {
            input_tokens: out
                .prompt_eval_count
                .unwrap_or_else(|| estimate_tokens(prompt)),
            output_tokens: out
                .eval_count
                .unwrap_or_else(|| estimate_tokens(&out.response)),
            text: out.response,
        })
    }

    /// Embedding retrieval. Ollama does not report usage for embeddings;
    /// callers estimate tokens from input length.
    pub async fn embeddings(&self, input: &str) -> LlmResult<Vec<f32>> {
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            prompt: input,
        };

        debug!(model = %self.cfg.model, "POST {}", self.url_embeddings);
        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await?;
        let resp = check_status(resp, &self.url_embeddings).await?;

        let out: EmbeddingsResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Decode(format!("serde error: {e}; expected `embedding`")))?;
        Ok(out.embedding)
    }
}

async fn check_status(
    resp: reqwest::Response,
    url: &str,
) -> LlmResult<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let snippet = text.chars().take(240).collect::<String>();
    Err(LlmError::HttpStatus {
        status,
        url: url.to_string(),
        snippet,
    })
}

/* ==========================
HTTP payloads
========================== */

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_response_shape_parses() {
        let raw = r#"{"model":"m","response":"hello","prompt_eval_count":12,"eval_count":3,"done":true}"#;
        let out: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(out.response, "hello");
        assert_eq!(out.prompt_eval_count, Some(12));
        assert_eq!(out.eval_count, Some(3));
    }

    #[test]
    fn embeddings_response_shape_parses() {
        let raw = r#"{"embedding":[0.25,-0.5]}"#;
        let out: EmbeddingsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(out.embedding, vec![0.25, -0.5]);
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let cfg = ModelConfig {
            provider: crate::config::LlmProvider::Ollama,
            endpoint: "not-a-url".to_string(),
            model: "m".to_string(),
            api_key: None,
            timeout_secs: 5,
            temperature: None,
        };
        assert!(matches!(
            OllamaClient::new(cfg),
            Err(LlmError::InvalidEndpoint(_))
        ));
    }
}
