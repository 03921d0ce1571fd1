//! OpenAI-compatible client for chat completion and embeddings.
//!
//! Operations:
//! - `POST {endpoint}/v1/chat/completions` — non-streaming completion
//! - `POST {endpoint}/v1/embeddings`       — embedding retrieval
//!
//! The `endpoint` may point at any compatible gateway; it must start with
//! `http://` or `https://`.

use std::time::Duration;

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ModelConfig, estimate_tokens};
use crate::errors::{LlmError, LlmResult};
use crate::service::Generation;

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    cfg: ModelConfig,
    url_chat: String,
    url_embeddings: String,
}

impl OpenAiClient {
    /// Creates a client from the given config.
    ///
    /// # Errors
    /// - [`LlmError::MissingApiKey`] if `cfg.api_key` is `None`
    /// - [`LlmError::InvalidEndpoint`] if `cfg.endpoint` is invalid
    /// - [`LlmError::Transport`] if the HTTP client cannot be built
    pub fn new(cfg: ModelConfig) -> LlmResult<Self> {
        let api_key = cfg.api_key.clone().ok_or(LlmError::MissingApiKey)?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(LlmError::InvalidEndpoint(cfg.endpoint));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| LlmError::Decode(format!("invalid API key header: {e}")))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .default_headers(headers)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        Ok(Self {
            url_chat: format!("{base}/v1/chat/completions"),
            url_embeddings: format!("{base}/v1/embeddings"),
            client,
            cfg,
        })
    }

    /// Non-streaming chat completion with usage accounting.
    pub async fn generate(&self, prompt: &str, max_tokens: u32) -> LlmResult<Generation> {
        let body = ChatCompletionRequest {
            model: &self.cfg.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.cfg.temperature,
            max_tokens,
        };

        debug!(model = %self.cfg.model, "POST {}", self.url_chat);
        let resp = self.client.post(&self.url_chat).json(&body).send().await?;
        let resp = check_status(resp, &self.url_chat).await?;

        let out: ChatCompletionResponse = resp.json().await.map_err(|e| {
            LlmError::Decode(format!(
                "serde error: {e}; expected `choices[0].message.content`"
            ))
        })?;

        let text = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or(LlmError::Empty)?;

        let usage = out.usage.unwrap_or_default();
        Ok(Generation {
            input_tokens: usage
                .prompt_tokens
                .unwrap_or_else(|| estimate_tokens(prompt)),
            output_tokens: usage
                .completion_tokens
                .unwrap_or_else(|| estimate_tokens(&text)),
            text,
        })
    }

    /// Embedding retrieval via `/v1/embeddings`.
    pub async fn embeddings(&self, input: &str) -> LlmResult<Vec<f32>> {
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            input,
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
            .map_err(|e| LlmError::Decode(format!("serde error: {e}; expected `data[0].embedding`")))?;

        out.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::Decode("empty `data` in embeddings response".into()))
    }
}

async fn check_status(resp: reqwest::Response, url: &str) -> LlmResult<reqwest::Response> {
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
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_response_with_usage_parses() {
        let raw = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{\"sections\":[]}"}}],
            "usage": {"prompt_tokens": 100, "completion_tokens": 20, "total_tokens": 120}
        }"#;
        let out: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let usage = out.usage.unwrap();
        assert_eq!(usage.prompt_tokens, Some(100));
        assert_eq!(usage.completion_tokens, Some(20));
        assert_eq!(
            out.choices[0].message.content.as_deref(),
            Some("{\"sections\":[]}")
        );
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let cfg = ModelConfig {
            provider: crate::config::LlmProvider::OpenAi,
            endpoint: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout_secs: 5,
            temperature: None,
        };
        assert!(matches!(
            OpenAiClient::new(cfg),
            Err(LlmError::MissingApiKey)
        ));
    }
}
