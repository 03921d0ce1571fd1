//! LLM and embedding backends.
//!
//! Thin clients over Ollama (`/api/generate`, `/api/embeddings`) and any
//! OpenAI-compatible gateway (`/v1/chat/completions`, `/v1/embeddings`),
//! dispatched through an enum. Every generation returns token usage so the
//! caller can meter accurately; embedding usage is estimated from input
//! length. No retries live here: retry policy belongs to the caller.

pub mod config;
pub mod errors;
pub mod ollama;
pub mod openai;
pub mod service;

pub use config::{LlmProvider, ModelConfig, estimate_tokens};
pub use errors::{LlmError, LlmResult};
pub use service::{Generation, LlmClient};
