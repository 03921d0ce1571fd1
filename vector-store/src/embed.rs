//! Embedding provider interface.
//!
//! Async is required because real providers (Ollama, OpenAI-compatible
//! gateways) perform HTTP requests.

use std::{future::Future, pin::Pin};

use crate::errors::VectorStoreError;

/// Provider interface for embedding generation.
///
/// Implement this trait to plug in an embedding backend. The dimension of
/// returned vectors must match the deployment's fixed dimension; the store
/// rejects mismatches.
pub trait EmbeddingModel: Send + Sync {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, VectorStoreError>> + Send + 'a>>;
}

/// Deterministic offline embedder for tests and dry runs.
///
/// Produces a normalized vector derived from the text bytes, so equal texts
/// map to equal vectors and searches behave deterministically without a
/// model server.
#[derive(Debug, Clone)]
pub struct NoopEmbedder {
    pub dimension: usize,
}

impl NoopEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl EmbeddingModel for NoopEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, VectorStoreError>> + Send + 'a>> {
        let dimension = self.dimension;
        let mut state: u64 = 0xcbf2_9ce4_8422_2325;
        for b in text.bytes() {
            state ^= u64::from(b);
            state = state.wrapping_mul(0x0000_0100_0000_01b3);
        }
        let mut vector = Vec::with_capacity(dimension);
        for i in 0..dimension {
            let mixed = state
                .wrapping_add(i as u64)
                .wrapping_mul(0x9e37_79b9_7f4a_7c15);
            vector.push(((mixed >> 33) as f32 / u32::MAX as f32) - 0.5);
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Box::pin(async move { Ok(vector) })
    }
}
