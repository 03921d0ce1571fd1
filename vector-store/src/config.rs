//! Runtime and collection configuration.

use crate::errors::VectorStoreError;

/// Configuration for embedding ingestion and retrieval.
#[derive(Clone, Debug)]
pub struct VectorConfig {
    /// Qdrant endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Fixed embedding dimension for this deployment.
    pub dimension: usize,
    /// Upsert batch size (typical range: 128..512).
    pub upsert_batch: usize,
    /// Exact search flag (false = HNSW ANN).
    pub exact_search: bool,
}

impl VectorConfig {
    /// Sane defaults for a given endpoint and collection.
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            qdrant_url: url.into(),
            qdrant_api_key: None,
            collection: collection.into(),
            dimension: 768,
            upsert_batch: 256,
            exact_search: false,
        }
    }

    /// Environment-driven construction with defaults.
    pub fn from_env() -> Self {
        Self {
            qdrant_url: env_or("QDRANT_URL", "http://127.0.0.1:6334"),
            qdrant_api_key: std::env::var("QDRANT_API_KEY").ok(),
            collection: env_or("QDRANT_COLLECTION", "repolens_chunks"),
            dimension: parse_or("EMBEDDING_DIM", 768),
            upsert_batch: parse_or("QDRANT_BATCH_SIZE", 256),
            exact_search: env_or("QDRANT_EXACT_SEARCH", "false") == "true",
        }
    }

    pub fn validate(&self) -> Result<(), VectorStoreError> {
        if self.qdrant_url.trim().is_empty() {
            return Err(VectorStoreError::Config("qdrant_url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(VectorStoreError::Config("collection is empty".into()));
        }
        if self.dimension == 0 {
            return Err(VectorStoreError::Config("dimension must be > 0".into()));
        }
        if self.upsert_batch == 0 {
            return Err(VectorStoreError::Config("upsert_batch must be > 0".into()));
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
