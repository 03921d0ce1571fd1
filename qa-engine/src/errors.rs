//! Typed errors for the Q&A engine.

use thiserror::Error;

pub type QaResult<T> = Result<T, QaError>;

#[derive(Debug, Error)]
pub enum QaError {
    /// Source provider failure (snippet fetch, file content).
    #[error("provider error: {0}")]
    Provider(#[from] git_source::ProviderError),

    /// Index store failure (unknown repository, lease conflicts).
    #[error("index error: {0}")]
    Index(#[from] index_store::IndexStoreError),

    /// Embedding/vector store failure.
    #[error("vector error: {0}")]
    Vector(#[from] vector_store::VectorStoreError),

    /// LLM transport or decode failure.
    #[error("llm error: {0}")]
    Llm(#[from] llm_service::LlmError),

    /// A stage exceeded its configured deadline.
    #[error("timeout in {stage} after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },
}
