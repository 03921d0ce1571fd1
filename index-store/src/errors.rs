//! Error type for index-store operations.

use thiserror::Error;

pub type IndexStoreResult<T> = Result<T, IndexStoreError>;

#[derive(Debug, Error)]
pub enum IndexStoreError {
    /// The repository was never registered.
    #[error("unknown repository: {0}")]
    UnknownRepository(String),

    /// Another indexing run currently holds the lease for this repository.
    #[error("indexing lease already held for {repo} at {commit}")]
    LeaseHeld { repo: String, commit: String },

    /// The generation payload violates a store invariant; the previous
    /// generation stays visible.
    #[error("integrity error: {0}")]
    Integrity(String),
}
