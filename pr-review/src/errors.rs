//! Error type for the review orchestrator.

use thiserror::Error;

pub type ReviewResult<T> = Result<T, ReviewError>;

#[derive(Debug, Error)]
pub enum ReviewError {
    /// Diff or content fetch failed at the provider layer.
    #[error("provider error: {0}")]
    Provider(#[from] git_source::ProviderError),

    /// Phrasing pass infrastructure failure.
    #[error("qa error: {0}")]
    Qa(#[from] qa_engine::QaError),
}
