//! Proof-carrying Q&A over indexed repositories.
//!
//! Pipeline: question → hybrid retrieval (trigram + vectors) → snippet
//! hydration → constrained answering with citation validation. No claim
//! surfaces without a `(file, line-range, snippet)` tuple an external
//! reader could verify; a question the evidence cannot support returns the
//! typed "insufficient evidence" answer instead of prose.

pub mod answerer;
pub mod config;
pub mod errors;
pub mod keywords;
pub mod prompt;
pub mod retriever;
pub mod snippet;
pub mod validate;

pub use answerer::{
    Answer, Citation, LanguageModel, TokenUsage, answer_question, no_evidence_answer,
    phrase_finding,
};
pub use config::QaConfig;
pub use errors::{QaError, QaResult};
pub use retriever::{RetrievedSource, Retriever, SourceType, merge_hits};
pub use snippet::SnippetFetcher;
pub use validate::{AnswerSection, ConfidenceFactors, ConfidenceTier, ValidatedAnswer};

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use index_store::{IndexStore, RepoId};
use llm_service::LlmClient;
use tracing::{debug, info};
use vector_store::{EmbeddingModel, VectorStore, VectorStoreError};

/// Adapter exposing an [`LlmClient`] as the embedding backend.
pub struct LlmEmbedder(pub Arc<LlmClient>);

impl EmbeddingModel for LlmEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, VectorStoreError>> + Send + 'a>> {
        Box::pin(async move {
            self.0
                .embed(text)
                .await
                .map_err(|e| VectorStoreError::Embedding(e.to_string()))
        })
    }
}

/// Facade wiring the retriever, snippet cache and answerer together.
pub struct QaEngine {
    index: Arc<IndexStore>,
    retriever: Retriever,
    snippets: SnippetFetcher,
    model: Arc<dyn LanguageModel>,
    cfg: QaConfig,
}

impl QaEngine {
    pub fn new(
        index: Arc<IndexStore>,
        vectors: Arc<VectorStore>,
        embedder: Arc<dyn EmbeddingModel>,
        model: Arc<dyn LanguageModel>,
        provider: Arc<git_source::SourceClient>,
        cfg: QaConfig,
    ) -> Self {
        let snippets = SnippetFetcher::new(
            provider,
            cfg.snippet_max_chars,
            Duration::from_secs(cfg.snippet_ttl_secs),
        );
        let retriever = Retriever::new(index.clone(), vectors, embedder, cfg.clone());
        Self {
            index,
            retriever,
            snippets,
            model,
            cfg,
        }
    }

    /// Answers a question about an indexed repository.
    ///
    /// # Errors
    /// Fails on retrieval-layer errors (store, vectors, provider, model
    /// transport). Validation failures and missing evidence are not errors;
    /// they come back as answers with `confidence_tier = none`.
    pub async fn ask(&self, repo: &RepoId, question: &str) -> QaResult<Answer> {
        let record = self.index.get_repo(repo).await?;
        let Some(commit) = record.last_indexed_commit else {
            debug!(repo = %repo, "repository has no indexed generation");
            return Ok(no_evidence_answer(question));
        };

        let sources = self
            .retriever
            .retrieve(repo, &commit, question, &self.snippets)
            .await?;
        let answer = answer_question(self.model.as_ref(), question, &sources, &self.cfg).await?;

        info!(
            repo = %repo,
            tier = ?answer.validated.confidence_tier,
            citations = answer.citations.len(),
            "question answered"
        );
        Ok(answer)
    }
}
