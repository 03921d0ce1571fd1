//! Hybrid retrieval: trigram + vector legs, merged and hydrated.
//!
//! The two legs run concurrently under their own deadline; results merge by
//! `(file, start_line)` keeping the better score. Ordering is fully
//! deterministic for a fixed `(repo, commit, query)`: score descending,
//! then file path, then start line.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use index_store::{IndexStore, RepoId, SymbolHit};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, trace};
use vector_store::{EmbeddingModel, VectorHit, VectorStore};

use crate::config::QaConfig;
use crate::errors::{QaError, QaResult};
use crate::keywords::extract_keywords;
use crate::snippet::SnippetFetcher;

/// Which leg produced a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Trigram,
    Vector,
    Both,
}

/// One numbered, hydrated source handed to the answerer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedSource {
    /// 1-based index used as the citation id downstream.
    pub source_index: usize,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    /// Literal snippet text, or a `[Could not fetch: ...]` placeholder.
    pub content: String,
    pub symbol_name: Option<String>,
    pub score: f32,
    pub source_type: SourceType,
}

/// Hybrid retriever over the index store and the vector store.
pub struct Retriever {
    index: Arc<IndexStore>,
    vectors: Arc<VectorStore>,
    embedder: Arc<dyn EmbeddingModel>,
    cfg: QaConfig,
}

impl Retriever {
    pub fn new(
        index: Arc<IndexStore>,
        vectors: Arc<VectorStore>,
        embedder: Arc<dyn EmbeddingModel>,
        cfg: QaConfig,
    ) -> Self {
        Self {
            index,
            vectors,
            embedder,
            cfg,
        }
    }

    /// Runs both legs, merges, ranks, numbers, and hydrates sources.
    pub async fn retrieve(
        &self,
        repo: &RepoId,
        commit: &str,
        query: &str,
        snippets: &SnippetFetcher,
    ) -> QaResult<Vec<RetrievedSource>> {
        let keywords = extract_keywords(query);
        let leg_deadline = Duration::from_secs(self.cfg.retriever_timeout_secs);

        let trigram_leg = async {
            if keywords.is_empty() {
                return Ok(Vec::new());
            }
            Ok::<_, QaError>(
                self.index
                    .trigram_search(repo, &keywords.join(" "), self.cfg.trigram_k)
                    .await,
            )
        };
        let vector_leg = async {
            let vector = self.embedder.embed(query).await?;
            let hits = self
                .vectors
                .search(&repo.full_name(), vector, self.cfg.vector_k)
                .await?;
            Ok::<_, QaError>(hits)
        };

        let (trigram, vector) = tokio::join!(
            timeout(leg_deadline, trigram_leg),
            timeout(leg_deadline, vector_leg),
        );
        let trigram = trigram.map_err(|_| QaError::Timeout {
            stage: "trigram search",
            secs: self.cfg.retriever_timeout_secs,
        })??;
        let vector = vector.map_err(|_| QaError::Timeout {
            stage: "vector search",
            secs: self.cfg.retriever_timeout_secs,
        })??;

        trace!(
            trigram = trigram.len(),
            vector = vector.len(),
            "retrieval legs done"
        );

        let mut sources = merge_hits(trigram, vector, self.cfg.final_k);
        self.hydrate(repo, commit, &mut sources, snippets).await;

        debug!(repo = %repo, query, sources = sources.len(), "retrieval complete");
        Ok(sources)
    }

    /// Fills `content` for every source. Provider failures become visible
    /// placeholders rather than silently dropped slots.
    async fn hydrate(
        &self,
        repo: &RepoId,
        commit: &str,
        sources: &mut [RetrievedSource],
        snippets: &SnippetFetcher,
    ) {
        let repo_ref = git_source::RepoRef::new(repo.owner.clone(), repo.name.clone());
        for source in sources.iter_mut() {
            let fetched = timeout(
                Duration::from_secs(self.cfg.provider_timeout_secs),
                snippets.fetch(
                    &repo_ref,
                    commit,
                    &source.file_path,
                    source.start_line,
                    source.end_line,
                ),
            )
            .await;
            source.content = match fetched {
                Ok(Ok(text)) => text,
                Ok(Err(e)) => format!("[Could not fetch: {e}]"),
                Err(_) => "[Could not fetch: timeout]".to_string(),
            };
        }
    }
}

/// Merges the two legs by `(file, start_line)`, keeping the max score, and
/// numbers the top `final_k` results from 1.
pub fn merge_hits(
    trigram: Vec<SymbolHit>,
    vector: Vec<VectorHit>,
    final_k: usize,
) -> Vec<RetrievedSource> {
    let mut merged: HashMap<(String, u32), RetrievedSource> = HashMap::new();

    for hit in trigram {
        let key = (hit.symbol.file_path.clone(), hit.symbol.start_line);
        merged.insert(
            key,
            RetrievedSource {
                source_index: 0,
                file_path: hit.symbol.file_path.clone(),
                start_line: hit.symbol.start_line,
                end_line: hit.symbol.end_line,
                content: String::new(),
                symbol_name: Some(hit.symbol.qualified_name.clone()),
                score: hit.score,
                source_type: SourceType::Trigram,
            },
        );
    }

    for hit in vector {
        let key = (hit.file_path.clone(), hit.start_line);
        match merged.get_mut(&key) {
            Some(existing) => {
                existing.score = existing.score.max(hit.score);
                existing.source_type = SourceType::Both;
                if existing.symbol_name.is_none() {
                    existing.symbol_name = hit.symbol_name;
                }
            }
            None => {
                merged.insert(
                    key,
                    RetrievedSource {
                        source_index: 0,
                        file_path: hit.file_path,
                        start_line: hit.start_line,
                        end_line: hit.end_line,
                        content: String::new(),
                        symbol_name: hit.symbol_name,
                        score: hit.score,
                        source_type: SourceType::Vector,
                    },
                );
            }
        }
    }

    let mut sources: Vec<RetrievedSource> = merged.into_values().collect();
    sources.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.file_path.cmp(&b.file_path))
            .then_with(|| a.start_line.cmp(&b.start_line))
    });
    sources.truncate(final_k);
    for (i, source) in sources.iter_mut().enumerate() {
        source.source_index = i + 1;
    }
    sources
}
