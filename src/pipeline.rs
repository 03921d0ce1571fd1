//! The indexing pipeline.
//!
//! For a `(repo, commit)` pair: take the per-repo lease, enumerate files
//! honoring the skiplist, extract symbols/routes/migrations on a blocking
//! worker, embed symbol chunks, and publish everything as one atomic
//! generation. Any failure marks the run failed and leaves the previously
//! readable generation untouched.

use std::sync::Arc;

use futures::{StreamExt, TryStreamExt};
use git_source::{RepoRef, SourceClient};
use index_store::{FileRecord, GenerationPayload, IndexStore, RepoId};
use laravel_indexer::extract_file;
use risk_analyzer::DEFAULT_SKIP_PATHS;
use serde::Serialize;
use tracing::{debug, info, warn};
use vector_store::{EmbeddingModel, EmbeddingRecord, VectorStore, chunk_symbol};

use crate::metering::{MeterEventKind, MeteringSink, UsageEvent};

/// Embedding backend pair; absent in metadata-only deployments.
pub struct VectorBackend {
    pub store: Arc<VectorStore>,
    pub embedder: Arc<dyn EmbeddingModel>,
}

/// Per-run accounting surfaced to callers and the metering sink.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexStats {
    pub files_seen: usize,
    pub files_parsed: usize,
    pub files_skipped: usize,
    pub symbols: usize,
    pub routes: usize,
    pub migrations: usize,
    pub parse_errors: usize,
    pub chunks_embedded: usize,
    pub embedding_tokens: u64,
}

/// Pipeline error: the failure is recorded on the repository record, the
/// previous generation stays readable.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("index store: {0}")]
    Store(#[from] index_store::IndexStoreError),

    #[error("provider: {0}")]
    Provider(#[from] git_source::ProviderError),

    #[error("extractor: {0}")]
    Extractor(#[from] laravel_indexer::IndexerError),

    #[error("vector store: {0}")]
    Vector(#[from] vector_store::VectorStoreError),

    #[error("parser worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// The indexing pipeline over a source provider and the two stores.
pub struct IndexingPipeline {
    store: Arc<IndexStore>,
    provider: Arc<SourceClient>,
    vectors: Option<VectorBackend>,
    metering: Arc<dyn MeteringSink>,
    skip_paths: Vec<String>,
}

impl IndexingPipeline {
    pub fn new(
        store: Arc<IndexStore>,
        provider: Arc<SourceClient>,
        vectors: Option<VectorBackend>,
        metering: Arc<dyn MeteringSink>,
    ) -> Self {
        Self {
            store,
            provider,
            vectors,
            metering,
            skip_paths: DEFAULT_SKIP_PATHS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Indexes one repository at one commit. Idempotent: re-running for the
    /// same commit publishes an equal generation.
    ///
    /// # Errors
    /// Lease conflicts, provider failures and store integrity violations
    /// fail the run; the repository status transitions to `failed` with the
    /// error preserved, and the prior generation remains visible.
    pub async fn index_repository(
        &self,
        repo: &RepoId,
        commit: &str,
    ) -> Result<IndexStats, PipelineError> {
        self.store.upsert_repo(repo.clone(), "main").await;
        self.store.acquire_lease(repo, commit).await?;
        self.store.mark_indexing(repo).await?;
        info!(repo = %repo, commit, "indexing started");

        let result = self.run(repo, commit).await;
        self.store.release_lease(repo).await?;

        match result {
            Ok(stats) => {
                info!(repo = %repo, commit, ?stats, "indexing finished");
                self.metering.record(
                    UsageEvent::new(MeterEventKind::Indexed)
                        .tokens(0, 0, stats.embedding_tokens)
                        .metadata(serde_json::json!({
                            "repo": repo.full_name(),
                            "commit": commit,
                            "files": stats.files_parsed,
                            "symbols": stats.symbols,
                        })),
                );
                Ok(stats)
            }
            Err(e) => {
                warn!(repo = %repo, commit, error = %e, "indexing failed");
                self.store.mark_failed(repo, &e.to_string()).await?;
                Err(e)
            }
        }
    }

    async fn run(&self, repo: &RepoId, commit: &str) -> Result<IndexStats, PipelineError> {
        let repo_ref = RepoRef::new(repo.owner.clone(), repo.name.clone());
        let entries = self.provider.list_files(&repo_ref, commit).await?;

        let mut stats = IndexStats {
            files_seen: entries.len(),
            ..Default::default()
        };
        let mut payload = GenerationPayload::default();

        for entry in entries {
            if self.is_skipped(&entry.path) {
                stats.files_skipped += 1;
                continue;
            }
            payload.upsert_file(FileRecord {
                path: entry.path.clone(),
                blob_sha: entry.blob_sha.clone(),
                language: language_of(&entry.path).to_string(),
                size_bytes: entry.size_bytes,
            });
            if !entry.path.ends_with(".php") {
                continue;
            }

            let content = self
                .provider
                .get_file(&repo_ref, commit, &entry.path)
                .await?;
            let path = entry.path.clone();
            let extraction =
                tokio::task::spawn_blocking(move || extract_file(&path, &content)).await??;

            stats.files_parsed += 1;
            if let Some(err) = &extraction.parse_error {
                debug!(file = %err.file_path, line = err.line, "parse error recorded");
                stats.parse_errors += 1;
            }
            for symbol in extraction.symbols {
                payload.upsert_symbol(symbol);
            }
            for route in extraction.routes {
                payload.upsert_route(route);
            }
            if let Some(migration) = extraction.migration {
                payload.upsert_migration(migration);
            }
            payload.parse_errors.extend(extraction.parse_error);
        }

        stats.symbols = payload.symbols.len();
        stats.routes = payload.routes.len();
        stats.migrations = payload.migrations.len();

        if let Some(backend) = &self.vectors {
            let (embedded, tokens) = self
                .embed_symbols(backend, &repo.full_name(), &payload)
                .await?;
            stats.chunks_embedded = embedded;
            stats.embedding_tokens = tokens;
        } else {
            debug!(repo = %repo, "no vector backend configured, metadata-only run");
        }

        self.store.replace_all_for_repo(repo, commit, payload).await?;
        Ok(stats)
    }

    /// Chunks every symbol and upserts the embedded batch.
    async fn embed_symbols(
        &self,
        backend: &VectorBackend,
        repo: &str,
        payload: &GenerationPayload,
    ) -> Result<(usize, u64), PipelineError> {
        let chunks: Vec<_> = payload.symbols.iter().flat_map(chunk_symbol).collect();
        let tokens: u64 = chunks
            .iter()
            .map(|c| llm_service::estimate_tokens(&c.text) as u64)
            .sum();

        let records: Vec<EmbeddingRecord> = futures::stream::iter(chunks)
            .map(|chunk| {
                let embedder = backend.embedder.clone();
                async move {
                    let vector = embedder.embed(&chunk.text).await?;
                    Ok::<_, vector_store::VectorStoreError>(EmbeddingRecord { chunk, vector })
                }
            })
            .buffered(4)
            .try_collect()
            .await?;

        let count = backend.store.upsert_vectors(repo, records).await?;
        Ok((count, tokens))
    }

    fn is_skipped(&self, path: &str) -> bool {
        let lower = format!("/{}", path.to_lowercase());
        self.skip_paths.iter().any(|frag| lower.contains(frag))
    }
}

/// Coarse language tag for file records, by extension.
fn language_of(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or_default() {
        "php" => "php",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "json" => "json",
        "lock" => "lockfile",
        "md" => "markdown",
        _ => "other",
    }
}
