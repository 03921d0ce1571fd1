//! The in-process index store.
//!
//! Shared state lives behind one `tokio::sync::RwLock`; each repository's
//! readable generation is an immutable `Arc<Generation>`. The atomic swap in
//! [`IndexStore::replace_all_for_repo`] replaces that `Arc` inside a single
//! write-lock section, so a reader that cloned the handle keeps a consistent
//! snapshot and new readers see the full next generation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::errors::{IndexStoreError, IndexStoreResult};
use crate::trigram::{SIMILARITY_THRESHOLD, set_similarity, trigrams};
use crate::types::{
    Generation, GenerationPayload, Lease, RepoId, RepoStatus, Repository, RouteFilter, SymbolHit,
};
use laravel_indexer::{Route, Symbol};

#[derive(Debug)]
struct RepoState {
    repo: Repository,
    generation: Option<Arc<Generation>>,
    lease: Option<Lease>,
}

/// Metadata store with trigram search and atomic generation swap.
#[derive(Debug, Default)]
pub struct IndexStore {
    repos: RwLock<HashMap<RepoId, RepoState>>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a repository (idempotent) and returns its current record.
    pub async fn upsert_repo(&self, id: RepoId, default_branch: &str) -> Repository {
        let mut repos = self.repos.write().await;
        let state = repos.entry(id.clone()).or_insert_with(|| RepoState {
            repo: Repository {
                id: id.clone(),
                default_branch: default_branch.to_string(),
                last_indexed_commit: None,
                status: RepoStatus::Pending,
                last_error: None,
            },
            generation: None,
            lease: None,
        });
        state.repo.default_branch = default_branch.to_string();
        state.repo.clone()
    }

    pub async fn get_repo(&self, id: &RepoId) -> IndexStoreResult<Repository> {
        let repos = self.repos.read().await;
        repos
            .get(id)
            .map(|s| s.repo.clone())
            .ok_or_else(|| IndexStoreError::UnknownRepository(id.full_name()))
    }

    /// Marks a repository as currently indexing.
    pub async fn mark_indexing(&self, id: &RepoId) -> IndexStoreResult<()> {
        self.with_repo_mut(id, |state| {
            state.repo.status = RepoStatus::Indexing;
        })
        .await
    }

    /// Records a failed indexing run. The readable generation is untouched.
    pub async fn mark_failed(&self, id: &RepoId, error: &str) -> IndexStoreResult<()> {
        self.with_repo_mut(id, |state| {
            state.repo.status = RepoStatus::Failed;
            state.repo.last_error = Some(error.to_string());
        })
        .await
    }

    /// Acquires the per-repository indexing lease.
    ///
    /// At most one run holds the lease; a second acquisition fails with
    /// [`IndexStoreError::LeaseHeld`] until the holder releases it.
    pub async fn acquire_lease(&self, id: &RepoId, commit: &str) -> IndexStoreResult<()> {
        let mut repos = self.repos.write().await;
        let state = repos
            .get_mut(id)
            .ok_or_else(|| IndexStoreError::UnknownRepository(id.full_name()))?;
        if let Some(lease) = &state.lease {
            return Err(IndexStoreError::LeaseHeld {
                repo: id.full_name(),
                commit: lease.commit.clone(),
            });
        }
        state.lease = Some(Lease {
            commit: commit.to_string(),
            acquired_at: Utc::now(),
        });
        debug!(repo = %id, commit, "indexing lease acquired");
        Ok(())
    }

    pub async fn release_lease(&self, id: &RepoId) -> IndexStoreResult<()> {
        self.with_repo_mut(id, |state| {
            state.lease = None;
        })
        .await
    }

    /// Atomically publishes a new generation for the repository.
    ///
    /// Validates payload invariants first; on success the repository becomes
    /// `Ready` at `commit` and the previous generation is dropped once the
    /// last reader releases its handle.
    pub async fn replace_all_for_repo(
        &self,
        id: &RepoId,
        commit: &str,
        payload: GenerationPayload,
    ) -> IndexStoreResult<()> {
        validate_payload(&payload)?;
        let generation = Arc::new(Generation {
            commit: commit.to_string(),
            payload,
        });

        let mut repos = self.repos.write().await;
        let state = repos
            .get_mut(id)
            .ok_or_else(|| IndexStoreError::UnknownRepository(id.full_name()))?;
        state.generation = Some(Arc::clone(&generation));
        state.repo.last_indexed_commit = Some(commit.to_string());
        state.repo.status = RepoStatus::Ready;
        state.repo.last_error = None;

        info!(
            repo = %id,
            commit,
            symbols = generation.payload.symbols.len(),
            routes = generation.payload.routes.len(),
            migrations = generation.payload.migrations.len(),
            "generation published"
        );
        Ok(())
    }

    /// Returns a snapshot handle of the readable generation.
    pub async fn generation(&self, id: &RepoId) -> Option<Arc<Generation>> {
        let repos = self.repos.read().await;
        repos.get(id).and_then(|s| s.generation.clone())
    }

    /// Trigram search over symbol names, with substring fallback on the
    /// symbol's search text.
    ///
    /// Ranking is `max(similarity(name), similarity(qualified_name))`
    /// descending; ties resolve by file path, then start line, then
    /// qualified name, so results are stable for a fixed generation.
    pub async fn trigram_search(&self, id: &RepoId, query: &str, limit: usize) -> Vec<SymbolHit> {
        let Some(generation) = self.generation(id).await else {
            return Vec::new();
        };
        let query_trigrams = trigrams(query);
        let query_lower = query.to_lowercase();

        let mut hits: Vec<SymbolHit> = generation
            .payload
            .symbols
            .iter()
            .filter_map(|symbol| {
                let sim = set_similarity(&query_trigrams, &trigrams(&symbol.name)).max(
                    set_similarity(&query_trigrams, &trigrams(&symbol.qualified_name)),
                );
                let substring = !query_lower.is_empty()
                    && symbol.search_text().to_lowercase().contains(&query_lower);
                if sim < SIMILARITY_THRESHOLD && !substring {
                    return None;
                }
                let score = if substring { sim.max(0.5) } else { sim };
                Some(SymbolHit {
                    symbol: symbol.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.symbol.file_path.cmp(&b.symbol.file_path))
                .then_with(|| a.symbol.start_line.cmp(&b.symbol.start_line))
                .then_with(|| a.symbol.qualified_name.cmp(&b.symbol.qualified_name))
        });
        hits.truncate(limit);
        debug!(repo = %id, query, hits = hits.len(), "trigram search");
        hits
    }

    /// Exact lookup by qualified name.
    pub async fn lookup_symbol_by_name(&self, id: &RepoId, fq_name: &str) -> Option<Symbol> {
        let generation = self.generation(id).await?;
        generation
            .payload
            .symbols
            .iter()
            .find(|s| s.qualified_name == fq_name)
            .cloned()
    }

    /// Lists routes matching the filter, in definition order.
    pub async fn list_routes(&self, id: &RepoId, filter: &RouteFilter) -> Vec<Route> {
        let Some(generation) = self.generation(id).await else {
            return Vec::new();
        };
        generation
            .payload
            .routes
            .iter()
            .filter(|r| filter.method.is_none_or(|m| r.method == m))
            .filter(|r| {
                filter
                    .uri_contains
                    .as_deref()
                    .is_none_or(|needle| r.full_uri.contains(needle))
            })
            .cloned()
            .collect()
    }

    async fn with_repo_mut(
        &self,
        id: &RepoId,
        f: impl FnOnce(&mut RepoState),
    ) -> IndexStoreResult<()> {
        let mut repos = self.repos.write().await;
        let state = repos
            .get_mut(id)
            .ok_or_else(|| IndexStoreError::UnknownRepository(id.full_name()))?;
        f(state);
        Ok(())
    }
}

fn validate_payload(payload: &GenerationPayload) -> IndexStoreResult<()> {
    for symbol in &payload.symbols {
        if symbol.start_line > symbol.end_line {
            return Err(IndexStoreError::Integrity(format!(
                "symbol {} has inverted span {}..{}",
                symbol.qualified_name, symbol.start_line, symbol.end_line
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use laravel_indexer::{SymbolKind, Visibility};

    fn symbol(name: &str, qualified: &str, file: &str, start: u32) -> Symbol {
        Symbol {
            name: name.to_string(),
            qualified_name: qualified.to_string(),
            kind: SymbolKind::Class,
            file_path: file.to_string(),
            start_line: start,
            end_line: start + 10,
            signature: None,
            docstring: None,
            parent: None,
            visibility: Some(Visibility::Public),
            is_static: false,
        }
    }

    fn payload(symbols: Vec<Symbol>) -> GenerationPayload {
        GenerationPayload {
            symbols,
            ..Default::default()
        }
    }

    async fn ready_store(symbols: Vec<Symbol>) -> (IndexStore, RepoId) {
        let store = IndexStore::new();
        let id = RepoId::new("acme", "shop");
        store.upsert_repo(id.clone(), "main").await;
        store
            .replace_all_for_repo(&id, &"a".repeat(40), payload(symbols))
            .await
            .unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn publish_makes_repo_ready() {
        let (store, id) = ready_store(vec![]).await;
        let repo = store.get_repo(&id).await.unwrap();
        assert_eq!(repo.status, RepoStatus::Ready);
        assert_eq!(repo.last_indexed_commit.as_deref(), Some(&*"a".repeat(40)));
    }

    #[tokio::test]
    async fn swap_is_atomic_for_held_snapshots() {
        let (store, id) = ready_store(vec![symbol(
            "Old",
            "App\\Old",
            "app/Old.php",
            1,
        )])
        .await;

        let before = store.generation(&id).await.unwrap();
        assert_eq!(before.payload.symbols.len(), 1);

        let next = payload(vec![
            symbol("NewA", "App\\NewA", "app/NewA.php", 1),
            symbol("NewB", "App\\NewB", "app/NewB.php", 1),
        ]);
        store
            .replace_all_for_repo(&id, &"b".repeat(40), next)
            .await
            .unwrap();

        // The held snapshot still shows the entire old generation.
        assert_eq!(before.payload.symbols.len(), 1);
        assert_eq!(before.payload.symbols[0].name, "Old");
        // New readers observe the entire new generation.
        let after = store.generation(&id).await.unwrap();
        assert_eq!(after.payload.symbols.len(), 2);
    }

    #[tokio::test]
    async fn invalid_payload_preserves_previous_generation() {
        let (store, id) = ready_store(vec![symbol("Ok", "App\\Ok", "app/Ok.php", 1)]).await;

        let mut bad = symbol("Bad", "App\\Bad", "app/Bad.php", 10);
        bad.end_line = 5;
        let err = store
            .replace_all_for_repo(&id, &"c".repeat(40), payload(vec![bad]))
            .await
            .unwrap_err();
        assert!(matches!(err, IndexStoreError::Integrity(_)));

        let generation = store.generation(&id).await.unwrap();
        assert_eq!(generation.payload.symbols[0].name, "Ok");
    }

    #[tokio::test]
    async fn republishing_same_commit_is_idempotent() {
        let symbols = vec![symbol("A", "App\\A", "app/A.php", 1)];
        let (store, id) = ready_store(symbols.clone()).await;
        let first = store.generation(&id).await.unwrap();
        store
            .replace_all_for_repo(&id, &"a".repeat(40), payload(symbols))
            .await
            .unwrap();
        let second = store.generation(&id).await.unwrap();
        assert_eq!(*first, *second);
    }

    #[tokio::test]
    async fn trigram_search_ranks_and_breaks_ties_deterministically() {
        let (store, id) = ready_store(vec![
            symbol("EnsureUserIsActive", "App\\EnsureUserIsActive", "app/E.php", 1),
            symbol("Authenticate", "App\\Authenticate", "app/b/Auth.php", 5),
            symbol("Authenticate", "App\\Auth2\\Authenticate", "app/a/Auth.php", 5),
            symbol("Unrelated", "App\\Unrelated", "app/U.php", 1),
        ])
        .await;

        let hits = store.trigram_search(&id, "authenticate", 10).await;
        assert!(hits.len() >= 2);
        assert_eq!(hits[0].symbol.name, "Authenticate");
        // Equal scores: the lexicographically smaller file path comes first.
        assert_eq!(hits[0].symbol.file_path, "app/a/Auth.php");
        assert_eq!(hits[1].symbol.file_path, "app/b/Auth.php");
        assert!(hits.iter().all(|h| h.symbol.name != "Unrelated"));

        // Determinism: same query, same ordering.
        let again = store.trigram_search(&id, "authenticate", 10).await;
        let files: Vec<_> = again.iter().map(|h| h.symbol.file_path.clone()).collect();
        assert_eq!(
            files,
            hits.iter()
                .map(|h| h.symbol.file_path.clone())
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn substring_match_on_search_text_scores_at_least_half() {
        let mut s = symbol("Kernel", "App\\Http\\Kernel", "app/Kernel.php", 1);
        s.docstring = Some("Registers the middleware stack".to_string());
        let (store, id) = ready_store(vec![s]).await;

        let hits = store.trigram_search(&id, "middleware stack", 10).await;
        assert_eq!(hits.len(), 1);
        assert!(hits[0].score >= 0.5);
    }

    #[tokio::test]
    async fn lease_serializes_runs() {
        let store = IndexStore::new();
        let id = RepoId::new("acme", "shop");
        store.upsert_repo(id.clone(), "main").await;

        store.acquire_lease(&id, "abc").await.unwrap();
        let err = store.acquire_lease(&id, "def").await.unwrap_err();
        assert!(matches!(err, IndexStoreError::LeaseHeld { .. }));

        store.release_lease(&id).await.unwrap();
        store.acquire_lease(&id, "def").await.unwrap();
    }

    #[tokio::test]
    async fn failed_run_keeps_generation_and_records_error() {
        let (store, id) = ready_store(vec![symbol("A", "App\\A", "app/A.php", 1)]).await;
        store.mark_failed(&id, "provider timeout").await.unwrap();
        let repo = store.get_repo(&id).await.unwrap();
        assert_eq!(repo.status, RepoStatus::Failed);
        assert_eq!(repo.last_error.as_deref(), Some("provider timeout"));
        assert!(store.generation(&id).await.is_some());
    }

    #[tokio::test]
    async fn list_routes_applies_filters() {
        use laravel_indexer::{HandlerType, HttpMethod};
        let store = IndexStore::new();
        let id = RepoId::new("acme", "shop");
        store.upsert_repo(id.clone(), "main").await;
        let route = |method: HttpMethod, uri: &str| Route {
            method,
            uri: uri.to_string(),
            full_uri: uri.to_string(),
            name: None,
            handler_type: HandlerType::Closure,
            controller: None,
            action: None,
            middleware: vec![],
            source_file: "routes/api.php".to_string(),
            start_line: 1,
        };
        let mut p = GenerationPayload::default();
        p.routes = vec![
            route(HttpMethod::Get, "/api/posts"),
            route(HttpMethod::Delete, "/api/posts/{id}"),
            route(HttpMethod::Get, "/health"),
        ];
        store
            .replace_all_for_repo(&id, &"d".repeat(40), p)
            .await
            .unwrap();

        let gets = store
            .list_routes(
                &id,
                &RouteFilter {
                    method: Some(HttpMethod::Get),
                    uri_contains: None,
                },
            )
            .await;
        assert_eq!(gets.len(), 2);

        let posts = store
            .list_routes(
                &id,
                &RouteFilter {
                    method: None,
                    uri_contains: Some("/api/posts".to_string()),
                },
            )
            .await;
        assert_eq!(posts.len(), 2);
    }
}
