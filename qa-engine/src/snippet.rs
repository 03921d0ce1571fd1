//! On-demand snippet fetching with a TTL cache.
//!
//! The cache key is the full `(repo, commit, path, start, end)` tuple; with
//! the commit in the key an entry's content can never go stale, so races
//! between writers are benign (same key, same content). Entries past their
//! TTL are never returned.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use git_source::{ProviderResult, RepoRef, SourceClient};
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// Truncation marker appended to clipped snippets.
pub const TRUNCATION_MARKER: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SnippetKey {
    repo: String,
    commit: String,
    path: String,
    start_line: u32,
    end_line: u32,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    content: String,
    cached_at: Instant,
}

/// Fetches literal source text for `(commit, path, line-range)` tuples.
pub struct SnippetFetcher {
    provider: Arc<SourceClient>,
    cache: RwLock<HashMap<SnippetKey, CacheEntry>>,
    max_chars: usize,
    ttl: Duration,
}

impl SnippetFetcher {
    pub fn new(provider: Arc<SourceClient>, max_chars: usize, ttl: Duration) -> Self {
        Self {
            provider,
            cache: RwLock::new(HashMap::new()),
            max_chars,
            ttl,
        }
    }

    /// Returns the text of `[start_line, end_line]` (1-indexed inclusive) at
    /// `commit`, bounded to `max_chars` with a `"..."` marker on truncation.
    ///
    /// Cache hits must be unexpired; expired entries trigger a fresh
    /// provider fetch.
    ///
    /// # Errors
    /// Propagates provider failures; the caller decides whether to surface
    /// them or substitute a placeholder.
    pub async fn fetch(
        &self,
        repo: &RepoRef,
        commit: &str,
        path: &str,
        start_line: u32,
        end_line: u32,
    ) -> ProviderResult<String> {
        let key = SnippetKey {
            repo: repo.full_name(),
            commit: commit.to_string(),
            path: path.to_string(),
            start_line,
            end_line,
        };

        if let Some(entry) = self.cache.read().await.get(&key) {
            if entry.cached_at.elapsed() < self.ttl {
                trace!(path, start_line, end_line, "snippet cache hit");
                return Ok(entry.content.clone());
            }
        }

        let content = self.provider.get_file(repo, commit, path).await?;
        let snippet = slice_lines(&content, start_line, end_line, self.max_chars);

        self.cache.write().await.insert(
            key,
            CacheEntry {
                content: snippet.clone(),
                cached_at: Instant::now(),
            },
        );
        debug!(path, start_line, end_line, "snippet fetched and cached");
        Ok(snippet)
    }

    /// Drops expired entries. Callers may run this periodically; correctness
    /// does not depend on it.
    pub async fn evict_expired(&self) {
        let ttl = self.ttl;
        self.cache
            .write()
            .await
            .retain(|_, entry| entry.cached_at.elapsed() < ttl);
    }
}

/// Slices 1-indexed inclusive lines and bounds the result.
fn slice_lines(content: &str, start_line: u32, end_line: u32, max_chars: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = (start_line.max(1) as usize - 1).min(lines.len());
    let end = (end_line as usize).min(lines.len());
    let text = lines[start..end].join("\n");

    if text.chars().count() > max_chars {
        let clipped: String = text.chars().take(max_chars).collect();
        format!("{clipped}{TRUNCATION_MARKER}")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_fixture(content: &str) -> (tempfile::TempDir, Arc<SourceClient>) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("app")).unwrap();
        std::fs::write(dir.path().join("app/Service.php"), content).unwrap();
        let provider = Arc::new(SourceClient::local(dir.path()));
        (dir, provider)
    }

    fn repo() -> RepoRef {
        RepoRef::new("acme", "shop")
    }

    #[tokio::test]
    async fn slices_one_indexed_inclusive() {
        let (_dir, provider) = local_fixture("l1\nl2\nl3\nl4\n");
        let fetcher = SnippetFetcher::new(provider, 500, Duration::from_secs(3600));
        let out = fetcher
            .fetch(&repo(), "c1", "app/Service.php", 2, 3)
            .await
            .unwrap();
        assert_eq!(out, "l2\nl3");
    }

    #[tokio::test]
    async fn truncates_with_marker() {
        let long_line = "x".repeat(600);
        let (_dir, provider) = local_fixture(&long_line);
        let fetcher = SnippetFetcher::new(provider, 500, Duration::from_secs(3600));
        let out = fetcher
            .fetch(&repo(), "c1", "app/Service.php", 1, 1)
            .await
            .unwrap();
        assert_eq!(out.chars().count(), 500 + TRUNCATION_MARKER.len());
        assert!(out.ends_with(TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn cache_is_read_your_writes_and_expires() {
        let (dir, provider) = local_fixture("before\n");
        let fetcher = SnippetFetcher::new(provider, 500, Duration::from_secs(0));
        let first = fetcher
            .fetch(&repo(), "c1", "app/Service.php", 1, 1)
            .await
            .unwrap();
        assert_eq!(first, "before");

        // TTL of zero: the entry is already expired, so the next fetch must
        // hit the provider again and observe the new bytes.
        std::fs::write(dir.path().join("app/Service.php"), "after\n").unwrap();
        let second = fetcher
            .fetch(&repo(), "c1", "app/Service.php", 1, 1)
            .await
            .unwrap();
        assert_eq!(second, "after");
    }

    #[tokio::test]
    async fn unexpired_entries_are_served_from_cache() {
        let (dir, provider) = local_fixture("cached\n");
        let fetcher = SnippetFetcher::new(provider, 500, Duration::from_secs(3600));
        fetcher
            .fetch(&repo(), "c1", "app/Service.php", 1, 1)
            .await
            .unwrap();

        // Changing bytes under the same commit cannot happen for a real
        // provider; rewriting here proves the cache path is taken.
        std::fs::write(dir.path().join("app/Service.php"), "changed\n").unwrap();
        let out = fetcher
            .fetch(&repo(), "c1", "app/Service.php", 1, 1)
            .await
            .unwrap();
        assert_eq!(out, "cached");
    }

    #[tokio::test]
    async fn missing_files_propagate_not_found() {
        let (_dir, provider) = local_fixture("x\n");
        let fetcher = SnippetFetcher::new(provider, 500, Duration::from_secs(3600));
        let err = fetcher
            .fetch(&repo(), "c1", "app/Missing.php", 1, 1)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
