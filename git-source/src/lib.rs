//! Source providers behind one enum-dispatch client.
//!
//! No async-trait, no boxed futures: `SourceClient` is an enum with plain
//! `async fn`s, one variant per backend. GitHub serves hosted repositories
//! and pull-request diffs; the local provider serves a checkout directory
//! for clone-based indexing and tests. All error text is scrubbed of
//! credentials before it can surface.

pub mod errors;
pub mod github;
pub mod local;
pub mod sanitize;
pub mod types;

pub use errors::{ProviderError, ProviderResult};
pub use github::GitHubClient;
pub use local::LocalRepo;
pub use sanitize::{clone_url, scrub};
pub use types::{ChangedFile, FileEntry, FileStatus, PrDiff, RepoRef};

use tracing::debug;

/// Runtime configuration for the GitHub client.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API base, e.g. "https://api.github.com".
    pub base_api: String,
    /// Access token (PAT or app installation token).
    pub token: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl GitHubConfig {
    pub fn from_env() -> Self {
        Self {
            base_api: std::env::var("GITHUB_API")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            token: std::env::var("GITHUB_TOKEN").unwrap_or_default(),
            timeout_secs: std::env::var("PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}

/// Concrete source provider (enum-dispatch).
#[derive(Debug, Clone)]
pub enum SourceClient {
    GitHub(GitHubClient),
    Local(LocalRepo),
}

impl SourceClient {
    /// Constructs a GitHub-backed client.
    pub fn github(cfg: GitHubConfig) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent("repolens/0.1")
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .build()?;
        debug!(base = %cfg.base_api, "github provider ready");
        Ok(Self::GitHub(GitHubClient::new(
            client,
            cfg.base_api,
            cfg.token,
        )))
    }

    /// Wraps a checkout directory.
    pub fn local(root: impl Into<std::path::PathBuf>) -> Self {
        Self::Local(LocalRepo::new(root))
    }

    /// Enumerates files at a commit.
    ///
    /// The local provider serves whatever is checked out; `commit` is the
    /// caller's bookkeeping there.
    pub async fn list_files(
        &self,
        repo: &RepoRef,
        commit: &str,
    ) -> ProviderResult<Vec<FileEntry>> {
        match self {
            Self::GitHub(c) => c.list_files(repo, commit).await,
            Self::Local(c) => c.list_files(),
        }
    }

    /// Fetches one file's text at a commit.
    pub async fn get_file(
        &self,
        repo: &RepoRef,
        commit: &str,
        path: &str,
    ) -> ProviderResult<String> {
        match self {
            Self::GitHub(c) => c.get_file(repo, commit, path).await,
            Self::Local(c) => {
                let _ = commit;
                c.get_file(path).await
            }
        }
    }

    /// Fetches a pull request's diff (changed files with patches).
    pub async fn get_diff(&self, repo: &RepoRef, pr_number: u64) -> ProviderResult<PrDiff> {
        match self {
            Self::GitHub(c) => c.get_diff(repo, pr_number).await,
            Self::Local(_) => Err(ProviderError::Unsupported),
        }
    }
}
