//! GitHub provider (REST v3).
//!
//! Endpoints used:
//! - GET /repos/{owner}/{repo}/git/trees/{sha}?recursive=1
//! - GET /repos/{owner}/{repo}/contents/{path}?ref={sha}  (raw media type)
//! - GET /repos/{owner}/{repo}/pulls/{number}
//! - GET /repos/{owner}/{repo}/pulls/{number}/files       ("patch" is unified diff)

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{ProviderResult, status_error};
use crate::types::{ChangedFile, FileEntry, FileStatus, PrDiff, RepoRef};

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_api: String, // "https://api.github.com"
    token: String,
}

impl GitHubClient {
    pub fn new(http: Client, base_api: String, token: String) -> Self {
        Self {
            http,
            base_api,
            token,
        }
    }

    /// Lists all blobs of the tree at `commit`, recursively.
    pub async fn list_files(
        &self,
        repo: &RepoRef,
        commit: &str,
    ) -> ProviderResult<Vec<FileEntry>> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.base_api,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name),
            commit
        );
        debug!(repo = %repo.full_name(), commit, "GET tree");
        let resp = self.get(&url).send().await?;
        let resp = ok_or_status(resp)?;
        let tree: GitHubTree = resp.json().await?;

        Ok(tree
            .tree
            .into_iter()
            .filter(|e| e.r#type == "blob")
            .map(|e| FileEntry {
                path: e.path,
                blob_sha: e.sha,
                size_bytes: e.size.unwrap_or(0),
            })
            .collect())
    }

    /// Fetches raw file content at a specific ref.
    pub async fn get_file(
        &self,
        repo: &RepoRef,
        commit: &str,
        path: &str,
    ) -> ProviderResult<String> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.base_api,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name),
            path,
            commit
        );
        debug!(repo = %repo.full_name(), path, commit, "GET contents");
        let resp = self
            .get(&url)
            .header("Accept", "application/vnd.github.raw+json")
            .send()
            .await?;
        let resp = ok_or_status(resp)?;
        let bytes = resp.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Fetches PR metadata and its changed files with patches.
    pub async fn get_diff(&self, repo: &RepoRef, pr_number: u64) -> ProviderResult<PrDiff> {
        let meta_url = format!(
            "{}/repos/{}/{}/pulls/{}",
            self.base_api,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name),
            pr_number
        );
        debug!(repo = %repo.full_name(), pr_number, "GET pull");
        let resp = self.get(&meta_url).send().await?;
        let resp = ok_or_status(resp)?;
        let pr: GitHubPull = resp.json().await?;

        let mut files = Vec::new();
        for page in 1..=10u32 {
            let files_url = format!("{meta_url}/files?per_page=100&page={page}");
            let resp = self.get(&files_url).send().await?;
            let resp = ok_or_status(resp)?;
            let batch: Vec<GitHubPullFile> = resp.json().await?;
            let done = batch.len() < 100;
            files.extend(batch);
            if done {
                break;
            }
        }

        let files = files
            .into_iter()
            .map(|f| {
                let status = match f.status.as_str() {
                    "added" => FileStatus::Added,
                    "removed" => FileStatus::Removed,
                    "renamed" => FileStatus::Renamed,
                    _ => FileStatus::Modified,
                };
                ChangedFile {
                    path: f.filename,
                    previous_path: f.previous_filename,
                    status,
                    patch: f.patch,
                }
            })
            .collect();

        Ok(PrDiff {
            pr_number,
            title: pr.title,
            head_commit: pr.head.sha,
            base_commit: pr.base.sha,
            files,
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", "2022-11-28")
    }
}

fn ok_or_status(resp: reqwest::Response) -> ProviderResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(status_error(status.as_u16()))
    }
}

/* --- GitHub response shapes (subset of fields we actually use) --- */

#[derive(Debug, Deserialize)]
struct GitHubTree {
    tree: Vec<GitHubTreeEntry>,
}

#[derive(Debug, Deserialize)]
struct GitHubTreeEntry {
    path: String,
    sha: String,
    #[serde(rename = "type")]
    r#type: String,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct GitHubPull {
    title: String,
    head: GitHubRefInfo,
    base: GitHubRefInfo,
}

#[derive(Debug, Deserialize)]
struct GitHubRefInfo {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitHubPullFile {
    filename: String,
    status: String,
    #[serde(default)]
    previous_filename: Option<String>,
    #[serde(default)]
    patch: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_file_shape_parses() {
        let raw = r#"[
            {"filename": "routes/api.php", "status": "modified",
             "patch": "@@ -1,2 +1,3 @@\n line\n+Route::get('/x', fn () => 1);"},
            {"filename": "logo.png", "status": "added"}
        ]"#;
        let files: Vec<GitHubPullFile> = serde_json::from_str(raw).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].patch.is_some());
        assert!(files[1].patch.is_none());
    }

    #[test]
    fn tree_entries_keep_blobs_only() {
        let raw = r#"{"tree": [
            {"path": "app", "sha": "a1", "type": "tree"},
            {"path": "app/User.php", "sha": "b2", "type": "blob", "size": 120}
        ]}"#;
        let tree: GitHubTree = serde_json::from_str(raw).unwrap();
        let blobs: Vec<_> = tree.tree.iter().filter(|e| e.r#type == "blob").collect();
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].path, "app/User.php");
    }
}
