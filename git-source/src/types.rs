//! Provider-agnostic data model for repositories and pull-request diffs.

use serde::{Deserialize, Serialize};

/// Repository reference, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// One tree entry at a commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub blob_sha: String,
    pub size_bytes: u64,
}

/// Change status of a file inside a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    Renamed,
}

/// One changed file of a pull request, with its unified-diff patch when the
/// provider supplies one (binary files carry none).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub path: String,
    /// Original path for renames.
    pub previous_path: Option<String>,
    pub status: FileStatus,
    pub patch: Option<String>,
}

/// The full diff of a pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrDiff {
    pub pr_number: u64,
    pub title: String,
    pub head_commit: String,
    pub base_commit: String,
    pub files: Vec<ChangedFile>,
}
