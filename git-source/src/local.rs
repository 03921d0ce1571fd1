//! Local checkout provider.
//!
//! Serves a repository from a directory on disk (a clone checked out at the
//! commit being indexed). Used by clone-based indexing and by tests; diffs
//! are a hosted-provider concern and are not supported here.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::{ProviderError, ProviderResult};
use crate::types::FileEntry;

#[derive(Debug, Clone)]
pub struct LocalRepo {
    root: PathBuf,
}

impl LocalRepo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walks the checkout and returns all regular files, `.git` excluded,
    /// sorted by path for determinism.
    pub fn list_files(&self) -> ProviderResult<Vec<FileEntry>> {
        let mut out = Vec::new();
        for entry in WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git")
        {
            let entry = entry.map_err(|e| {
                ProviderError::invalid_response(format!("walk failed: {e}"))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| ProviderError::invalid_response(e.to_string()))?
                .to_string_lossy()
                .replace('\\', "/");
            let bytes = std::fs::read(entry.path())?;
            out.push(FileEntry {
                path: rel,
                blob_sha: blob_sha(&bytes),
                size_bytes: bytes.len() as u64,
            });
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(root = %self.root.display(), files = out.len(), "local tree listed");
        Ok(out)
    }

    /// Reads one file relative to the checkout root.
    pub async fn get_file(&self, path: &str) -> ProviderResult<String> {
        let full = self.root.join(path);
        if !full.starts_with(&self.root) {
            return Err(ProviderError::NotFound);
        }
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ProviderError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

/// Git-style blob id: SHA over `blob {len}\0{content}`.
fn blob_sha(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("blob {}\0", bytes.len()).as_bytes());
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
