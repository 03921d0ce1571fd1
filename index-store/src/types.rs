//! Store-side entities: repositories, files, generations, search hits.

use chrono::{DateTime, Utc};
use laravel_indexer::{Migration, ParseErrorRecord, Route, Symbol};
use serde::{Deserialize, Serialize};

/// Repository identity, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
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

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Repository lifecycle status, mutated only by the indexing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoStatus {
    Pending,
    Indexing,
    Ready,
    Failed,
}

/// Repository record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepoId,
    pub default_branch: String,
    /// 40-hex commit of the readable generation, set when status is `Ready`.
    pub last_indexed_commit: Option<String>,
    pub status: RepoStatus,
    /// Error text preserved from the last failed indexing run.
    pub last_error: Option<String>,
}

/// Per-file metadata refreshed each indexing run. No content is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub blob_sha: String,
    pub language: String,
    pub size_bytes: u64,
}

/// Everything one indexing run writes for a repository.
///
/// Replaced atomically: readers observe either the whole previous payload or
/// the whole next one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationPayload {
    pub files: Vec<FileRecord>,
    pub symbols: Vec<Symbol>,
    pub routes: Vec<Route>,
    pub migrations: Vec<Migration>,
    pub parse_errors: Vec<ParseErrorRecord>,
}

impl GenerationPayload {
    /// Upserts a file record, keyed by path.
    pub fn upsert_file(&mut self, file: FileRecord) {
        match self.files.iter_mut().find(|f| f.path == file.path) {
            Some(existing) => *existing = file,
            None => self.files.push(file),
        }
    }

    /// Upserts a symbol, keyed by `(file, qualified_name, start_line)`.
    pub fn upsert_symbol(&mut self, symbol: Symbol) {
        let key = |s: &Symbol| {
            (
                s.file_path.clone(),
                s.qualified_name.clone(),
                s.start_line,
            )
        };
        match self.symbols.iter_mut().find(|s| key(s) == key(&symbol)) {
            Some(existing) => *existing = symbol,
            None => self.symbols.push(symbol),
        }
    }

    /// Upserts a route, keyed by `(method, full_uri, source_file)`.
    pub fn upsert_route(&mut self, route: Route) {
        match self.routes.iter_mut().find(|r| {
            r.method == route.method
                && r.full_uri == route.full_uri
                && r.source_file == route.source_file
        }) {
            Some(existing) => *existing = route,
            None => self.routes.push(route),
        }
    }

    /// Upserts a migration, keyed by file path.
    pub fn upsert_migration(&mut self, migration: Migration) {
        match self
            .migrations
            .iter_mut()
            .find(|m| m.file_path == migration.file_path)
        {
            Some(existing) => *existing = migration,
            None => self.migrations.push(migration),
        }
    }
}

/// A published generation: payload plus the commit it is valid for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub commit: String,
    pub payload: GenerationPayload,
}

/// A trigram search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolHit {
    pub symbol: Symbol,
    pub score: f32,
}

/// Filter for `list_routes`.
#[derive(Debug, Clone, Default)]
pub struct RouteFilter {
    pub method: Option<laravel_indexer::HttpMethod>,
    pub uri_contains: Option<String>,
}

/// Indexing lease serializing runs per repository.
#[derive(Debug, Clone, PartialEq)]
pub struct Lease {
    pub commit: String,
    pub acquired_at: DateTime<Utc>,
}
