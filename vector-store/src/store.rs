//! High-level embedding store: batched upsert and repo-scoped search.

use qdrant_client::Payload;
use qdrant_client::qdrant::{Condition, Filter, PointStruct};
use serde_json::json;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::chunk::Chunk;
use crate::config::VectorConfig;
use crate::errors::{VectorStoreError, VectorStoreResult};
use crate::facade::QdrantFacade;

/// One embedded chunk ready for upsert.
#[derive(Debug, Clone)]
pub struct EmbeddingRecord {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// A nearest-neighbor hit, resolved back to its chunk key.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub symbol_name: Option<String>,
    pub score: f32,
}

/// Embedding store facade wiring configuration and the Qdrant client.
pub struct VectorStore {
    cfg: VectorConfig,
    facade: QdrantFacade,
}

impl VectorStore {
    /// Constructs a store from the given configuration.
    ///
    /// # Errors
    /// Returns `VectorStoreError::Config` if client initialization fails.
    pub fn new(cfg: VectorConfig) -> VectorStoreResult<Self> {
        trace!(collection = %cfg.collection, "VectorStore::new");
        let facade = QdrantFacade::new(&cfg)?;
        Ok(Self { cfg, facade })
    }

    pub fn dimension(&self) -> usize {
        self.cfg.dimension
    }

    /// Upserts a batch of embedded chunks for a repository.
    ///
    /// Every vector must match the deployment dimension; the first mismatch
    /// rejects the whole batch before anything is written.
    pub async fn upsert_vectors(
        &self,
        repo: &str,
        batch: Vec<EmbeddingRecord>,
    ) -> VectorStoreResult<usize> {
        check_dimensions(&batch, self.cfg.dimension)?;
        self.facade.ensure_collection().await?;

        let total = batch.len();
        let points: Vec<PointStruct> = batch
            .into_iter()
            .map(|record| point_for_record(repo, record))
            .collect();

        for slice in points.chunks(self.cfg.upsert_batch) {
            self.facade.upsert_points(slice.to_vec()).await?;
        }
        debug!(repo, count = total, "vectors upserted");
        Ok(total)
    }

    /// Top-k nearest neighbors within one repository, score descending.
    pub async fn search(
        &self,
        repo: &str,
        query_vector: Vec<f32>,
        k: u64,
    ) -> VectorStoreResult<Vec<VectorHit>> {
        if query_vector.len() != self.cfg.dimension {
            return Err(VectorStoreError::DimensionMismatch {
                got: query_vector.len(),
                want: self.cfg.dimension,
            });
        }
        let filter = Filter::must([Condition::matches("repo", repo.to_string())]);
        let raw = self.facade.search(query_vector, k, Some(filter)).await?;

        let hits = raw
            .into_iter()
            .filter_map(|(score, payload)| {
                Some(VectorHit {
                    file_path: payload.get("file_path")?.as_str()?.to_string(),
                    start_line: payload.get("start_line")?.as_u64()? as u32,
                    end_line: payload.get("end_line")?.as_u64()? as u32,
                    symbol_name: payload
                        .get("symbol_name")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                    score,
                })
            })
            .collect();
        Ok(hits)
    }
}

/// Deterministic point id for a chunk key.
///
/// UUIDv5 over `repo:file:start:end` keeps re-indexing the same commit
/// idempotent: identical chunks land on identical points.
pub fn chunk_point_id(repo: &str, chunk: &Chunk) -> Uuid {
    let key = format!(
        "{repo}:{}:{}:{}",
        chunk.file_path, chunk.start_line, chunk.end_line
    );
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
}

fn point_for_record(repo: &str, record: EmbeddingRecord) -> PointStruct {
    let id = chunk_point_id(repo, &record.chunk).to_string();
    let payload: Payload = json!({
        "repo": repo,
        "file_path": record.chunk.file_path,
        "start_line": record.chunk.start_line,
        "end_line": record.chunk.end_line,
        "kind": record.chunk.kind,
        "symbol_name": record.chunk.qualified_name,
    })
    .try_into()
    .expect("object literal is a valid payload");
    PointStruct::new(id, record.vector, payload)
}

fn check_dimensions(batch: &[EmbeddingRecord], want: usize) -> VectorStoreResult<()> {
    for record in batch {
        if record.vector.len() != want {
            return Err(VectorStoreError::DimensionMismatch {
                got: record.vector.len(),
                want,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use laravel_indexer::SymbolKind;

    fn chunk(file: &str, start: u32, end: u32) -> Chunk {
        Chunk {
            file_path: file.to_string(),
            start_line: start,
            end_line: end,
            text: "class UserService".to_string(),
            kind: SymbolKind::Class,
            qualified_name: "App\\UserService".to_string(),
        }
    }

    #[test]
    fn point_ids_are_deterministic_per_key() {
        let a = chunk_point_id("acme/shop", &chunk("app/A.php", 1, 40));
        let b = chunk_point_id("acme/shop", &chunk("app/A.php", 1, 40));
        let c = chunk_point_id("acme/shop", &chunk("app/A.php", 31, 70));
        let d = chunk_point_id("acme/blog", &chunk("app/A.php", 1, 40));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn mixed_dimensions_are_rejected() {
        let batch = vec![
            EmbeddingRecord {
                chunk: chunk("app/A.php", 1, 40),
                vector: vec![0.0; 768],
            },
            EmbeddingRecord {
                chunk: chunk("app/B.php", 1, 40),
                vector: vec![0.0; 512],
            },
        ];
        let err = check_dimensions(&batch, 768).unwrap_err();
        match err {
            VectorStoreError::DimensionMismatch { got, want } => {
                assert_eq!(got, 512);
                assert_eq!(want, 768);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn payload_carries_chunk_key_and_symbol() {
        let point = point_for_record(
            "acme/shop",
            EmbeddingRecord {
                chunk: chunk("app/Services/UserService.php", 10, 49),
                vector: vec![0.1; 4],
            },
        );
        let json_of = |k: &str| point.payload.get(k).cloned().map(|v| v.into_json());
        assert_eq!(
            json_of("file_path"),
            Some(json!("app/Services/UserService.php"))
        );
        assert_eq!(json_of("start_line"), Some(json!(10)));
        assert_eq!(json_of("symbol_name"), Some(json!("App\\UserService")));
    }
}
