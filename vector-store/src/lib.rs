//! Embedding store over Qdrant.
//!
//! Chunks symbol search text into line windows, embeds them through an
//! [`EmbeddingModel`], and persists vectors keyed by
//! `(repo, file, start_line, end_line)`. Search is repo-scoped cosine
//! nearest-neighbor. The embedding dimension is fixed per deployment and
//! enforced on every write.

pub mod chunk;
pub mod config;
pub mod embed;
pub mod errors;
pub mod facade;
pub mod store;

pub use chunk::{Chunk, MIN_CHUNK_LINES, OVERLAP_LINES, WINDOW_LINES, chunk_symbol};
pub use config::VectorConfig;
pub use embed::{EmbeddingModel, NoopEmbedder};
pub use errors::{VectorStoreError, VectorStoreResult};
pub use store::{EmbeddingRecord, VectorHit, VectorStore, chunk_point_id};
