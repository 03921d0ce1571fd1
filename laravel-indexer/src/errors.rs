//! Error type for the extraction layer.
//!
//! Per-file parse problems are *not* errors here — they are recorded as
//! `ParseErrorRecord` values so indexing can continue. This enum covers the
//! failures that make extraction itself impossible.

use thiserror::Error;

pub type IndexerResult<T> = Result<T, IndexerError>;

#[derive(Debug, Error)]
pub enum IndexerError {
    /// The PHP grammar could not be loaded into the parser.
    #[error("language setup error: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    /// The parser returned no tree (cancellation or invalid input encoding).
    #[error("parser produced no tree for {0}")]
    NoTree(String),

    /// The input is not valid UTF-8.
    #[error("non-utf8 source in {path}: {source}")]
    Encoding {
        path: String,
        #[source]
        source: std::str::Utf8Error,
    },
}
