//! Symbol chunking for the embedding store.
//!
//! Small symbols are skipped; medium symbols become one chunk holding the
//! symbol's search text; symbols taller than one window are split into
//! sliding line windows with overlap so no region of a large class falls
//! outside every chunk. Chunk identity is `(file, start_line, end_line)`
//! within a repository.

use laravel_indexer::Symbol;
use serde::{Deserialize, Serialize};

/// Minimum symbol height (in lines) to be embedded at all.
pub const MIN_CHUNK_LINES: u32 = 12;
/// Window height for oversized symbols.
pub const WINDOW_LINES: u32 = 40;
/// Overlap between consecutive windows.
pub const OVERLAP_LINES: u32 = 10;

/// One embeddable chunk of a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub text: String,
    pub kind: laravel_indexer::SymbolKind,
    pub qualified_name: String,
}

/// Splits a symbol into zero or more chunks.
///
/// Windows step by `WINDOW_LINES - OVERLAP_LINES` and are clamped to the
/// symbol's span; the final window always reaches `end_line`.
pub fn chunk_symbol(symbol: &Symbol) -> Vec<Chunk> {
    let span = symbol.end_line.saturating_sub(symbol.start_line) + 1;
    if span < MIN_CHUNK_LINES {
        return Vec::new();
    }

    let text = symbol.search_text();
    let make = |start: u32, end: u32| Chunk {
        file_path: symbol.file_path.clone(),
        start_line: start,
        end_line: end,
        text: text.clone(),
        kind: symbol.kind,
        qualified_name: symbol.qualified_name.clone(),
    };

    if span <= WINDOW_LINES {
        return vec![make(symbol.start_line, symbol.end_line)];
    }

    let step = WINDOW_LINES - OVERLAP_LINES;
    let mut out = Vec::new();
    let mut start = symbol.start_line;
    loop {
        let end = (start + WINDOW_LINES - 1).min(symbol.end_line);
        out.push(make(start, end));
        if end == symbol.end_line {
            break;
        }
        start += step;
    }
    out
}
