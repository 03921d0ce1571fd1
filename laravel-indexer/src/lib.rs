//! AST-based extraction for PHP/Laravel repositories.
//!
//! Single entry point: [`extract_file`]. For every PHP file it emits symbols
//! (best-effort, even for files with parse errors); for route files it
//! resolves routes with their full group context; for migration files it
//! classifies the schema operation and captures destructive operations.
//!
//! The extractor is deterministic and pure: same bytes in, same records out.
//! Parsing is CPU-bound — run it on a blocking worker from async code.

pub mod errors;
pub mod migrations;
pub mod parse;
pub mod routes;
pub mod symbols;
pub mod types;

pub use errors::{IndexerError, IndexerResult};
pub use types::{
    DestructiveOp, FileExtraction, HandlerType, HttpMethod, Migration, MigrationOperation,
    ParseErrorRecord, Route, Symbol, SymbolKind, Visibility, is_migration_file, is_route_file,
};

use tracing::debug;

use crate::migrations::MigrationScanner;
use crate::parse::{first_error_node, parse_php, start_line};

/// Extracts everything we index from one source file.
///
/// Unparseable files produce a `parse_error` record and **no routes** (a
/// partially resolved group context would mislead downstream consumers);
/// symbols are still extracted from the parseable subtree. Migration
/// classification is pattern-based and unaffected by parse errors.
///
/// # Errors
/// Only infrastructure failures (grammar setup, parser returning no tree)
/// are errors; in-file syntax problems are data, not errors.
pub fn extract_file(path: &str, source: &str) -> IndexerResult<FileExtraction> {
    if !path.ends_with(".php") {
        return Ok(FileExtraction::default());
    }

    let tree = parse_php(path, source)?;
    let root = tree.root_node();

    let parse_error = if root.has_error() {
        let node = first_error_node(root);
        let line = node.map(start_line).unwrap_or(1);
        debug!(file = path, line, "parse error, routes suppressed");
        Some(ParseErrorRecord {
            file_path: path.to_string(),
            line,
            message: format!("syntax error near line {line}"),
        })
    } else {
        None
    };

    let symbols = symbols::extract_symbols(path, source, &tree);

    let routes = if parse_error.is_none() && is_route_file(path) {
        routes::extract_routes(path, source, &tree)
    } else {
        Vec::new()
    };

    let migration =
        is_migration_file(path).then(|| MigrationScanner::new().scan(path, source));

    debug!(
        file = path,
        symbols = symbols.len(),
        routes = routes.len(),
        has_migration = migration.is_some(),
        "file extracted"
    );

    Ok(FileExtraction {
        symbols,
        routes,
        migration,
        parse_error,
    })
}
