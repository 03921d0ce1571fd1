//! Extraction output model: symbols, routes, migrations, parse errors.
//!
//! These types are the "normalized output" of the extractor and are consumed
//! by the index/vector stores and by the indexing pipeline. They carry line
//! spans instead of source bodies; the literal text is fetched on demand.

use serde::{Deserialize, Serialize};

/// Kind of an extracted code entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Class,
    Trait,
    Interface,
    Function,
    Method,
    Constant,
}

/// Member visibility as written in source (PHP defaults to public).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// An extracted code entity with a location in source.
///
/// `parent` is a qualified-name reference to the enclosing symbol (e.g. the
/// class of a method), resolved by the index store when needed. It is never
/// an owning pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub file_path: String,
    /// 1-based inclusive line span.
    pub start_line: u32,
    pub end_line: u32,
    /// Textual parameter list, e.g. `(Request $request, int $id)`.
    pub signature: Option<String>,
    /// The immediately preceding `/** ... */` doc comment, if any.
    pub docstring: Option<String>,
    pub parent: Option<String>,
    pub visibility: Option<Visibility>,
    pub is_static: bool,
}

impl Symbol {
    /// Concatenated searchable text: name, qualified name, signature, docstring.
    pub fn search_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.name);
        out.push(' ');
        out.push_str(&self.qualified_name);
        if let Some(sig) = &self.signature {
            out.push(' ');
            out.push_str(sig);
        }
        if let Some(doc) = &self.docstring {
            out.push('\n');
            out.push_str(doc);
        }
        out
    }
}

/// HTTP verb of a route definition. `Any` maps the Laravel `any` helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Any,
}

impl HttpMethod {
    /// Maps a route-facade method name (`get`, `post`, ...) to a verb.
    pub fn from_call_name(name: &str) -> Option<Self> {
        Some(match name {
            "get" => Self::Get,
            "post" => Self::Post,
            "put" => Self::Put,
            "patch" => Self::Patch,
            "delete" => Self::Delete,
            "options" => Self::Options,
            "any" => Self::Any,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Any => "ANY",
        }
    }
}

/// How the route handler was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerType {
    /// `[Controller::class, 'action']`
    Controller,
    /// Bare `Controller::class` (single-action controller).
    Invokable,
    /// Anonymous function or arrow function.
    Closure,
    /// Anything else (including legacy `'Controller@action'` strings).
    Unknown,
}

/// A single HTTP endpoint after applying all inherited group contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub method: HttpMethod,
    /// URI as written at the definition site.
    pub uri: String,
    /// URI with all inherited group prefixes applied.
    pub full_uri: String,
    pub name: Option<String>,
    pub handler_type: HandlerType,
    pub controller: Option<String>,
    pub action: Option<String>,
    /// Inherited group chain extended by the route's own middleware,
    /// order preserved, duplicates kept.
    pub middleware: Vec<String>,
    pub source_file: String,
    pub start_line: u32,
}

/// Classified schema operation of a migration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationOperation {
    Create,
    Alter,
    Drop,
    Rename,
}

/// One destructive schema operation found in a migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestructiveOp {
    /// Operation label, e.g. `DROP TABLE`, `DROP COLUMN`.
    pub op: String,
    /// Target table/column when it could be extracted from the call.
    pub target: Option<String>,
    pub line: u32,
}

/// Extraction record for a single migration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Migration {
    pub file_path: String,
    pub table_name: Option<String>,
    pub operation: MigrationOperation,
    pub is_destructive: bool,
    pub destructive_operations: Vec<DestructiveOp>,
}

/// A non-fatal per-file parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseErrorRecord {
    pub file_path: String,
    /// 1-based line of the first error node reported by the parser.
    pub line: u32,
    pub message: String,
}

/// Everything extracted from one source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileExtraction {
    pub symbols: Vec<Symbol>,
    pub routes: Vec<Route>,
    pub migration: Option<Migration>,
    pub parse_error: Option<ParseErrorRecord>,
}

/// True for files under a Laravel `routes/` directory.
pub fn is_route_file(path: &str) -> bool {
    path.to_lowercase().contains("routes/") && path.ends_with(".php")
}

/// True for files under a `migrations/` directory.
pub fn is_migration_file(path: &str) -> bool {
    path.to_lowercase().contains("migrations/") && path.ends_with(".php")
}
