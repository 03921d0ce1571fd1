//! Parser setup and small tree helpers shared by the extractors.
//!
//! A fresh `Parser` is created per call for simplicity; parsing is CPU-bound
//! and callers are expected to run it on a blocking worker.

use tree_sitter::{Node, Parser, Tree};

use crate::errors::{IndexerError, IndexerResult};

/// Parses PHP source into a tree-sitter tree.
///
/// The returned tree may contain error nodes; callers decide how much of the
/// file is still usable (symbols are best-effort, routes are not).
pub fn parse_php(path: &str, source: &str) -> IndexerResult<Tree> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_php::LANGUAGE_PHP.into())?;
    parser
        .parse(source, None)
        .ok_or_else(|| IndexerError::NoTree(path.to_string()))
}

/// Returns the source text covered by a node.
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// 1-based start line of a node.
pub fn start_line(node: Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

/// 1-based end line of a node.
pub fn end_line(node: Node<'_>) -> u32 {
    node.end_position().row as u32 + 1
}

/// Finds the first error or missing node, depth-first.
///
/// Used to report a position for unparseable files.
pub fn first_error_node<'t>(node: Node<'t>) -> Option<Node<'t>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(err) = first_error_node(child) {
            return Some(err);
        }
    }
    // `has_error` was set but no child carried it; report the node itself.
    Some(node)
}

/// Extracts the literal content of a PHP string expression.
///
/// Handles both single-quoted (`string`) and double-quoted
/// (`encapsed_string`) literals. Interpolated strings return their raw
/// content as written. Non-string nodes return `None`.
pub fn string_literal(node: Node<'_>, source: &str) -> Option<String> {
    match node.kind() {
        "string" | "encapsed_string" => {
            let mut cursor = node.walk();
            let content: String = node
                .children(&mut cursor)
                .filter(|c| c.kind() == "string_content" || c.kind() == "escape_sequence")
                .map(|c| node_text(c, source))
                .collect();
            Some(content)
        }
        _ => None,
    }
}

/// Collects the positional (unnamed) argument expressions of a call.
///
/// Named arguments are skipped: route/group options in this codebase's
/// target framework are positional or chained.
pub fn positional_args<'t>(call: Node<'t>) -> Vec<Node<'t>> {
    let Some(args) = call.child_by_field_name("arguments") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut cursor = args.walk();
    for child in args.children(&mut cursor) {
        if child.kind() == "argument" && child.child_by_field_name("name").is_none() {
            // The expression is the last named child of the argument node.
            if let Some(expr) = child.named_child(child.named_child_count().saturating_sub(1)) {
                out.push(expr);
            }
        }
    }
    out
}

/// True for anonymous function / arrow function nodes across grammar versions.
pub fn is_closure(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "anonymous_function" | "anonymous_function_creation_expression" | "arrow_function"
    )
}
