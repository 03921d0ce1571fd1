//! Symbol extraction: classes, interfaces, traits, functions, methods,
//! constants — with signatures, doc comments, visibility and parent links.
//!
//! Qualified names are taken literally from source text: `Ns\Class` for
//! types, `Ns\Class::member` for members. Imported-class resolution is out
//! of scope.

use tracing::trace;
use tree_sitter::{Node, Tree};

use crate::parse::{end_line, node_text, start_line};
use crate::types::{Symbol, SymbolKind, Visibility};

/// Extracts all symbols from a parsed file, best-effort.
///
/// Subtrees containing parse errors are skipped node-by-node rather than
/// aborting the whole file.
pub fn extract_symbols(path: &str, source: &str, tree: &Tree) -> Vec<Symbol> {
    let mut out = Vec::new();
    let mut walker = SymbolWalker {
        path,
        source,
        namespace: None,
        out: &mut out,
    };
    walker.walk_container(tree.root_node());
    trace!(file = path, count = walker.out.len(), "symbols extracted");
    out
}

struct SymbolWalker<'a> {
    path: &'a str,
    source: &'a str,
    namespace: Option<String>,
    out: &'a mut Vec<Symbol>,
}

impl<'a> SymbolWalker<'a> {
    /// Walks a top-level container (program or namespace body).
    fn walk_container(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "namespace_definition" => {
                    if let Some(name) = child.child_by_field_name("name") {
                        self.namespace = Some(node_text(name, self.source).to_string());
                    }
                    // Braced namespaces carry their declarations in a body.
                    if let Some(body) = child.child_by_field_name("body") {
                        self.walk_container(body);
                    }
                }
                "class_declaration" => self.emit_type(child, SymbolKind::Class),
                "interface_declaration" => self.emit_type(child, SymbolKind::Interface),
                "trait_declaration" => self.emit_type(child, SymbolKind::Trait),
                "function_definition" => self.emit_function(child, None),
                "const_declaration" => self.emit_constants(child, None),
                // Statement wrappers that can hold declarations (e.g. `if`
                // guarded function definitions) are traversed transparently.
                "compound_statement" | "declaration_list" | "if_statement" | "else_clause" => {
                    self.walk_container(child)
                }
                _ => {}
            }
        }
    }

    fn emit_type(&mut self, node: Node<'_>, kind: SymbolKind) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, self.source).to_string();
        let qualified = self.qualify(&name);

        self.out.push(Symbol {
            name: name.clone(),
            qualified_name: qualified.clone(),
            kind,
            file_path: self.path.to_string(),
            start_line: start_line(node),
            end_line: end_line(node),
            signature: None,
            docstring: doc_comment(node, self.source),
            parent: None,
            visibility: None,
            is_static: false,
        });

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.children(&mut cursor) {
                match member.kind() {
                    "method_declaration" => self.emit_method(member, &qualified),
                    "const_declaration" => self.emit_constants(member, Some(&qualified)),
                    _ => {}
                }
            }
        }
    }

    fn emit_method(&mut self, node: Node<'_>, parent: &str) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, self.source).to_string();
        let signature = node
            .child_by_field_name("parameters")
            .map(|p| node_text(p, self.source).to_string());

        let mut visibility = Visibility::Public;
        let mut is_static = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "visibility_modifier" => {
                    visibility = match node_text(child, self.source) {
                        "private" => Visibility::Private,
                        "protected" => Visibility::Protected,
                        _ => Visibility::Public,
                    };
                }
                "static_modifier" => is_static = true,
                _ => {}
            }
        }

        self.out.push(Symbol {
            name: name.clone(),
            qualified_name: format!("{parent}::{name}"),
            kind: SymbolKind::Method,
            file_path: self.path.to_string(),
            start_line: start_line(node),
            end_line: end_line(node),
            signature,
            docstring: doc_comment(node, self.source),
            parent: Some(parent.to_string()),
            visibility: Some(visibility),
            is_static,
        });
    }

    fn emit_function(&mut self, node: Node<'_>, parent: Option<&str>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, self.source).to_string();
        let qualified = match parent {
            Some(p) => format!("{p}::{name}"),
            None => self.qualify(&name),
        };

        self.out.push(Symbol {
            name,
            qualified_name: qualified,
            kind: SymbolKind::Function,
            file_path: self.path.to_string(),
            start_line: start_line(node),
            end_line: end_line(node),
            signature: node
                .child_by_field_name("parameters")
                .map(|p| node_text(p, self.source).to_string()),
            docstring: doc_comment(node, self.source),
            parent: parent.map(str::to_string),
            visibility: None,
            is_static: false,
        });
    }

    fn emit_constants(&mut self, node: Node<'_>, parent: Option<&str>) {
        let mut cursor = node.walk();
        for element in node.children(&mut cursor) {
            if element.kind() != "const_element" {
                continue;
            }
            let Some(name_node) = element.named_child(0) else {
                continue;
            };
            let name = node_text(name_node, self.source).to_string();
            let qualified = match parent {
                Some(p) => format!("{p}::{name}"),
                None => self.qualify(&name),
            };
            self.out.push(Symbol {
                name,
                qualified_name: qualified,
                kind: SymbolKind::Constant,
                file_path: self.path.to_string(),
                start_line: start_line(node),
                end_line: end_line(node),
                signature: None,
                docstring: doc_comment(node, self.source),
                parent: parent.map(str::to_string),
                visibility: None,
                is_static: false,
            });
        }
    }

    fn qualify(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}\\{name}"),
            None => name.to_string(),
        }
    }
}

/// Returns the cleaned text of the `/** ... */` comment immediately
/// preceding a declaration, if any. Attribute lists between the comment and
/// the declaration are skipped.
fn doc_comment(node: Node<'_>, source: &str) -> Option<String> {
    let mut prev = node.prev_sibling();
    while let Some(p) = prev {
        match p.kind() {
            "comment" => {
                let text = node_text(p, source);
                if !text.starts_with("/**") {
                    return None;
                }
                return Some(clean_doc(text));
            }
            "attribute_list" => prev = p.prev_sibling(),
            _ => return None,
        }
    }
    None
}

/// Strips `/** */` fences and leading `*` gutters from a docblock.
fn clean_doc(raw: &str) -> String {
    let inner = raw
        .trim_start_matches("/**")
        .trim_end_matches("*/")
        .trim();
    inner
        .lines()
        .map(|l| l.trim().trim_start_matches('*').trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_php;

    fn symbols_of(src: &str) -> Vec<Symbol> {
        let tree = parse_php("app/T.php", src).unwrap();
        extract_symbols("app/T.php", src, &tree)
    }

    #[test]
    fn class_with_methods_and_docblock() {
        let src = r#"<?php
namespace App\Http\Middleware;

/**
 * Ensure the user is authenticated.
 */
class Authenticate
{
    public const GUARD = 'web';

    /** Redirect unauthenticated users. */
    protected function redirectTo(Request $request): ?string
    {
        return route('login');
    }

    public static function guard(): string
    {
        return self::GUARD;
    }
}
"#;
        let syms = symbols_of(src);
        let class = syms.iter().find(|s| s.kind == SymbolKind::Class).unwrap();
        assert_eq!(class.name, "Authenticate");
        assert_eq!(class.qualified_name, "App\\Http\\Middleware\\Authenticate");
        assert_eq!(
            class.docstring.as_deref(),
            Some("Ensure the user is authenticated.")
        );

        let redirect = syms.iter().find(|s| s.name == "redirectTo").unwrap();
        assert_eq!(redirect.kind, SymbolKind::Method);
        assert_eq!(redirect.visibility, Some(Visibility::Protected));
        assert_eq!(
            redirect.parent.as_deref(),
            Some("App\\Http\\Middleware\\Authenticate")
        );
        assert_eq!(
            redirect.signature.as_deref(),
            Some("(Request $request)")
        );
        assert!(!redirect.is_static);

        let guard = syms.iter().find(|s| s.name == "guard").unwrap();
        assert!(guard.is_static);
        assert_eq!(guard.visibility, Some(Visibility::Public));

        let constant = syms
            .iter()
            .find(|s| s.kind == SymbolKind::Constant)
            .unwrap();
        assert_eq!(constant.name, "GUARD");
        assert_eq!(
            constant.qualified_name,
            "App\\Http\\Middleware\\Authenticate::GUARD"
        );
    }

    #[test]
    fn top_level_function_and_interface() {
        let src = r#"<?php
namespace App\Support;

interface Sluggable
{
    public function slug(): string;
}

function normalize_path(string $path): string
{
    return trim($path, '/');
}
"#;
        let syms = symbols_of(src);
        assert!(syms
            .iter()
            .any(|s| s.kind == SymbolKind::Interface && s.name == "Sluggable"));
        let func = syms
            .iter()
            .find(|s| s.kind == SymbolKind::Function)
            .unwrap();
        assert_eq!(func.qualified_name, "App\\Support\\normalize_path");
        assert_eq!(func.signature.as_deref(), Some("(string $path)"));
        // Interface methods are methods of the interface.
        let slug = syms.iter().find(|s| s.name == "slug").unwrap();
        assert_eq!(slug.parent.as_deref(), Some("App\\Support\\Sluggable"));
    }

    #[test]
    fn line_spans_are_one_based_and_ordered() {
        let src = "<?php\nclass A {\n}\n";
        let syms = symbols_of(src);
        assert_eq!(syms.len(), 1);
        assert_eq!(syms[0].start_line, 2);
        assert_eq!(syms[0].end_line, 3);
        assert!(syms[0].start_line <= syms[0].end_line);
    }

    #[test]
    fn search_text_concatenates_fields() {
        let src = "<?php\n/** Finds users. */\nfunction find_user(int $id) {}\n";
        let syms = symbols_of(src);
        let text = syms[0].search_text();
        assert!(text.contains("find_user"));
        assert!(text.contains("(int $id)"));
        assert!(text.contains("Finds users."));
    }
}
