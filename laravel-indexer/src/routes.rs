//! Route resolution for Laravel route files.
//!
//! Group chains (`Route::middleware([...])->prefix('api')->group(fn)`) are
//! modeled as a **context stack**: each `group(<closure>)` pushes a frame of
//! `(prefix, middleware)` derived from the parent frame, the closure body is
//! walked under that frame, and the frame is popped afterwards. Inherited
//! state is never ambient — it lives only on the stack.

use tracing::trace;
use tree_sitter::{Node, Tree};

use crate::parse::{is_closure, node_text, positional_args, start_line, string_literal};
use crate::types::{HandlerType, HttpMethod, Route};

/// Inherited group context: accumulated prefix and middleware chain.
#[derive(Debug, Clone, Default)]
struct Frame {
    prefix: String,
    middleware: Vec<String>,
}

/// Extracts all routes defined in a parsed route file.
pub fn extract_routes(path: &str, source: &str, tree: &Tree) -> Vec<Route> {
    let mut out = Vec::new();
    let mut frames = vec![Frame::default()];
    walk_scope(tree.root_node(), path, source, &mut frames, &mut out);
    trace!(file = path, count = out.len(), "routes extracted");
    out
}

/// Joins a parent prefix with a child segment.
///
/// Both sides are stripped of leading/trailing `/`; two non-empty parts
/// compose as `/parent/child`, a single non-empty part as `/part`, and two
/// empty parts as `/`.
pub fn join_prefix(parent: &str, child: &str) -> String {
    let p = parent.trim_matches('/');
    let c = child.trim_matches('/');
    match (p.is_empty(), c.is_empty()) {
        (false, false) => format!("/{p}/{c}"),
        (false, true) => format!("/{p}"),
        (true, false) => format!("/{c}"),
        (true, true) => "/".to_string(),
    }
}

fn walk_scope(
    node: Node<'_>,
    path: &str,
    source: &str,
    frames: &mut Vec<Frame>,
    out: &mut Vec<Route>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "expression_statement" => {
                if let Some(expr) = child.named_child(0) {
                    if let Some(chain) = unroll_chain(expr, source) {
                        handle_chain(&chain, child, path, source, frames, out);
                        continue;
                    }
                }
            }
            // Route files occasionally wrap definitions in conditionals.
            "compound_statement" | "if_statement" | "else_clause" => {
                walk_scope(child, path, source, frames, out);
            }
            _ => {}
        }
    }
}

/// One link of a route-facade call chain.
struct ChainLink<'t> {
    name: String,
    call: Node<'t>,
}

/// Unrolls `Route::a(..)->b(..)->c(..)` into root-first links.
///
/// Returns `None` for chains not rooted at the route facade.
fn unroll_chain<'t>(expr: Node<'t>, source: &str) -> Option<Vec<ChainLink<'t>>> {
    let mut links = Vec::new();
    let mut node = expr;

    while node.kind() == "member_call_expression" {
        let name = node_text(node.child_by_field_name("name")?, source).to_string();
        links.push(ChainLink { name, call: node });
        node = node.child_by_field_name("object")?;
    }

    if node.kind() != "scoped_call_expression" {
        return None;
    }
    let scope = node_text(node.child_by_field_name("scope")?, source);
    if scope != "Route" && !scope.ends_with("\\Route") {
        return None;
    }
    let name = node_text(node.child_by_field_name("name")?, source).to_string();
    links.push(ChainLink { name, call: node });
    links.reverse();
    Some(links)
}

fn handle_chain(
    links: &[ChainLink<'_>],
    statement: Node<'_>,
    path: &str,
    source: &str,
    frames: &mut Vec<Frame>,
    out: &mut Vec<Route>,
) {
    // Group call: push a derived frame and recurse into the closure body.
    if let Some(group) = links.iter().find(|l| l.name == "group") {
        let prefix_arg = links
            .iter()
            .filter(|l| l.name == "prefix")
            .find_map(|l| first_string_arg(l.call, source))
            .unwrap_or_default();
        let chain_middleware: Vec<String> = links
            .iter()
            .filter(|l| l.name == "middleware")
            .flat_map(|l| middleware_args(l.call, source))
            .collect();

        let parent = frames.last().cloned().unwrap_or_default();
        let mut middleware = parent.middleware.clone();
        middleware.extend(chain_middleware);
        frames.push(Frame {
            prefix: join_prefix(&parent.prefix, &prefix_arg),
            middleware,
        });

        for arg in positional_args(group.call) {
            if is_closure(arg) {
                if let Some(body) = arg.child_by_field_name("body") {
                    walk_scope(body, path, source, frames, out);
                }
            }
        }
        frames.pop();
        return;
    }

    let frame = frames.last().cloned().unwrap_or_default();
    let own_middleware: Vec<String> = links
        .iter()
        .filter(|l| l.name == "middleware")
        .flat_map(|l| middleware_args(l.call, source))
        .collect();

    // HTTP verb call.
    if let Some(verb) = links
        .iter()
        .find_map(|l| HttpMethod::from_call_name(&l.name).map(|m| (m, l)))
    {
        let (method, link) = verb;
        let args = positional_args(link.call);
        let Some(uri) = args.first().and_then(|a| string_literal(*a, source)) else {
            return;
        };
        let (handler_type, controller, action) = match args.get(1) {
            Some(handler) => parse_handler(*handler, source),
            None => (HandlerType::Unknown, None, None),
        };
        let name = links
            .iter()
            .filter(|l| l.name == "name")
            .find_map(|l| first_string_arg(l.call, source));

        let mut middleware = frame.middleware.clone();
        middleware.extend(own_middleware);

        out.push(Route {
            method,
            full_uri: join_prefix(&frame.prefix, &uri),
            uri,
            name,
            handler_type,
            controller,
            action,
            middleware,
            source_file: path.to_string(),
            start_line: start_line(statement),
        });
        return;
    }

    // Resource shorthand: a fixed expansion per CRUD action.
    if let Some(link) = links
        .iter()
        .find(|l| l.name == "resource" || l.name == "apiResource")
    {
        let args = positional_args(link.call);
        let Some(resource) = args.first().and_then(|a| string_literal(*a, source)) else {
            return;
        };
        let controller = args.get(1).and_then(|a| class_reference(*a, source));

        let actions: &[(&str, HttpMethod, &str)] = if link.name == "resource" {
            &RESOURCE_ACTIONS
        } else {
            &API_RESOURCE_ACTIONS
        };

        for (action, method, pattern) in actions {
            let uri = pattern.replace("{n}", &resource);
            let mut middleware = frame.middleware.clone();
            middleware.extend(own_middleware.iter().cloned());
            out.push(Route {
                method: *method,
                full_uri: join_prefix(&frame.prefix, &uri),
                uri,
                name: Some(format!("{resource}.{action}")),
                handler_type: HandlerType::Controller,
                controller: controller.clone(),
                action: Some((*action).to_string()),
                middleware,
                source_file: path.to_string(),
                start_line: start_line(statement),
            });
        }
    }
}

/// `resource()` expands to the full 7-action CRUD set.
const RESOURCE_ACTIONS: [(&str, HttpMethod, &str); 7] = [
    ("index", HttpMethod::Get, "{n}"),
    ("create", HttpMethod::Get, "{n}/create"),
    ("store", HttpMethod::Post, "{n}"),
    ("show", HttpMethod::Get, "{n}/{id}"),
    ("edit", HttpMethod::Get, "{n}/{id}/edit"),
    ("update", HttpMethod::Put, "{n}/{id}"),
    ("destroy", HttpMethod::Delete, "{n}/{id}"),
];

/// `apiResource()` omits the HTML form endpoints (`create`, `edit`).
const API_RESOURCE_ACTIONS: [(&str, HttpMethod, &str); 5] = [
    ("index", HttpMethod::Get, "{n}"),
    ("store", HttpMethod::Post, "{n}"),
    ("show", HttpMethod::Get, "{n}/{id}"),
    ("update", HttpMethod::Put, "{n}/{id}"),
    ("destroy", HttpMethod::Delete, "{n}/{id}"),
];

/// Classifies a route handler expression.
fn parse_handler(
    node: Node<'_>,
    source: &str,
) -> (HandlerType, Option<String>, Option<String>) {
    if is_closure(node) {
        return (HandlerType::Closure, None, None);
    }
    match node.kind() {
        // `[Controller::class, 'action']`
        "array_creation_expression" => {
            let elements: Vec<Node<'_>> = {
                let mut cursor = node.walk();
                node.children(&mut cursor)
                    .filter(|c| c.kind() == "array_element_initializer")
                    .filter_map(|c| c.named_child(c.named_child_count().saturating_sub(1)))
                    .collect()
            };
            let controller = elements.first().and_then(|e| class_reference(*e, source));
            let action = elements.get(1).and_then(|e| string_literal(*e, source));
            match (controller, action) {
                (Some(c), Some(a)) => (HandlerType::Controller, Some(c), Some(a)),
                _ => (HandlerType::Unknown, None, None),
            }
        }
        // Bare `Controller::class` — single-action controller.
        "class_constant_access_expression" => match class_reference(node, source) {
            Some(c) => (
                HandlerType::Invokable,
                Some(c),
                Some("__invoke".to_string()),
            ),
            None => (HandlerType::Unknown, None, None),
        },
        _ => (HandlerType::Unknown, None, None),
    }
}

/// Extracts `Foo` from a `Foo::class` constant access.
///
/// The trailing `class` token may be a named or anonymous node depending on
/// the grammar version, so the check goes by text of the last child.
fn class_reference(node: Node<'_>, source: &str) -> Option<String> {
    if node.kind() != "class_constant_access_expression" {
        return None;
    }
    let last = node.child(node.child_count().saturating_sub(1))?;
    if node_text(last, source) != "class" {
        return None;
    }
    Some(node_text(node.named_child(0)?, source).to_string())
}

/// First positional string argument of a call, if any.
fn first_string_arg(call: Node<'_>, source: &str) -> Option<String> {
    positional_args(call)
        .first()
        .and_then(|a| string_literal(*a, source))
}

/// Middleware argument: a single string or an array of strings.
fn middleware_args(call: Node<'_>, source: &str) -> Vec<String> {
    let Some(arg) = positional_args(call).into_iter().next() else {
        return Vec::new();
    };
    if let Some(s) = string_literal(arg, source) {
        return vec![s];
    }
    if arg.kind() == "array_creation_expression" {
        let mut cursor = arg.walk();
        return arg
            .children(&mut cursor)
            .filter(|c| c.kind() == "array_element_initializer")
            .filter_map(|c| c.named_child(0))
            .filter_map(|e| string_literal(e, source))
            .collect();
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_php;

    fn routes_of(src: &str) -> Vec<Route> {
        let tree = parse_php("routes/api.php", src).unwrap();
        extract_routes("routes/api.php", src, &tree)
    }

    #[test]
    fn join_prefix_rule() {
        assert_eq!(join_prefix("", ""), "/");
        assert_eq!(join_prefix("", "api"), "/api");
        assert_eq!(join_prefix("/api/", "/users/"), "/api/users");
        assert_eq!(join_prefix("/api", ""), "/api");
    }

    #[test]
    fn plain_get_with_controller_handler() {
        let src = r#"<?php
Route::get('/users/{user}/profile', [UserController::class, 'profile'])
    ->name('users.profile')
    ->middleware('auth');
"#;
        let routes = routes_of(src);
        assert_eq!(routes.len(), 1);
        let r = &routes[0];
        assert_eq!(r.method, HttpMethod::Get);
        assert_eq!(r.uri, "/users/{user}/profile");
        assert_eq!(r.full_uri, "/users/{user}/profile");
        assert_eq!(r.name.as_deref(), Some("users.profile"));
        assert_eq!(r.handler_type, HandlerType::Controller);
        assert_eq!(r.controller.as_deref(), Some("UserController"));
        assert_eq!(r.action.as_deref(), Some("profile"));
        assert_eq!(r.middleware, vec!["auth"]);
        assert_eq!(r.start_line, 2);
    }

    #[test]
    fn invokable_closure_and_unknown_handlers() {
        let src = r#"<?php
Route::get('/health', HealthController::class);
Route::get('/ping', function () { return 'pong'; });
Route::get('/legacy', 'LegacyController@index');
"#;
        let routes = routes_of(src);
        assert_eq!(routes.len(), 3);
        assert_eq!(routes[0].handler_type, HandlerType::Invokable);
        assert_eq!(routes[0].controller.as_deref(), Some("HealthController"));
        assert_eq!(routes[0].action.as_deref(), Some("__invoke"));
        assert_eq!(routes[1].handler_type, HandlerType::Closure);
        assert!(routes[1].controller.is_none());
        assert_eq!(routes[2].handler_type, HandlerType::Unknown);
    }

    #[test]
    fn nested_groups_compose_prefix_and_middleware() {
        let src = r#"<?php
Route::middleware(['auth'])->prefix('api')->group(function () {
    Route::middleware(['admin'])->group(function () {
        Route::delete('/users/{id}', [UserController::class, 'destroy']);
    });
});
"#;
        let routes = routes_of(src);
        assert_eq!(routes.len(), 1);
        let r = &routes[0];
        assert_eq!(r.method, HttpMethod::Delete);
        assert_eq!(r.full_uri, "/api/users/{id}");
        assert_eq!(r.middleware, vec!["auth", "admin"]);
    }

    #[test]
    fn middleware_duplicates_are_kept_in_order() {
        let src = r#"<?php
Route::middleware(['auth'])->group(function () {
    Route::post('/logout', [AuthController::class, 'logout'])->middleware('auth');
});
"#;
        let routes = routes_of(src);
        assert_eq!(routes[0].middleware, vec!["auth", "auth"]);
    }

    #[test]
    fn api_resource_expands_to_five_routes() {
        let src = r#"<?php
Route::middleware(['auth'])->prefix('api')->group(function () {
    Route::apiResource('posts', PostController::class);
});
"#;
        let routes = routes_of(src);
        assert_eq!(routes.len(), 5);
        for r in &routes {
            assert_eq!(r.middleware, vec!["auth"]);
            assert_eq!(r.controller.as_deref(), Some("PostController"));
            assert!(r.full_uri.starts_with("/api/posts"));
        }
        let names: Vec<_> = routes.iter().filter_map(|r| r.name.as_deref()).collect();
        assert_eq!(
            names,
            vec![
                "posts.index",
                "posts.store",
                "posts.show",
                "posts.update",
                "posts.destroy"
            ]
        );
        let methods: Vec<_> = routes.iter().map(|r| r.method).collect();
        assert_eq!(
            methods,
            vec![
                HttpMethod::Get,
                HttpMethod::Post,
                HttpMethod::Get,
                HttpMethod::Put,
                HttpMethod::Delete
            ]
        );
        assert_eq!(routes[2].full_uri, "/api/posts/{id}");
    }

    #[test]
    fn full_resource_expands_to_seven_routes() {
        let src = "<?php\nRoute::resource('posts', PostController::class);\n";
        let routes = routes_of(src);
        assert_eq!(routes.len(), 7);
        let names: Vec<_> = routes.iter().filter_map(|r| r.name.as_deref()).collect();
        assert_eq!(
            names,
            vec![
                "posts.index",
                "posts.create",
                "posts.store",
                "posts.show",
                "posts.edit",
                "posts.update",
                "posts.destroy"
            ]
        );
        assert_eq!(routes[1].full_uri, "/posts/create");
        assert_eq!(routes[4].full_uri, "/posts/{id}/edit");
    }

    #[test]
    fn group_without_prefix_keeps_parent_prefix() {
        let src = r#"<?php
Route::prefix('admin')->group(function () {
    Route::middleware('can:manage')->group(function () {
        Route::get('/stats', [StatsController::class, 'index']);
    });
});
"#;
        let routes = routes_of(src);
        assert_eq!(routes[0].full_uri, "/admin/stats");
        assert_eq!(routes[0].middleware, vec!["can:manage"]);
    }

    #[test]
    fn non_route_statements_are_ignored(){
        let src = r#"<?php
use App\Http\Controllers\UserController;
$value = config('app.name');
Schema::create('users', function ($table) {});
"#;
        assert!(routes_of(src).is_empty());
    }
}
