//! End-to-end indexing over a local checkout: extraction, atomic publish,
//! idempotence, and search — no network, no model server.

use std::sync::Arc;

use repolens::{
    IndexStore, IndexingPipeline, MemoryMeteringSink, MeterEventKind, RepoId, RepoStatus,
    SourceClient,
};

const ROUTES_API: &str = r#"<?php

use App\Http\Controllers\PostController;
use App\Http\Controllers\UserController;

Route::middleware(['auth'])->prefix('api')->group(function () {
    Route::apiResource('posts', PostController::class);
    Route::get('/users/{user}/profile', [UserController::class, 'profile'])
        ->name('users.profile');
});
"#;

const AUTH_MIDDLEWARE: &str = r#"<?php

namespace App\Http\Middleware;

/**
 * Ensure the request carries an authenticated user.
 */
class Authenticate
{
    protected function redirectTo($request): ?string
    {
        return route('login');
    }
}
"#;

const DROP_MIGRATION: &str = r#"<?php

Schema::table('orders', function (Blueprint $table) {
    $table->dropColumn('legacy_id');
});
"#;

fn fixture_checkout() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let write = |rel: &str, content: &str| {
        let full = dir.path().join(rel);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    };
    write("routes/api.php", ROUTES_API);
    write("app/Http/Middleware/Authenticate.php", AUTH_MIDDLEWARE);
    write(
        "database/migrations/2024_01_15_drop_legacy.php",
        DROP_MIGRATION,
    );
    write("composer.lock", "{}");
    write("vendor/autoload.php", "<?php // generated");
    dir
}

#[tokio::test]
async fn indexing_publishes_a_complete_generation() {
    let checkout = fixture_checkout();
    let store = Arc::new(IndexStore::new());
    let metering = Arc::new(MemoryMeteringSink::default());
    let pipeline = IndexingPipeline::new(
        store.clone(),
        Arc::new(SourceClient::local(checkout.path())),
        None,
        metering.clone(),
    );

    let repo = RepoId::new("acme", "shop");
    let commit = "a".repeat(40);
    let stats = pipeline.index_repository(&repo, &commit).await.unwrap();

    // vendor/ and the lockfile honored the skiplist; the three php files
    // parsed cleanly.
    assert_eq!(stats.files_skipped, 2);
    assert_eq!(stats.files_parsed, 3);
    assert_eq!(stats.parse_errors, 0);
    assert_eq!(stats.routes, 6);
    assert_eq!(stats.migrations, 1);
    assert!(stats.symbols >= 2);

    let record = store.get_repo(&repo).await.unwrap();
    assert_eq!(record.status, RepoStatus::Ready);
    assert_eq!(record.last_indexed_commit.as_deref(), Some(commit.as_str()));

    let generation = store.generation(&repo).await.unwrap();
    // Routes: the 5-route apiResource expansion plus the explicit get.
    let api_posts: Vec<_> = generation
        .payload
        .routes
        .iter()
        .filter(|r| r.full_uri.starts_with("/api/posts"))
        .collect();
    assert_eq!(api_posts.len(), 5);
    assert!(api_posts.iter().all(|r| r.middleware == vec!["auth"]));

    let profile = generation
        .payload
        .routes
        .iter()
        .find(|r| r.name.as_deref() == Some("users.profile"))
        .unwrap();
    assert_eq!(profile.full_uri, "/api/users/{user}/profile");

    let migration = &generation.payload.migrations[0];
    assert!(migration.is_destructive);
    assert_eq!(
        migration.destructive_operations[0].target.as_deref(),
        Some("legacy_id")
    );

    // The lease was released and one indexed event was metered.
    let events = metering.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0].event, MeterEventKind::Indexed));
}

#[tokio::test]
async fn reindexing_the_same_commit_is_idempotent() {
    let checkout = fixture_checkout();
    let store = Arc::new(IndexStore::new());
    let pipeline = IndexingPipeline::new(
        store.clone(),
        Arc::new(SourceClient::local(checkout.path())),
        None,
        Arc::new(MemoryMeteringSink::default()),
    );

    let repo = RepoId::new("acme", "shop");
    let commit = "b".repeat(40);
    pipeline.index_repository(&repo, &commit).await.unwrap();
    let first = store.generation(&repo).await.unwrap();

    pipeline.index_repository(&repo, &commit).await.unwrap();
    let second = store.generation(&repo).await.unwrap();

    assert_eq!(*first, *second);
}

#[tokio::test]
async fn trigram_search_finds_indexed_symbols() {
    let checkout = fixture_checkout();
    let store = Arc::new(IndexStore::new());
    let pipeline = IndexingPipeline::new(
        store.clone(),
        Arc::new(SourceClient::local(checkout.path())),
        None,
        Arc::new(MemoryMeteringSink::default()),
    );

    let repo = RepoId::new("acme", "shop");
    pipeline
        .index_repository(&repo, &"c".repeat(40))
        .await
        .unwrap();

    let hits = store.trigram_search(&repo, "authenticate", 10).await;
    assert!(!hits.is_empty());
    assert_eq!(hits[0].symbol.name, "Authenticate");
    assert_eq!(
        hits[0].symbol.file_path,
        "app/Http/Middleware/Authenticate.php"
    );

    // Snippet hydration would use exactly these line numbers.
    assert!(hits[0].symbol.start_line >= 1);
    assert!(hits[0].symbol.end_line > hits[0].symbol.start_line);
}

#[tokio::test]
async fn broken_files_are_recorded_without_failing_the_run() {
    let checkout = fixture_checkout();
    std::fs::write(
        checkout.path().join("routes/broken.php"),
        "<?php\nRoute::get('/x', [X::class, 'y');\n",
    )
    .unwrap();

    let store = Arc::new(IndexStore::new());
    let pipeline = IndexingPipeline::new(
        store.clone(),
        Arc::new(SourceClient::local(checkout.path())),
        None,
        Arc::new(MemoryMeteringSink::default()),
    );

    let repo = RepoId::new("acme", "shop");
    let stats = pipeline
        .index_repository(&repo, &"d".repeat(40))
        .await
        .unwrap();

    assert_eq!(stats.parse_errors, 1);
    let record = store.get_repo(&repo).await.unwrap();
    assert_eq!(record.status, RepoStatus::Ready);

    let generation = store.generation(&repo).await.unwrap();
    assert_eq!(generation.payload.parse_errors.len(), 1);
    assert!(
        generation
            .payload
            .parse_errors[0]
            .file_path
            .ends_with("broken.php")
    );
    // No routes leaked out of the unparseable file.
    assert!(
        generation
            .payload
            .routes
            .iter()
            .all(|r| !r.source_file.ends_with("broken.php"))
    );
}
