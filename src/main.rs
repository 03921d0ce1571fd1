use std::error::Error;
use std::sync::Arc;

use repolens::{IndexStore, IndexingPipeline, RepoId, SourceClient, TracingMeteringSink};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Indexes a local checkout and prints the run stats as JSON.
///
/// Environment:
/// - `REPOLENS_INDEX_PATH` — checkout directory to index (required)
/// - `REPOLENS_REPO`       — `owner/name` label (default `local/checkout`)
/// - `REPOLENS_COMMIT`     — commit label for the generation (default `workdir`)
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let path = std::env::var("REPOLENS_INDEX_PATH")
        .map_err(|_| "set REPOLENS_INDEX_PATH to a checkout directory")?;
    let repo_label = std::env::var("REPOLENS_REPO").unwrap_or_else(|_| "local/checkout".into());
    let commit = std::env::var("REPOLENS_COMMIT").unwrap_or_else(|_| "workdir".into());

    let (owner, name) = repo_label
        .split_once('/')
        .ok_or("REPOLENS_REPO must look like owner/name")?;
    let repo = RepoId::new(owner, name);

    let store = Arc::new(IndexStore::new());
    let provider = Arc::new(SourceClient::local(path));
    let pipeline =
        IndexingPipeline::new(store.clone(), provider, None, Arc::new(TracingMeteringSink));

    let stats = pipeline.index_repository(&repo, &commit).await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    let record = store.get_repo(&repo).await?;
    println!(
        "repository {} is {:?} at {}",
        repo,
        record.status,
        record.last_indexed_commit.as_deref().unwrap_or("-")
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
