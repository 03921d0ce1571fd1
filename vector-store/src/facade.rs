//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! All Qdrant interactions live behind this small facade, using the
//! builder-based client (`qdrant_client::Qdrant`).

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, Filter, PointStruct, SearchParamsBuilder,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use tracing::trace;

use crate::config::VectorConfig;
use crate::errors::VectorStoreError;

/// Minimal facade over the Qdrant client.
pub struct QdrantFacade {
    client: Qdrant,
    collection: String,
    dimension: usize,
    exact: bool,
}

impl QdrantFacade {
    /// Creates a facade from the given configuration.
    ///
    /// # Errors
    /// Returns `VectorStoreError::Config` for invalid config and wraps
    /// client init failures as `VectorStoreError::Qdrant`.
    pub fn new(cfg: &VectorConfig) -> Result<Self, VectorStoreError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| VectorStoreError::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
            dimension: cfg.dimension,
            exact: cfg.exact_search,
        })
    }

    /// Ensures the collection exists with the deployment's vector space.
    pub async fn ensure_collection(&self) -> Result<(), VectorStoreError> {
        trace!(
            collection = %self.collection,
            dimension = self.dimension,
            "ensure_collection"
        );
        if self.client.collection_info(&self.collection).await.is_ok() {
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(
                    VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                ),
            )
            .await
            .map_err(|e| VectorStoreError::Qdrant(e.to_string()))?;
        trace!(collection = %self.collection, "collection created");
        Ok(())
    }

    /// Upserts a batch of points and waits for completion.
    pub async fn upsert_points(&self, points: Vec<PointStruct>) -> Result<(), VectorStoreError> {
        trace!(count = points.len(), "upsert_points");
        if points.is_empty() {
            return Ok(());
        }
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| VectorStoreError::Qdrant(e.to_string()))?;
        Ok(())
    }

    /// Similarity search returning `(score, payload)` tuples, descending.
    pub async fn search(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: Option<Filter>,
    ) -> Result<Vec<(f32, serde_json::Value)>, VectorStoreError> {
        trace!(top_k, exact = self.exact, "search");

        let mut builder =
            SearchPointsBuilder::new(&self.collection, vector, top_k).with_payload(true);
        if let Some(f) = filter {
            builder = builder.filter(f);
        }
        if self.exact {
            builder = builder.params(SearchParamsBuilder::default().exact(true));
        }

        let res = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| VectorStoreError::Qdrant(e.to_string()))?;

        let mut out = Vec::with_capacity(res.result.len());
        for point in res.result {
            let payload = point
                .payload
                .into_iter()
                .map(|(k, v)| (k, v.into_json()))
                .collect::<serde_json::Map<_, _>>();
            out.push((point.score, serde_json::Value::Object(payload)));
        }
        trace!(hits = out.len(), "search done");
        Ok(out)
    }
}
