//! Application configuration aggregated from the environment.

use git_source::GitHubConfig;
use llm_service::ModelConfig;
use pr_review::ReviewConfig;
use qa_engine::QaConfig;
use vector_store::VectorConfig;

/// All knobs in one bag; every field has a default via `from_env`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub github: GitHubConfig,
    pub vector: VectorConfig,
    pub qa: QaConfig,
    pub review: ReviewConfig,
    pub generation_model: ModelConfig,
    pub embedding_model: ModelConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            github: GitHubConfig::from_env(),
            vector: VectorConfig::from_env(),
            qa: QaConfig::from_env(),
            review: ReviewConfig::from_env(),
            generation_model: ModelConfig::generation_from_env(),
            embedding_model: ModelConfig::embedding_from_env(),
        }
    }
}
