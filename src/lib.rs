//! Repolens: evidence-backed repository Q&A and PR risk review.
//!
//! The root crate wires the member crates together and owns what crosses
//! all of them: the indexing pipeline, usage metering, the task scheduler
//! interface, and configuration. The trust pipeline is strict:
//!
//! 1. **Detection** — `laravel-indexer` and `risk-analyzer` produce ground
//!    truth deterministically.
//! 2. **Retrieval** — `index-store` + `vector-store` find it again.
//! 3. **Explanation** — `qa-engine` lets a language model phrase it, bound
//!    to numbered sources and validated.
//!
//! The model never detects facts and never invents locations.

pub mod config;
pub mod metering;
pub mod pipeline;
pub mod scheduler;
pub mod service;

pub use config::AppConfig;
pub use metering::{
    MemoryMeteringSink, MeterEventKind, MeteringSink, TracingMeteringSink, UsageEvent,
};
pub use pipeline::{IndexStats, IndexingPipeline, PipelineError, VectorBackend};
pub use risk_analyzer::DEFAULT_SKIP_PATHS;
pub use scheduler::{NullScheduler, QueueScheduler, Scheduler};
pub use service::RepolensService;

pub use git_source::{GitHubConfig, RepoRef, SourceClient};
pub use index_store::{IndexStore, RepoId, RepoStatus};
pub use laravel_indexer::extract_file;
pub use llm_service::LlmClient;
pub use pr_review::{ReviewOrchestrator, ReviewReport, Verdict};
pub use qa_engine::{Answer, ConfidenceTier, QaEngine};
pub use risk_analyzer::RiskAnalyzer;
pub use vector_store::{NoopEmbedder, VectorStore};
