//! Metered front door for the two user-facing operations.
//!
//! Thin composition over the Q&A engine and the review orchestrator: run
//! the operation, record one usage event with its token counts, hand the
//! result back untouched.

use std::sync::Arc;

use git_source::RepoRef;
use index_store::RepoId;
use pr_review::{ReviewOrchestrator, ReviewOutcome, ReviewResult};
use qa_engine::{Answer, QaEngine, QaResult};

use crate::metering::{MeterEventKind, MeteringSink, UsageEvent};

pub struct RepolensService {
    qa: QaEngine,
    reviewer: ReviewOrchestrator,
    metering: Arc<dyn MeteringSink>,
}

impl RepolensService {
    pub fn new(
        qa: QaEngine,
        reviewer: ReviewOrchestrator,
        metering: Arc<dyn MeteringSink>,
    ) -> Self {
        Self {
            qa,
            reviewer,
            metering,
        }
    }

    /// Answers a question and meters the call.
    pub async fn ask(&self, repo: &RepoId, question: &str) -> QaResult<Answer> {
        let answer = self.qa.ask(repo, question).await?;
        self.metering.record(
            UsageEvent::new(MeterEventKind::Question)
                .tokens(
                    answer.usage.input_tokens as u64,
                    answer.usage.output_tokens as u64,
                    0,
                )
                .metadata(serde_json::json!({
                    "repo": repo.full_name(),
                    "tier": answer.validated.confidence_tier,
                    "citations": answer.citations.len(),
                })),
        );
        Ok(answer)
    }

    /// Reviews a pull request and meters the call.
    pub async fn review_pr(&self, repo: &RepoRef, pr_number: u64) -> ReviewResult<ReviewOutcome> {
        let outcome = self.reviewer.review_pr(repo, pr_number).await?;
        self.metering.record(
            UsageEvent::new(MeterEventKind::PrReview)
                .tokens(
                    outcome.usage.input_tokens as u64,
                    outcome.usage.output_tokens as u64,
                    0,
                )
                .metadata(serde_json::json!({
                    "repo": repo.full_name(),
                    "pr": pr_number,
                    "verdict": outcome.report.verdict,
                    "critical": outcome.report.counts.critical,
                })),
        );
        Ok(outcome)
    }
}
