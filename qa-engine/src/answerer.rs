//! The constrained answerer.
//!
//! Composes the numbered-source prompt, invokes the language model under a
//! deadline, validates the structured output, and renders the final answer
//! with bracketed citations. Zero retrieved sources means no model call at
//! all: the "insufficient evidence" answer is a first-class value.

use std::pin::Pin;
use std::time::Duration;

use llm_service::{Generation, LlmClient, LlmError};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::QaConfig;
use crate::errors::{QaError, QaResult};
use crate::prompt::{RETRY_REMINDER, build_prompt};
use crate::retriever::RetrievedSource;
use crate::validate::{ConfidenceTier, ValidatedAnswer, parse_answer_json, validate_answer};

/// Abstract phrasing model: prompt in, text plus token usage out.
///
/// The model never detects facts and never invents locations; everything it
/// may say is bounded by the numbered sources in the prompt.
pub trait LanguageModel: Send + Sync {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        max_tokens: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Generation, LlmError>> + Send + 'a>>;
}

impl LanguageModel for LlmClient {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        max_tokens: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Generation, LlmError>> + Send + 'a>> {
        Box::pin(self.generate(prompt, max_tokens))
    }
}

/// Token usage of one answering pass (all model calls included).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    fn add(&mut self, generation: &Generation) {
        self.input_tokens += generation.input_tokens;
        self.output_tokens += generation.output_tokens;
    }
}

/// One citation backing the rendered answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Citation {
    pub source_index: usize,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub snippet: String,
    pub symbol_name: Option<String>,
}

/// Final Q&A result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub answer_text: String,
    pub citations: Vec<Citation>,
    pub validated: ValidatedAnswer,
    pub usage: TokenUsage,
}

impl Answer {
    pub fn has_sufficient_evidence(&self) -> bool {
        self.validated.confidence_tier != ConfidenceTier::None
    }
}

/// Generates a validated answer for a question over retrieved sources.
///
/// Parse failures get one salvage attempt (balanced braces) and then one
/// full retry with a reminder appended; a second failure degrades to the
/// typed "no structured answer" result instead of raising.
pub async fn answer_question(
    model: &dyn LanguageModel,
    question: &str,
    sources: &[RetrievedSource],
    cfg: &QaConfig,
) -> QaResult<Answer> {
    if sources.is_empty() {
        debug!(question, "no sources retrieved, skipping model call");
        return Ok(no_evidence_answer(question));
    }

    let prompt = build_prompt(question, sources);
    let deadline = Duration::from_secs(cfg.llm_timeout_secs);
    let mut usage = TokenUsage::default();

    let generation = call_model(model, &prompt, cfg.answer_max_tokens, deadline).await?;
    usage.add(&generation);
    let mut parsed = parse_answer_json(&generation.text);

    let mut attempts_left = cfg.retry_on_parse_failure;
    while parsed.is_none() && attempts_left > 0 {
        warn!(question, "model output was not valid JSON, retrying once");
        attempts_left -= 1;
        let retry_prompt = format!("{prompt}{RETRY_REMINDER}");
        let generation =
            call_model(model, &retry_prompt, cfg.answer_max_tokens, deadline).await?;
        usage.add(&generation);
        parsed = parse_answer_json(&generation.text);
    }

    let validated = match parsed {
        Some(value) => validate_answer(&value, sources),
        None => ValidatedAnswer::unparseable(),
    };

    let citations = build_citations(sources, &validated);
    Ok(Answer {
        answer_text: render_answer(&validated),
        citations,
        validated,
        usage,
    })
}

/// Short phrasing pass used by the review orchestrator for critical
/// findings: an explanation and a suggested fix, a few sentences at most.
pub async fn phrase_finding(
    model: &dyn LanguageModel,
    reason: &str,
    file_path: &str,
    snippet: &str,
    cfg: &QaConfig,
) -> QaResult<(String, TokenUsage)> {
    let prompt = format!(
        "Explain this security finding in 2 sentences and suggest a fix in 1 sentence.\n\n\
         Finding: {reason}\nFile: {file_path}\nCode: {snippet}\n\nBe concise and actionable."
    );
    let generation = call_model(
        model,
        &prompt,
        150,
        Duration::from_secs(cfg.llm_timeout_secs),
    )
    .await?;
    let usage = TokenUsage {
        input_tokens: generation.input_tokens,
        output_tokens: generation.output_tokens,
    };
    Ok((generation.text.trim().to_string(), usage))
}

async fn call_model(
    model: &dyn LanguageModel,
    prompt: &str,
    max_tokens: u32,
    deadline: Duration,
) -> QaResult<Generation> {
    timeout(deadline, model.generate(prompt, max_tokens))
        .await
        .map_err(|_| QaError::Timeout {
            stage: "llm generation",
            secs: deadline.as_secs(),
        })?
        .map_err(QaError::from)
}

/// Renders sections with trailing `[n]` references plus the unknowns block.
pub fn render_answer(validated: &ValidatedAnswer) -> String {
    let mut parts: Vec<String> = validated
        .sections
        .iter()
        .map(|section| {
            let refs = section
                .source_ids
                .iter()
                .map(|id| format!("[{id}]"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} {}", section.text, refs)
        })
        .collect();

    if !validated.unknowns.is_empty() {
        let mut block = String::from("**Could not determine:**");
        for unknown in &validated.unknowns {
            block.push_str(&format!("\n- {unknown}"));
        }
        parts.push(block);
    }
    parts.join("\n\n")
}

fn build_citations(sources: &[RetrievedSource], validated: &ValidatedAnswer) -> Vec<Citation> {
    let cited: std::collections::BTreeSet<usize> = validated
        .sections
        .iter()
        .flat_map(|s| s.source_ids.iter().copied())
        .collect();
    sources
        .iter()
        .filter(|s| cited.contains(&s.source_index))
        .map(|s| Citation {
            source_index: s.source_index,
            file_path: s.file_path.clone(),
            start_line: s.start_line,
            end_line: s.end_line,
            snippet: s.content.chars().take(500).collect(),
            symbol_name: s.symbol_name.clone(),
        })
        .collect()
}

/// The typed zero-evidence result: no model call, unknowns echo the question.
pub fn no_evidence_answer(question: &str) -> Answer {
    Answer {
        answer_text: format!(
            "I could not find enough evidence in the codebase to answer: \"{question}\"\n\n\
             Try asking about specific class or function names."
        ),
        citations: Vec::new(),
        validated: ValidatedAnswer {
            sections: Vec::new(),
            unknowns: vec![question.to_string()],
            confidence_tier: ConfidenceTier::None,
            confidence_factors: Default::default(),
            validation_passed: false,
            validation_errors: Vec::new(),
        },
        usage: TokenUsage::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::SourceType;
    use std::sync::Mutex;

    /// Scripted model: pops canned responses, records prompts.
    struct ScriptedModel {
        responses: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<&str>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().rev().map(String::from).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl LanguageModel for ScriptedModel {
        fn generate<'a>(
            &'a self,
            prompt: &'a str,
            _max_tokens: u32,
        ) -> Pin<Box<dyn Future<Output = Result<Generation, LlmError>> + Send + 'a>> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let text = self
                .responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| "{}".to_string());
            Box::pin(async move {
                Ok(Generation {
                    text,
                    input_tokens: 100,
                    output_tokens: 10,
                })
            })
        }
    }

    fn source(index: usize, file: &str) -> RetrievedSource {
        RetrievedSource {
            source_index: index,
            file_path: file.to_string(),
            start_line: 1,
            end_line: 25,
            content: "class Authenticate {}".to_string(),
            symbol_name: None,
            score: 0.8,
            source_type: SourceType::Both,
        }
    }

    fn sources3() -> Vec<RetrievedSource> {
        vec![
            source(1, "app/Http/Middleware/Authenticate.php"),
            source(2, "app/Http/Kernel.php"),
            source(3, "app/Http/Middleware/EnsureUserIsActive.php"),
        ]
    }

    #[tokio::test]
    async fn valid_output_produces_high_tier_with_references() {
        let model = ScriptedModel::new(vec![
            r#"{"sections": [
                {"text": "Requests pass the Authenticate middleware.", "source_ids": [1]},
                {"text": "The api group registers it.", "source_ids": [2]},
                {"text": "Active users are enforced separately.", "source_ids": [3]}
            ], "unknowns": []}"#,
        ]);
        let answer = answer_question(&model, "How does authentication work?", &sources3(), &QaConfig::default())
            .await
            .unwrap();

        assert_eq!(answer.validated.confidence_tier, ConfidenceTier::High);
        assert_eq!(answer.validated.sections.len(), 3);
        assert!(answer.answer_text.contains("[1]"));
        assert!(answer.answer_text.contains("[2]"));
        assert!(answer.answer_text.contains("[3]"));
        assert_eq!(answer.citations.len(), 3);
        assert_eq!(answer.usage.input_tokens, 100);
        assert!(answer.has_sufficient_evidence());
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn parse_failure_retries_once_with_reminder() {
        let model = ScriptedModel::new(vec![
            "sorry, I cannot produce JSON",
            r#"{"sections": [{"text": "claim", "source_ids": [1]}], "unknowns": []}"#,
        ]);
        let answer = answer_question(&model, "q", &sources3(), &QaConfig::default())
            .await
            .unwrap();

        assert_eq!(model.calls(), 2);
        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[1].ends_with(RETRY_REMINDER));
        assert_eq!(answer.validated.confidence_tier, ConfidenceTier::Low);
        // Usage accumulates across both calls.
        assert_eq!(answer.usage.input_tokens, 200);
    }

    #[tokio::test]
    async fn double_parse_failure_degrades_to_none() {
        let model = ScriptedModel::new(vec!["not json", "still not json"]);
        let answer = answer_question(&model, "q", &sources3(), &QaConfig::default())
            .await
            .unwrap();

        assert_eq!(model.calls(), 2);
        assert_eq!(answer.validated.confidence_tier, ConfidenceTier::None);
        assert!(!answer.validated.validation_passed);
        assert!(!answer.has_sufficient_evidence());
    }

    #[tokio::test]
    async fn zero_sources_skip_the_model_entirely() {
        let model = ScriptedModel::new(vec![]);
        let answer = answer_question(&model, "What is the billing flow?", &[], &QaConfig::default())
            .await
            .unwrap();

        assert_eq!(model.calls(), 0);
        assert_eq!(answer.validated.confidence_tier, ConfidenceTier::None);
        assert_eq!(answer.validated.unknowns, vec!["What is the billing flow?"]);
        assert_eq!(answer.usage, TokenUsage::default());
    }

    #[tokio::test]
    async fn unknowns_render_in_a_dedicated_block() {
        let model = ScriptedModel::new(vec![
            r#"{"sections": [{"text": "claim", "source_ids": [1, 2]}],
                "unknowns": ["where reset emails are sent"]}"#,
        ]);
        let answer = answer_question(&model, "q", &sources3(), &QaConfig::default())
            .await
            .unwrap();
        assert!(answer.answer_text.contains("**Could not determine:**"));
        assert!(answer.answer_text.contains("- where reset emails are sent"));
    }

    #[tokio::test]
    async fn phrasing_pass_returns_trimmed_text_and_usage() {
        let model = ScriptedModel::new(vec!["  Rotate the key and purge history.  "]);
        let (text, usage) = phrase_finding(
            &model,
            "Stripe Live Secret Key detected",
            "config/services.php",
            "'key' => 'sk_l****'",
            &QaConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(text, "Rotate the key and purge history.");
        assert_eq!(usage.output_tokens, 10);
    }
}
