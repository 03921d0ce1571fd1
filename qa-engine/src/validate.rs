//! Validation of untrusted model output.
//!
//! The model's JSON is parsed leniently, then every section is checked
//! against the supplied source set: unknown ids are dropped, id-less or
//! empty sections are dropped, and the surviving citations drive the
//! discrete confidence tier.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::retriever::RetrievedSource;

/// Discrete confidence label computed from citation coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
    None,
}

/// One validated answer section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerSection {
    pub text: String,
    pub source_ids: Vec<usize>,
}

/// Inspection counters behind the tier decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfidenceFactors {
    pub citation_count: usize,
    pub unique_files: usize,
    /// A cited path looks like an entry point (controller or route file).
    pub has_entrypoints: bool,
    pub section_count: usize,
}

/// A fully validated answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedAnswer {
    pub sections: Vec<AnswerSection>,
    pub unknowns: Vec<String>,
    pub confidence_tier: ConfidenceTier,
    pub confidence_factors: ConfidenceFactors,
    pub validation_passed: bool,
    pub validation_errors: Vec<String>,
}

impl ValidatedAnswer {
    /// The degraded result used when parsing failed twice.
    pub fn unparseable() -> Self {
        Self {
            sections: Vec::new(),
            unknowns: vec!["Failed to generate structured answer".to_string()],
            confidence_tier: ConfidenceTier::None,
            confidence_factors: ConfidenceFactors::default(),
            validation_passed: false,
            validation_errors: vec!["JSON parsing failed".to_string()],
        }
    }
}

/// Parses the model output as JSON; on failure, retries on the first
/// balanced `{...}` block found in the text.
pub fn parse_answer_json(response: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(response) {
        return Some(value);
    }
    let candidate = balanced_braces(response)?;
    serde_json::from_str(candidate).ok()
}

/// Returns the first balanced top-level `{...}` slice, respecting strings.
fn balanced_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        match b {
            _ if escaped => escaped = false,
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Validates a parsed answer against the supplied sources.
pub fn validate_answer(parsed: &Value, sources: &[RetrievedSource]) -> ValidatedAnswer {
    let valid_ids: BTreeSet<usize> = sources.iter().map(|s| s.source_index).collect();
    let mut errors = Vec::new();
    let mut sections = Vec::new();

    let empty = Vec::new();
    let raw_sections = parsed
        .get("sections")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    for (i, raw) in raw_sections.iter().enumerate() {
        let text = raw
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if text.is_empty() {
            errors.push(format!("section {i} has no text"));
            continue;
        }

        let raw_ids: Vec<usize> = raw
            .get("source_ids")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_u64)
                    .map(|v| v as usize)
                    .collect()
            })
            .unwrap_or_default();
        if raw_ids.is_empty() {
            errors.push(format!("section {i} has no source_ids"));
            continue;
        }

        let invalid: Vec<usize> = raw_ids
            .iter()
            .copied()
            .filter(|id| !valid_ids.contains(id))
            .collect();
        if !invalid.is_empty() {
            errors.push(format!("section {i} references invalid source_ids: {invalid:?}"));
        }
        let source_ids: Vec<usize> = raw_ids
            .into_iter()
            .filter(|id| valid_ids.contains(id))
            .collect();
        if !source_ids.is_empty() {
            sections.push(AnswerSection { text, source_ids });
        }
    }

    let unknowns = parsed
        .get("unknowns")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let (confidence_tier, confidence_factors) = calculate_confidence(&sections, sources);

    debug!(
        sections = sections.len(),
        errors = errors.len(),
        tier = ?confidence_tier,
        "answer validated"
    );

    ValidatedAnswer {
        validation_passed: errors.is_empty(),
        sections,
        unknowns,
        confidence_tier,
        confidence_factors,
        validation_errors: errors,
    }
}

/// Confidence rule: `high` iff ≥ 3 distinct citations across ≥ 2 files,
/// `medium` iff ≥ 2 citations, `low` iff exactly 1, else `none`.
fn calculate_confidence(
    sections: &[AnswerSection],
    sources: &[RetrievedSource],
) -> (ConfidenceTier, ConfidenceFactors) {
    let cited: BTreeSet<usize> = sections
        .iter()
        .flat_map(|s| s.source_ids.iter().copied())
        .collect();
    let cited_sources: Vec<&RetrievedSource> = sources
        .iter()
        .filter(|s| cited.contains(&s.source_index))
        .collect();
    let files: BTreeSet<&str> = cited_sources.iter().map(|s| s.file_path.as_str()).collect();
    let has_entrypoints = cited_sources.iter().any(|s| {
        let lower = s.file_path.to_lowercase();
        lower.contains("controller") || lower.contains("route")
    });

    let factors = ConfidenceFactors {
        citation_count: cited.len(),
        unique_files: files.len(),
        has_entrypoints,
        section_count: sections.len(),
    };

    let tier = if cited.len() >= 3 && files.len() >= 2 {
        ConfidenceTier::High
    } else if cited.len() >= 2 {
        ConfidenceTier::Medium
    } else if cited.len() == 1 {
        ConfidenceTier::Low
    } else {
        ConfidenceTier::None
    };
    (tier, factors)
}
