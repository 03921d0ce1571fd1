//! Prompt assembly for the constrained answerer.
//!
//! The model is a phrasing engine, not a source of facts: it receives
//! numbered sources and must emit JSON whose every section cites them.

use crate::retriever::RetrievedSource;

/// Instruction block demanding schema-conformant, citation-bound output.
pub const ANSWER_INSTRUCTIONS: &str = r#"You are a code analysis assistant. Answer the question based ONLY on the provided sources.

CRITICAL RULES:
1. You MUST output valid JSON matching the schema below
2. Every claim MUST reference at least one source_id
3. If you cannot answer part of the question, put it in "unknowns"
4. Do NOT invent file paths or line numbers
5. Do NOT make claims without source evidence

OUTPUT SCHEMA:
{
    "sections": [
        {"text": "The authentication flow starts in...", "source_ids": [1, 3]},
        {"text": "Passwords are hashed using bcrypt...", "source_ids": [2]}
    ],
    "unknowns": [
        "I could not find where password reset emails are sent"
    ]
}"#;

/// Reminder appended on the single retry after a parse failure.
pub const RETRY_REMINDER: &str = "\n\nRemember: Output ONLY valid JSON.";

/// Renders one source as `[Source N] path:start-end (symbol)` plus a fenced
/// content block.
pub fn render_source(source: &RetrievedSource) -> String {
    let symbol = source
        .symbol_name
        .as_deref()
        .map(|s| format!(" ({s})"))
        .unwrap_or_default();
    format!(
        "[Source {}] {}:{}-{}{}\n```\n{}\n```",
        source.source_index,
        source.file_path,
        source.start_line,
        source.end_line,
        symbol,
        source.content
    )
}

/// Builds the full prompt: instructions, sources, question, output demand.
pub fn build_prompt(question: &str, sources: &[RetrievedSource]) -> String {
    let sources_text = sources
        .iter()
        .map(render_source)
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "{ANSWER_INSTRUCTIONS}\n\nSOURCES:\n{sources_text}\n\nQUESTION: {question}\n\nRespond with ONLY the JSON object, no other text:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::SourceType;

    fn source(index: usize) -> RetrievedSource {
        RetrievedSource {
            source_index: index,
            file_path: "app/Http/Middleware/Authenticate.php".to_string(),
            start_line: 1,
            end_line: 25,
            content: "class Authenticate {}".to_string(),
            symbol_name: Some("App\\Http\\Middleware\\Authenticate".to_string()),
            score: 0.9,
            source_type: SourceType::Both,
        }
    }

    #[test]
    fn sources_are_numbered_with_location_headers() {
        let rendered = render_source(&source(3));
        assert!(rendered.starts_with(
            "[Source 3] app/Http/Middleware/Authenticate.php:1-25 (App\\Http\\Middleware\\Authenticate)"
        ));
        assert!(rendered.contains("```\nclass Authenticate {}\n```"));
    }

    #[test]
    fn prompt_contains_question_and_schema() {
        let prompt = build_prompt("How does authentication work?", &[source(1)]);
        assert!(prompt.contains("QUESTION: How does authentication work?"));
        assert!(prompt.contains("\"source_ids\""));
        assert!(prompt.contains("[Source 1]"));
        assert!(prompt.ends_with("no other text:"));
    }
}
