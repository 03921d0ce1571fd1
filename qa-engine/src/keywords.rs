//! Content keyword extraction for the trigram leg.

/// Question words and glue that carry no search signal.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "how", "what", "where", "when",
    "why", "which", "who", "does", "do", "did", "has", "have", "had", "in", "on", "at", "to",
    "for", "of", "with", "by",
];

/// Lowercases, tokenizes on word boundaries, drops stopwords and tokens
/// shorter than 3 characters, keeps at most 5 keywords.
pub fn extract_keywords(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(w))
        .take(5)
        .map(str::to_string)
        .collect()
}
