//! Trigram similarity in the pg_trgm style.
//!
//! Strings are lowercased and split into alphanumeric words; each word is
//! padded with two leading and one trailing space before 3-grams are taken.
//! Similarity is the Jaccard ratio of the two trigram sets.

use std::collections::BTreeSet;

/// Similarity threshold matching the `%` operator default.
pub const SIMILARITY_THRESHOLD: f32 = 0.3;

/// Extracts the padded trigram set of a string.
pub fn trigrams(text: &str) -> BTreeSet<[char; 3]> {
    let mut out = BTreeSet::new();
    let lower = text.to_lowercase();
    for word in lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = "  "
            .chars()
            .chain(word.chars())
            .chain(" ".chars())
            .collect();
        for window in padded.windows(3) {
            out.insert([window[0], window[1], window[2]]);
        }
    }
    out
}

/// Jaccard similarity of two trigram sets.
pub fn set_similarity(a: &BTreeSet<[char; 3]>, b: &BTreeSet<[char; 3]>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    if union == 0 {
        0.0
    } else {
        shared as f32 / union as f32
    }
}

/// Convenience: similarity of two strings.
pub fn similarity(a: &str, b: &str) -> f32 {
    set_similarity(&trigrams(a), &trigrams(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_have_similarity_one() {
        assert_eq!(similarity("Authenticate", "Authenticate"), 1.0);
    }

    #[test]
    fn disjoint_strings_have_similarity_zero() {
        assert_eq!(similarity("zzzz", "quux"), 0.0);
    }

    #[test]
    fn close_names_clear_the_threshold() {
        assert!(similarity("authenticate", "authentication") >= SIMILARITY_THRESHOLD);
        assert!(similarity("UserController", "user controller") >= SIMILARITY_THRESHOLD);
    }

    #[test]
    fn unrelated_names_fall_below_the_threshold() {
        assert!(similarity("PaymentWebhook", "login") < SIMILARITY_THRESHOLD);
    }

    #[test]
    fn case_and_separators_are_normalized() {
        assert_eq!(similarity("App\\Http\\Kernel", "app http kernel"), 1.0);
    }

    #[test]
    fn empty_input_is_never_similar() {
        assert_eq!(similarity("", "anything"), 0.0);
    }
}
