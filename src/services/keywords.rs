//! Keyword tokenization shared by indexing and querying.
//!
//! Text is split on every character that is neither alphanumeric nor `_`,
//! lowercased, and filtered to tokens of at least three characters that are
//! not generic English filler. Debugging vocabulary such as `error`, `bug`,
//! `exception`, or `none` is never filtered.

use std::collections::HashSet;

/// Minimum token length in characters.
pub const MIN_KEYWORD_LENGTH: usize = 3;

/// Maximum number of keywords indexed per record.
pub const MAX_KEYWORDS_PER_RECORD: usize = 30;

/// Generic filler: articles, common prepositions, copulas, and auxiliaries.
static STOP_WORDS: &[&str] = &[
    "the", "are", "was", "were", "been", "for", "with", "from", "and", "not", "this", "that",
    "can", "could", "would", "should", "have", "has", "had",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Splits `text` into lowercase search tokens, keeping duplicates and order.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|word| word.chars().count() >= MIN_KEYWORD_LENGTH)
        .map(str::to_lowercase)
        .filter(|word| !is_stop_word(word))
        .collect()
}

/// Extracts the de-duplicated keywords of `text` in first-occurrence order,
/// capped at [`MAX_KEYWORDS_PER_RECORD`].
#[must_use]
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|word| seen.insert(word.clone()))
        .take(MAX_KEYWORDS_PER_RECORD)
        .collect()
}
