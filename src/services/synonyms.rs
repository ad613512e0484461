//! Static synonym table for debugging vocabulary.

use std::collections::HashSet;

/// Debugging terms and the related terms they widen to.
static SYNONYMS: &[(&str, &[&str])] = &[
    ("bug", &["error", "exception", "issue", "problem", "fault", "defect"]),
    ("error", &["bug", "exception", "issue", "problem", "fault"]),
    ("exception", &["error", "bug", "issue", "problem"]),
    ("fix", &["solve", "resolve", "repair", "patch", "solution"]),
    ("permission", &["access", "denied", "forbidden", "unauthorized"]),
    ("import", &["module", "package", "dependency", "require"]),
    ("type", &["typeerror", "typing", "typecheck", "cast"]),
    ("null", &["none", "nil", "undefined", "empty"]),
    ("crash", &["failure", "abort", "terminate", "halt"]),
];

/// Expands query terms with related debugging vocabulary.
///
/// Expansion is applied at query time only; the keyword index stores the
/// literal terms of each record.
#[derive(Debug, Clone, Copy, Default)]
pub struct SynonymExpander;

impl SynonymExpander {
    /// Creates an expander over the built-in table.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the synonyms of a single lowercase term.
    #[must_use]
    pub fn synonyms_of(&self, term: &str) -> &'static [&'static str] {
        SYNONYMS
            .iter()
            .find(|(key, _)| *key == term)
            .map_or(&[], |(_, synonyms)| *synonyms)
    }

    /// Returns `terms` followed by their synonyms, without duplicates.
    ///
    /// Original terms keep their order and come first. Synonyms are followed
    /// transitively (`error` reaches `defect` through `bug`), so expanding an
    /// already expanded list returns it unchanged.
    #[must_use]
    pub fn expand(&self, terms: &[String]) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut expanded: Vec<String> = Vec::with_capacity(terms.len());

        for term in terms {
            if seen.insert(term.as_str()) {
                expanded.push(term.clone());
            }
        }

        let mut cursor = 0;
        while cursor < expanded.len() {
            for synonym in self.synonyms_of(&expanded[cursor]) {
                if seen.insert(synonym) {
                    expanded.push((*synonym).to_string());
                }
            }
            cursor += 1;
        }
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn test_expand_adds_synonyms_after_originals() {
        let expanded = SynonymExpander::new().expand(&terms(&["bug", "timeout"]));
        assert_eq!(&expanded[..2], &["bug".to_string(), "timeout".to_string()]);
        assert!(expanded.contains(&"error".to_string()));
        assert!(expanded.contains(&"defect".to_string()));
        assert_eq!(expanded.iter().filter(|t| *t == "bug").count(), 1);
    }

    #[test]
    fn test_expand_unknown_terms_is_identity() {
        let input = terms(&["segfault", "pointer"]);
        assert_eq!(SynonymExpander::new().expand(&input), input);
    }

    #[test]
    fn test_expand_is_order_insensitive_as_a_set() {
        let expander = SynonymExpander::new();
        let a: HashSet<String> = expander.expand(&terms(&["null", "crash"])).into_iter().collect();
        let b: HashSet<String> = expander.expand(&terms(&["crash", "null"])).into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bug_and_error_share_vocabulary() {
        let expander = SynonymExpander::new();
        assert!(expander.synonyms_of("bug").contains(&"error"));
        assert!(expander.synonyms_of("error").contains(&"bug"));
        assert!(expander.synonyms_of("missing").is_empty());
    }

    #[test]
    fn test_expand_is_idempotent() {
        let expander = SynonymExpander::new();
        let once = expander.expand(&terms(&["error", "import"]));
        assert!(once.contains(&"defect".to_string()));
        assert_eq!(expander.expand(&once), once);
    }

    #[test]
    fn test_duplicate_input_terms_collapse() {
        let expanded = SynonymExpander::new().expand(&terms(&["fix", "fix"]));
        assert_eq!(expanded.iter().filter(|t| *t == "fix").count(), 1);
        assert_eq!(expanded.len(), 6);
    }
}
