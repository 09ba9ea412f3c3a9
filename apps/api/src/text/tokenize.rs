//! Tokenizer: normalized words with naive plural folding.
//!
//! Plural folding strips exactly one trailing `s` from every token, with no exception list
//! ("bus" → "bu", "process" → "proces"). Match thresholds assume this folding.

use std::collections::HashSet;

use crate::text::normalize::{normalize, normalize_opt};

/// Set of non-empty, normalized, plural-folded tokens derived from one string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet(HashSet<String>);

impl TokenSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    /// |self ∩ other|, iterating the smaller side.
    pub fn intersection_len(&self, other: &TokenSet) -> usize {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.0.iter().filter(|t| large.0.contains(*t)).count()
    }

    /// |self ∪ other|.
    pub fn union_len(&self, other: &TokenSet) -> usize {
        self.len() + other.len() - self.intersection_len(other)
    }

    /// New set holding the tokens of both sides.
    pub fn union(&self, other: &TokenSet) -> TokenSet {
        TokenSet(self.0.union(&other.0).cloned().collect())
    }
}

impl FromIterator<String> for TokenSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        TokenSet(iter.into_iter().filter(|t| !t.is_empty()).collect())
    }
}

/// Splits `text` into its token set. Empty or whitespace-only input gives an empty set.
pub fn tokenize(text: &str) -> TokenSet {
    split_normalized(&normalize(text))
}

/// `tokenize` for optional record fields. A missing field is an empty set.
pub fn tokenize_opt(text: Option<&str>) -> TokenSet {
    split_normalized(&normalize_opt(text))
}

fn split_normalized(normalized: &str) -> TokenSet {
    normalized
        .split_whitespace()
        .map(fold_plural)
        .map(str::to_string)
        .collect()
}

fn fold_plural(token: &str) -> &str {
    token.strip_suffix('s').unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tokens: &[&str]) -> TokenSet {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_tokenize_folds_plurals_naively() {
        assert_eq!(tokenize("Développeurs Web"), set(&["developpeur", "web"]));
        assert_eq!(tokenize("bus process"), set(&["bu", "proces"]));
    }

    #[test]
    fn test_single_s_token_is_dropped() {
        // "s" folds to "" and empty tokens never enter the set.
        assert_eq!(tokenize("s"), TokenSet::default());
        assert_eq!(tokenize("l s a"), set(&["l", "a"]));
    }

    #[test]
    fn test_tokenize_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  \n\t").is_empty());
        assert!(tokenize("--//--").is_empty());
    }

    #[test]
    fn test_missing_field_is_empty_set() {
        assert!(tokenize_opt(None).is_empty());
        assert_eq!(tokenize_opt(Some("Boulangers")), tokenize("Boulanger"));
    }

    #[test]
    fn test_duplicate_words_collapse() {
        let tokens = tokenize("Agent agents AGENT");
        assert_eq!(tokens.len(), 1);
        assert!(tokens.contains("agent"));
    }

    #[test]
    fn test_intersection_and_union_len() {
        let a = tokenize("chef de projet");
        let b = tokenize("chef de cuisine");
        assert_eq!(a.intersection_len(&b), 2);
        assert_eq!(a.union_len(&b), 4);
        assert_eq!(a.union(&b).len(), 4);
    }
}
