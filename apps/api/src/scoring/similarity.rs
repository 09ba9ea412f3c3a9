//! Token-set similarity primitives.

use crate::text::{tokenize, TokenSet};

/// Jaccard index `|a ∩ b| / |a ∪ b|`. Zero when either side is empty.
pub fn jaccard(a: &TokenSet, b: &TokenSet) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection_len(b);
    intersection as f64 / a.union_len(b) as f64
}

/// Share of `needles` found in `haystack`: `|needles ∩ haystack| / |needles|`.
/// Zero when `needles` is empty.
pub fn overlap_ratio(needles: &TokenSet, haystack: &TokenSet) -> f64 {
    if needles.is_empty() {
        return 0.0;
    }
    needles.intersection_len(haystack) as f64 / needles.len() as f64
}

/// Symmetric lexical similarity of two raw strings, in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    jaccard(&tokenize(a), &tokenize(b))
}
