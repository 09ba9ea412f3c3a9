//! Text Normalizer: canonical lower-case ASCII form used for keys and tokens.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalizes a raw string.
///
/// 1. lower-case
/// 2. NFD decomposition, combining marks dropped ("é" → "e")
/// 3. anything outside `[a-z0-9]` and whitespace becomes a space
/// 4. whitespace runs collapsed, ends trimmed
///
/// Total and idempotent. Empty or punctuation-only input yields `""`.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `normalize` for optional catalog fields. A missing field is the empty string.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}
