//! Recommendation Parser: turns whatever the profile source returned into a
//! `RecommendationProfile`.
//!
//! Upstream payloads come in three shapes: already-structured JSON values, a string holding
//! JSON, or free-form generated text. The payload is classified first, then parsed with the
//! first strategy that applies:
//!
//! 1. structured list of objects or strings
//! 2. JSON text (markdown fences stripped), re-classified after decoding. Any text that
//!    decodes is JSON, scalars included, so `"null"` or `"42"` parse to an empty profile.
//! 3. numbered blocks (`1. <line>\n<line>`), second line is the primary field
//! 4. flat list split on `;` or newline
//!
//! The parser is total: malformed input yields an empty profile, never an error.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::recommendation::models::{RecommendationItem, RecommendationProfile};

/// Keys carrying the type-like (primary) field, in priority order.
const PRIMARY_KEYS: &[&str] = &["type", "study_type", "label"];
/// Keys carrying the degree-like (secondary) field, in priority order.
const SECONDARY_KEYS: &[&str] = &["degree", "diploma", "title"];
/// Keys carrying an optional skill list for job recommendations.
const SKILL_KEYS: &[&str] = &["skills", "competences"];
/// Object keys under which a wrapped recommendation list may be found.
const LIST_KEYS: &[&str] = &["recommendations", "items"];

/// JSON strings that themselves decode to JSON are followed at most this deep.
const MAX_JSON_DEPTH: u8 = 3;

// ────────────────────────────────────────────────────────────────────────────
// Classification
// ────────────────────────────────────────────────────────────────────────────

/// A raw recommendation payload after shape classification.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecommendations {
    /// A list of objects and/or strings.
    Structured(Vec<Value>),
    /// Text that decoded as JSON; re-classified when parsed.
    Json(Value),
    /// Text that is not JSON: numbered blocks or a delimited list.
    FreeText(String),
}

impl RawRecommendations {
    /// Classifies a decoded JSON value.
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Array(entries) => Self::Structured(entries),
            Value::Object(mut map) => match take_wrapped_list(&mut map) {
                Some(entries) => Self::Structured(entries),
                None => Self::Structured(vec![Value::Object(map)]),
            },
            Value::String(text) => Self::from_text(&text),
            Value::Null | Value::Bool(_) | Value::Number(_) => Self::Structured(Vec::new()),
        }
    }

    /// Classifies raw text. Every text is first tried as strict JSON (one level, fences
    /// stripped); only text that fails to decode goes to the free-text strategies.
    pub fn from_text(text: &str) -> Self {
        let unfenced = strip_json_fences(text);
        match serde_json::from_str::<Value>(unfenced) {
            Ok(value) => Self::Json(value),
            Err(e) => {
                debug!("Recommendation text is not JSON ({e}), using text strategies");
                Self::FreeText(unfenced.to_string())
            }
        }
    }
}

fn take_wrapped_list(map: &mut Map<String, Value>) -> Option<Vec<Value>> {
    LIST_KEYS.iter().find_map(|key| match map.remove(*key) {
        Some(Value::Array(entries)) => Some(entries),
        Some(other) => {
            map.insert((*key).to_string(), other);
            None
        }
        None => None,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Entry points
// ────────────────────────────────────────────────────────────────────────────

/// Which strategy produced a profile. Reported for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    Structured,
    Json,
    NumberedBlocks,
    Delimited,
    Empty,
}

/// Parser output: the profile plus the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedProfile {
    pub profile: RecommendationProfile,
    pub strategy: ParseStrategy,
}

/// Parses a classified payload into a deduplicated profile.
pub fn parse(raw: RawRecommendations) -> ParsedProfile {
    let (items, strategy) = parse_items(raw, 0);
    let strategy = if items.is_empty() {
        ParseStrategy::Empty
    } else {
        strategy
    };
    let profile = RecommendationProfile::from_items(items);
    debug!(
        "Parsed recommendation profile: {} item(s) via {:?}",
        profile.len(),
        strategy
    );
    ParsedProfile { profile, strategy }
}

/// Classifies and parses a decoded JSON value.
pub fn parse_value(value: Value) -> ParsedProfile {
    parse(RawRecommendations::classify(value))
}

/// Classifies and parses raw text.
pub fn parse_text(text: &str) -> ParsedProfile {
    parse(RawRecommendations::from_text(text))
}

fn parse_items(raw: RawRecommendations, depth: u8) -> (Vec<RecommendationItem>, ParseStrategy) {
    match raw {
        RawRecommendations::Structured(entries) => {
            (parse_structured(&entries), ParseStrategy::Structured)
        }
        RawRecommendations::Json(value) if depth < MAX_JSON_DEPTH => {
            let (items, _) = parse_items(RawRecommendations::classify(value), depth + 1);
            (items, ParseStrategy::Json)
        }
        RawRecommendations::Json(_) => (Vec::new(), ParseStrategy::Json),
        RawRecommendations::FreeText(text) => parse_free_text(&text),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Strategy 1: structured entries
// ────────────────────────────────────────────────────────────────────────────

fn parse_structured(entries: &[Value]) -> Vec<RecommendationItem> {
    entries.iter().filter_map(parse_entry).collect()
}

fn parse_entry(entry: &Value) -> Option<RecommendationItem> {
    match entry {
        Value::String(label) => RecommendationItem::flat(label),
        Value::Object(obj) => {
            let primary = first_text(obj, PRIMARY_KEYS).unwrap_or_default();
            let secondary = first_text(obj, SECONDARY_KEYS).unwrap_or_default();
            let item = RecommendationItem::paired(&primary, &secondary)?;
            Some(item.with_skills(skill_list(obj)))
        }
        _ => None,
    }
}

/// First key among `keys` holding a non-blank string (or a number, rendered as text).
fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn skill_list(obj: &Map<String, Value>) -> Vec<String> {
    SKILL_KEYS
        .iter()
        .find_map(|key| match obj.get(*key) {
            Some(Value::Array(values)) => Some(
                values
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(str::to_string)
                    .collect(),
            ),
            Some(Value::String(joined)) => Some(
                joined
                    .split([',', ';'])
                    .map(str::to_string)
                    .collect::<Vec<_>>(),
            ),
            _ => None,
        })
        .unwrap_or_default()
}

// ────────────────────────────────────────────────────────────────────────────
// Strategies 3 and 4: free text
// ────────────────────────────────────────────────────────────────────────────

fn block_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"(?m)^[ \t]*\d+\.").expect("valid block marker regex"))
}

fn line_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"^\d+\.\s*").expect("valid line marker regex"))
}

fn parse_free_text(text: &str) -> (Vec<RecommendationItem>, ParseStrategy) {
    let blocks = numbered_blocks(text);
    if !blocks.is_empty() {
        let items = blocks.into_iter().filter_map(parse_block).collect();
        return (items, ParseStrategy::NumberedBlocks);
    }
    (parse_delimited(text), ParseStrategy::Delimited)
}

/// Splits `text` at every line starting with `<digits>.`. A non-blank chunk before the first
/// marker is a block of its own. No marker at all means no blocks.
fn numbered_blocks(text: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = block_marker().find_iter(text).map(|m| m.start()).collect();
    match starts.first() {
        None => return Vec::new(),
        Some(&first) if first > 0 && !text[..first].trim().is_empty() => starts.insert(0, 0),
        Some(_) => {}
    }
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect()
}

/// Upstream writes the degree on the numbered line and the study type on the next one, so a
/// two-line block maps to `primary = line 2, secondary = line 1`.
fn parse_block(block: &str) -> Option<RecommendationItem> {
    let mut lines = block
        .lines()
        .map(|line| line_marker().replace(line.trim(), "").trim().to_string())
        .filter(|line| !line.is_empty());

    match (lines.next(), lines.next()) {
        (Some(first), Some(second)) => RecommendationItem::paired(&second, &first),
        (Some(only), None) => RecommendationItem::flat(&only),
        _ => None,
    }
}

fn parse_delimited(text: &str) -> Vec<RecommendationItem> {
    text.split([';', '\n'])
        .filter_map(RecommendationItem::flat)
        .collect()
}

/// Strips ```json ... ``` or ``` ... ``` fences that generated text often wraps JSON in.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or(stripped.trim()),
        None => text,
    }
}
