// Recommendation profile: payload classification, multi-strategy parsing, dedup.
// Parsing never fails; an empty profile is the only failure mode.

pub mod dedup;
pub mod models;
pub mod parser;

pub use models::{RecommendationItem, RecommendationProfile};
pub use parser::{parse, parse_text, parse_value, ParseStrategy, ParsedProfile, RawRecommendations};
