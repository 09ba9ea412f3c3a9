use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::config::RankingSettings;

/// A record fetched from a catalog. Opaque to the engine apart from its identity key and the
/// text fields its scorer reads.
pub trait CatalogRecord: Send + Sync + 'static {
    fn identity(&self) -> &str;
}

/// A job posting. Matching text is `title + " " + rome_code`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, alias = "intitule", deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, alias = "romeCode", deserialize_with = "lenient_text")]
    pub rome_code: Option<String>,
    /// Every other field, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobPosting {
    pub fn matching_text(&self) -> String {
        format!(
            "{} {}",
            self.title.as_deref().unwrap_or_default(),
            self.rome_code.as_deref().unwrap_or_default()
        )
    }
}

impl CatalogRecord for JobPosting {
    fn identity(&self) -> &str {
        &self.id
    }
}

/// A training program, matched on its main label and its certification/diploma label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingProgram {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, alias = "title", deserialize_with = "lenient_text")]
    pub label: Option<String>,
    #[serde(default, alias = "certification", deserialize_with = "lenient_text")]
    pub secondary_label: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogRecord for TrainingProgram {
    fn identity(&self) -> &str {
        &self.id
    }
}

/// A record with its best score against the profile, in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord<R> {
    pub record: R,
    pub score: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Per-catalog policy
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Jobs,
    Trainings,
}

/// What to show when the profile was fetched but holds no recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyProfilePolicy {
    /// Show the page unranked.
    Passthrough,
    /// Show nothing.
    EmptyResult,
}

impl CatalogKind {
    pub fn empty_profile_policy(self) -> EmptyProfilePolicy {
        match self {
            CatalogKind::Jobs => EmptyProfilePolicy::Passthrough,
            CatalogKind::Trainings => EmptyProfilePolicy::EmptyResult,
        }
    }

    pub fn threshold(self, settings: &RankingSettings) -> f64 {
        match self {
            CatalogKind::Jobs => settings.jobs_threshold,
            CatalogKind::Trainings => settings.trainings_threshold,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CatalogKind::Jobs => "jobs",
            CatalogKind::Trainings => "trainings",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient field decoding: a malformed field degrades to empty, never fails the page
// ────────────────────────────────────────────────────────────────────────────

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}
