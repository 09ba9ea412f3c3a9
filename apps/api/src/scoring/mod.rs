//! Similarity scoring: pluggable, trait-based scorers that measure one catalog record
//! against a prepared recommendation profile.
//!
//! `JobScorer` and `TrainingScorer` are the two catalog-specific variants. The ranker is
//! generic over `RecordScorer`, so adding a catalog means adding a scorer, not touching the
//! ranking code.

pub mod job;
pub mod prepared;
pub mod similarity;
pub mod training;

pub use job::{JobScorer, JobWeights};
pub use prepared::{PreparedItem, PreparedProfile};
pub use similarity::{jaccard, overlap_ratio, similarity};
pub use training::TrainingScorer;

use crate::catalog::CatalogRecord;

/// Scores one catalog record against recommendation items.
///
/// Record features (token sets) are extracted once per record, then compared against every
/// prepared item. Implementations must be pure: scoring runs in parallel across records.
pub trait RecordScorer: Send + Sync {
    type Record: CatalogRecord;
    type Features;

    fn features(&self, record: &Self::Record) -> Self::Features;

    fn score_item(&self, features: &Self::Features, item: &PreparedItem) -> f64;

    /// Best score over all profile items, clamped to `[0, 1]`. Zero for an empty profile.
    fn best_score(&self, record: &Self::Record, profile: &PreparedProfile) -> f64 {
        let features = self.features(record);
        profile
            .items()
            .iter()
            .map(|item| self.score_item(&features, item))
            .fold(0.0_f64, f64::max)
            .clamp(0.0, 1.0)
    }
}
