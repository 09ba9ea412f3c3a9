//! Training-program matching: any single strong lexical match is enough.
//!
//! Score is the maximum of the recommendation's token coverage in the record and the four
//! pairwise Jaccards between `(label, secondary_label)` and `(type, degree)`.

use crate::catalog::TrainingProgram;
use crate::recommendation::RecommendationItem;
use crate::scoring::prepared::PreparedItem;
use crate::scoring::similarity::{jaccard, overlap_ratio};
use crate::scoring::RecordScorer;
use crate::text::{tokenize_opt, TokenSet};

#[derive(Debug, Clone, Copy, Default)]
pub struct TrainingScorer;

#[derive(Debug, Clone)]
pub struct TrainingFeatures {
    pub label: TokenSet,
    pub secondary_label: TokenSet,
    pub all: TokenSet,
}

impl TrainingFeatures {
    fn new(label: Option<&str>, secondary_label: Option<&str>) -> Self {
        let label = tokenize_opt(label);
        let secondary_label = tokenize_opt(secondary_label);
        let all = label.union(&secondary_label);
        Self {
            label,
            secondary_label,
            all,
        }
    }
}

impl RecordScorer for TrainingScorer {
    type Record = TrainingProgram;
    type Features = TrainingFeatures;

    fn features(&self, record: &TrainingProgram) -> TrainingFeatures {
        TrainingFeatures::new(record.label.as_deref(), record.secondary_label.as_deref())
    }

    fn score_item(&self, record: &TrainingFeatures, item: &PreparedItem) -> f64 {
        // item.primary is the study type, item.secondary the degree
        [
            overlap_ratio(&item.combined, &record.all),
            jaccard(&record.label, &item.primary),
            jaccard(&record.secondary_label, &item.primary),
            jaccard(&record.secondary_label, &item.secondary),
            jaccard(&record.label, &item.secondary),
        ]
        .into_iter()
        .fold(0.0_f64, f64::max)
    }
}

/// String-level form of the training score.
pub fn score_training(label: &str, secondary_label: &str, item: &RecommendationItem) -> f64 {
    TrainingScorer.score_item(
        &TrainingFeatures::new(Some(label), Some(secondary_label)),
        &PreparedItem::new(item),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(study_type: &str, degree: &str) -> RecommendationItem {
        RecommendationItem::paired(study_type, degree).unwrap()
    }

    #[test]
    fn test_full_coverage_scores_one() {
        let score = score_training(
            "Master informatique et réseaux",
            "Diplôme national de master",
            &item("Informatique", "Master"),
        );
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_pairwise_jaccard_wins_when_coverage_is_partial() {
        // coverage: 2 of the 3 recommendation tokens appear in the record
        // secondary × type: "BTS" vs "BTS" → 1.0
        let score = score_training(
            "Comptabilité",
            "BTS",
            &item("BTS", "Comptabilité gestion"),
        );
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_coverage_ratio_alone() {
        // coverage {cap, boulanger} vs {cap, boulanger, patissier} → 1.0; Jaccards are lower
        let score = score_training("CAP boulanger pâtissier", "", &item("CAP", "Boulanger"));
        assert_eq!(score, 1.0);

        let partial = score_training("CAP cuisine", "", &item("CAP", "Boulanger"));
        assert!((partial - 0.5).abs() < 1e-9, "score was {partial}");
    }

    #[test]
    fn test_unrelated_record_scores_zero() {
        let score = score_training("Licence de droit", "", &item("BTS", "Électronique"));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_missing_labels_score_zero() {
        assert_eq!(score_training("", "", &item("BTS", "Électronique")), 0.0);

        let unlabeled = TrainingProgram {
            id: "t0".into(),
            ..Default::default()
        };
        let prepared = PreparedItem::new(&item("BTS", "Électronique"));
        let features = TrainingScorer.features(&unlabeled);
        assert!(features.all.is_empty());
        assert_eq!(TrainingScorer.score_item(&features, &prepared), 0.0);
    }
}
