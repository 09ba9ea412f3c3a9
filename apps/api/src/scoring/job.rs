//! Job matching: the title dominates, skills break ties.
//!
//! `score = 0.8 * J(T, title) + 0.2 * max_skill J(T, skill)` where `T` is the posting's
//! title and ROME code. The skill term is 0 when the recommendation carries no skills.

use serde::{Deserialize, Serialize};

use crate::catalog::JobPosting;
use crate::recommendation::RecommendationItem;
use crate::scoring::prepared::PreparedItem;
use crate::scoring::similarity::jaccard;
use crate::scoring::RecordScorer;
use crate::text::{tokenize, TokenSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobWeights {
    pub title: f64,
    pub skills: f64,
}

impl Default for JobWeights {
    fn default() -> Self {
        Self {
            title: 0.8,
            skills: 0.2,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct JobScorer {
    pub weights: JobWeights,
}

impl RecordScorer for JobScorer {
    type Record = JobPosting;
    type Features = TokenSet;

    fn features(&self, record: &JobPosting) -> TokenSet {
        tokenize(&record.matching_text())
    }

    fn score_item(&self, text: &TokenSet, item: &PreparedItem) -> f64 {
        let title = jaccard(text, &item.primary);
        let best_skill = item
            .skills
            .iter()
            .map(|skill| jaccard(text, skill))
            .fold(0.0_f64, f64::max);
        self.weights.title * title + self.weights.skills * best_skill
    }
}

/// String-level form of the job score with default weights.
pub fn score_job(record_text: &str, item: &RecommendationItem) -> f64 {
    let scorer = JobScorer::default();
    scorer.score_item(&tokenize(record_text), &PreparedItem::new(item))
}
