//! Catalog Matcher / Ranker: scores a page of records against a prepared profile, filters by
//! threshold and orders by score.
//!
//! Algorithm:
//! 1. Empty profile → `Ranking::Unfiltered`: nothing to match against, the caller decides.
//! 2. `best = max over items of score(record, item)` for every record
//! 3. Keep records with `best >= threshold`
//! 4. Stable sort descending by `best`; ties keep upstream pagination order
//!
//! Pages larger than `PARALLEL_CUTOFF` are scored with rayon. Order of the output does not
//! depend on which path ran.

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::catalog::models::{CatalogKind, CatalogRecord, EmptyProfilePolicy, ScoredRecord};
use crate::scoring::{PreparedProfile, RecordScorer};

/// Below this many records the page is scored on the calling thread.
const PARALLEL_CUTOFF: usize = 2048;

/// Matcher output before the per-catalog policy is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Ranking<R> {
    /// The profile was empty; no filtering was possible.
    Unfiltered(Vec<R>),
    /// Records at or above the threshold, best first.
    Ranked(Vec<ScoredRecord<R>>),
}

/// What the presentation layer receives for one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PageResults<R> {
    Unranked { records: Vec<R> },
    Ranked { results: Vec<ScoredRecord<R>> },
}

impl<R> PageResults<R> {
    /// Number of records shown for this page.
    pub fn total(&self) -> usize {
        match self {
            PageResults::Unranked { records } => records.len(),
            PageResults::Ranked { results } => results.len(),
        }
    }
}

/// Scores, filters and orders `records`.
pub fn rank<S: RecordScorer>(
    records: Vec<S::Record>,
    profile: &PreparedProfile,
    threshold: f64,
    scorer: &S,
) -> Ranking<S::Record> {
    if profile.is_empty() {
        return Ranking::Unfiltered(records);
    }

    let input_len = records.len();
    let scores = score_all(&records, profile, scorer);

    let mut ranked: Vec<ScoredRecord<S::Record>> = records
        .into_iter()
        .zip(scores)
        .filter(|(_, score)| *score >= threshold)
        .map(|(record, score)| ScoredRecord { record, score })
        .collect();

    // `sort_by` is stable: equal scores keep their input order.
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    debug!(
        "Ranked {} of {} record(s) at threshold {threshold}; top: {:?}",
        ranked.len(),
        input_len,
        ranked.first().map(|s| (s.record.identity(), s.score))
    );

    Ranking::Ranked(ranked)
}

/// Best score per record, in input order.
fn score_all<S: RecordScorer>(
    records: &[S::Record],
    profile: &PreparedProfile,
    scorer: &S,
) -> Vec<f64> {
    if records.len() < PARALLEL_CUTOFF {
        records
            .iter()
            .map(|record| scorer.best_score(record, profile))
            .collect()
    } else {
        records
            .par_iter()
            .map(|record| scorer.best_score(record, profile))
            .collect()
    }
}

/// Applies the catalog's empty-profile policy to a matcher result.
///
/// Jobs show the page unranked when there is nothing to match against; trainings show
/// nothing.
pub fn apply_policy<R>(kind: CatalogKind, ranking: Ranking<R>) -> PageResults<R> {
    match ranking {
        Ranking::Ranked(results) => PageResults::Ranked { results },
        Ranking::Unfiltered(records) => match kind.empty_profile_policy() {
            EmptyProfilePolicy::Passthrough => PageResults::Unranked { records },
            EmptyProfilePolicy::EmptyResult => PageResults::Ranked {
                results: Vec::new(),
            },
        },
    }
}
