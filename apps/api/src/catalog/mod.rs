// Catalog records, per-catalog ranking policy, and the matcher/ranker.

pub mod models;
pub mod ranker;

pub use models::{
    CatalogKind, CatalogRecord, EmptyProfilePolicy, JobPosting, ScoredRecord, TrainingProgram,
};
pub use ranker::{apply_policy, rank, PageResults, Ranking};
