use std::sync::Arc;

use crate::catalog::{JobPosting, TrainingProgram};
use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::sources::CatalogSource;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Profile cache, query slots and the profile source.
    pub pipeline: Pipeline,
    pub jobs: Arc<dyn CatalogSource<JobPosting>>,
    pub trainings: Arc<dyn CatalogSource<TrainingProgram>>,
}
