use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::catalog::{apply_policy, rank, CatalogKind, JobPosting, PageResults, TrainingProgram};
use crate::errors::AppError;
use crate::pipeline::{PipelineOutcome, ProfileLookup, ProfileSnapshot, RankParams};
use crate::recommendation::{parse_value, ParseStrategy, ParsedProfile, RecommendationProfile};
use crate::scoring::{JobScorer, PreparedProfile, RecordScorer, TrainingScorer};
use crate::sources::http::decode_page;
use crate::state::AppState;

/// Upper bound on records accepted by the batch endpoints.
pub const MAX_BATCH_RECORDS: usize = 200_000;

/// Request body cap for the batch endpoints, sized for `MAX_BATCH_RECORDS` catalog records.
pub const MAX_BATCH_BODY_BYTES: usize = 256 * 1024 * 1024;

#[derive(Serialize)]
pub struct ProfileResponse {
    pub session_id: Uuid,
    pub strategy: ParseStrategy,
    pub items: RecommendationProfile,
    pub fetched_at: chrono::DateTime<chrono::Utc>,
}

impl ProfileResponse {
    fn new(session_id: Uuid, snapshot: &ProfileSnapshot) -> Self {
        Self {
            session_id,
            strategy: snapshot.strategy,
            items: snapshot.profile.clone(),
            fetched_at: snapshot.fetched_at,
        }
    }
}

/// Body of the batch endpoints: a recommendation payload in any accepted shape, and the
/// records to rank against it.
#[derive(Deserialize)]
pub struct BatchRankRequest {
    #[serde(default)]
    pub recommendations: Value,
    #[serde(default)]
    pub records: Vec<Value>,
}

#[derive(Serialize)]
pub struct BatchRankResponse<R> {
    pub catalog: CatalogKind,
    pub strategy: ParseStrategy,
    pub profile_items: usize,
    #[serde(flatten)]
    pub results: PageResults<R>,
    pub total: usize,
}

/// POST /api/v1/recommendations/parse
pub async fn handle_parse(Json(payload): Json<Value>) -> Json<ParsedProfile> {
    Json(parse_value(payload))
}

/// POST /api/v1/sessions/:session_id/profile/refresh
pub async fn handle_refresh_profile(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, AppError> {
    let snapshot = state.pipeline.refresh_profile(session_id).await?;
    Ok(Json(ProfileResponse::new(session_id, &snapshot)))
}

/// GET /api/v1/sessions/:session_id/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, AppError> {
    match state.pipeline.profile_for(session_id).await {
        ProfileLookup::Ready(snapshot) | ProfileLookup::Empty(snapshot) => {
            Ok(Json(ProfileResponse::new(session_id, &snapshot)))
        }
        ProfileLookup::Unavailable(e) => Err(AppError::ProfileUnavailable(e)),
    }
}

/// POST /api/v1/rank/jobs
pub async fn handle_rank_jobs(
    State(state): State<AppState>,
    Json(params): Json<RankParams>,
) -> Result<Json<PipelineOutcome<JobPosting>>, AppError> {
    let request = state.pipeline.begin(CatalogKind::Jobs, params);
    let outcome = state
        .pipeline
        .run(state.jobs.as_ref(), JobScorer::default(), request)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/rank/trainings
pub async fn handle_rank_trainings(
    State(state): State<AppState>,
    Json(params): Json<RankParams>,
) -> Result<Json<PipelineOutcome<TrainingProgram>>, AppError> {
    let request = state.pipeline.begin(CatalogKind::Trainings, params);
    let outcome = state
        .pipeline
        .run(state.trainings.as_ref(), TrainingScorer, request)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/rank/jobs/batch
pub async fn handle_batch_jobs(
    State(state): State<AppState>,
    Json(req): Json<BatchRankRequest>,
) -> Result<Json<BatchRankResponse<JobPosting>>, AppError> {
    batch_rank(&state, CatalogKind::Jobs, JobScorer::default(), req).await.map(Json)
}

/// POST /api/v1/rank/trainings/batch
pub async fn handle_batch_trainings(
    State(state): State<AppState>,
    Json(req): Json<BatchRankRequest>,
) -> Result<Json<BatchRankResponse<TrainingProgram>>, AppError> {
    batch_rank(&state, CatalogKind::Trainings, TrainingScorer, req).await.map(Json)
}

/// Ranks caller-supplied records against a caller-supplied profile. No session, no debounce.
async fn batch_rank<S>(
    state: &AppState,
    kind: CatalogKind,
    scorer: S,
    req: BatchRankRequest,
) -> Result<BatchRankResponse<S::Record>, AppError>
where
    S: RecordScorer + 'static,
    S::Record: serde::de::DeserializeOwned,
{
    if req.records.len() > MAX_BATCH_RECORDS {
        return Err(AppError::Validation(format!(
            "at most {MAX_BATCH_RECORDS} records per batch, got {}",
            req.records.len()
        )));
    }

    let threshold = kind.threshold(state.pipeline.settings());
    let (parsed, results) = tokio::task::spawn_blocking(move || -> Result<_, AppError> {
        let parsed = parse_value(req.recommendations);
        let records: Vec<S::Record> = decode_page(Value::Array(req.records))
            .map_err(|e| AppError::Validation(format!("records: {e}")))?;
        let prepared = PreparedProfile::new(&parsed.profile);
        let results = apply_policy(kind, rank(records, &prepared, threshold, &scorer));
        Ok((parsed, results))
    })
    .await
    .map_err(|e| {
        AppError::Internal(anyhow::anyhow!("spawn_blocking failed in batch scoring: {e}"))
    })??;

    let total = results.total();
    info!(
        "Batch {}: {} profile item(s), {total} result(s)",
        kind.as_str(),
        parsed.profile.len()
    );
    Ok(BatchRankResponse {
        catalog: kind,
        strategy: parsed.strategy,
        profile_items: parsed.profile.len(),
        results,
        total,
    })
}
