pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Recommendation parsing
        .route(
            "/api/v1/recommendations/parse",
            post(handlers::handle_parse),
        )
        .route(
            "/api/v1/sessions/:session_id/profile",
            get(handlers::handle_get_profile),
        )
        .route(
            "/api/v1/sessions/:session_id/profile/refresh",
            post(handlers::handle_refresh_profile),
        )
        // Ranking
        .route("/api/v1/rank/jobs", post(handlers::handle_rank_jobs))
        .route(
            "/api/v1/rank/trainings",
            post(handlers::handle_rank_trainings),
        )
        .route(
            "/api/v1/rank/jobs/batch",
            post(handlers::handle_batch_jobs).layer(batch_body_limit()),
        )
        .route(
            "/api/v1/rank/trainings/batch",
            post(handlers::handle_batch_trainings).layer(batch_body_limit()),
        )
        .with_state(state)
}

/// Batch bodies carry whole catalogs; the 2 MB default only suits the other routes.
fn batch_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(handlers::MAX_BATCH_BODY_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::catalog::{JobPosting, TrainingProgram};
    use crate::config::{Config, RankingSettings};
    use crate::pipeline::Pipeline;
    use crate::sources::{CatalogQuery, CatalogSource, ProfileSource, SourceError};

    struct FixedProfile(Option<Value>);

    #[async_trait]
    impl ProfileSource for FixedProfile {
        async fn fetch_profile(&self, _session_id: Uuid) -> Result<Value, SourceError> {
            self.0.clone().ok_or(SourceError::Status {
                status: 502,
                message: "upstream down".into(),
            })
        }
    }

    struct FixedCatalog<R>(Vec<R>);

    #[async_trait]
    impl<R: Clone + Send + Sync> CatalogSource<R> for FixedCatalog<R> {
        async fn fetch_page(&self, _query: &CatalogQuery) -> Result<Vec<R>, SourceError> {
            Ok(self.0.clone())
        }
    }

    fn app(profile: Option<Value>) -> Router {
        let ranking = RankingSettings {
            debounce: Duration::ZERO,
            ..RankingSettings::default()
        };
        let config = Config {
            profile_source_url: "http://profiles.test".into(),
            jobs_catalog_url: "http://jobs.test".into(),
            trainings_catalog_url: "http://trainings.test".into(),
            port: 0,
            rust_log: "debug".into(),
            ranking: ranking.clone(),
        };
        let jobs: Vec<JobPosting> = ["Boulanger", "Comptable"]
            .iter()
            .enumerate()
            .map(|(i, title)| JobPosting {
                id: format!("j{i}"),
                title: Some(title.to_string()),
                ..Default::default()
            })
            .collect();
        let trainings = vec![TrainingProgram {
            id: "t1".into(),
            label: Some("CAP Boulanger".into()),
            ..Default::default()
        }];

        build_router(AppState {
            config,
            pipeline: Pipeline::new(ranking, Arc::new(FixedProfile(profile))),
            jobs: Arc::new(FixedCatalog(jobs)),
            trainings: Arc::new(FixedCatalog(trainings)),
        })
    }

    async fn call(app: Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(app(None), "GET", "/health", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "rankwise-api");
    }

    #[tokio::test]
    async fn test_parse_endpoint_reports_strategy() {
        let (status, body) = call(
            app(None),
            "POST",
            "/api/v1/recommendations/parse",
            json!("1. Licence\nDroit\n2. Master\nFinance"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["strategy"], "numbered_blocks");
        assert_eq!(body["profile"].as_array().unwrap().len(), 2);
        assert_eq!(body["profile"][0]["primary"], "Droit");
        assert_eq!(body["profile"][0]["secondary"], "Licence");
    }

    #[tokio::test]
    async fn test_rank_jobs_returns_ranked_page() {
        let session = Uuid::new_v4();
        let (status, body) = call(
            app(Some(json!(["Boulanger"]))),
            "POST",
            "/api/v1/rank/jobs",
            json!({"session_id": session, "query": "", "recommended_only": true}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["mode"], "ranked");
        assert_eq!(body["profile_status"], "ready");
        assert_eq!(body["total"], 1);
        assert_eq!(body["results"][0]["record"]["id"], "j0");
    }

    #[tokio::test]
    async fn test_rank_with_unavailable_profile_falls_back_to_unranked() {
        let (status, body) = call(
            app(None),
            "POST",
            "/api/v1/rank/trainings",
            json!({"session_id": Uuid::new_v4(), "recommended_only": true}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "unranked");
        assert_eq!(body["profile_status"], "unavailable");
        assert_eq!(body["records"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_with_unavailable_profile_is_502() {
        let uri = format!("/api/v1/sessions/{}/profile/refresh", Uuid::new_v4());
        let (status, body) = call(app(None), "POST", &uri, Value::Null).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "PROFILE_UNAVAILABLE");
        assert_eq!(body["error"]["retryable"], true);
    }

    #[tokio::test]
    async fn test_get_profile_returns_parsed_items() {
        let uri = format!("/api/v1/sessions/{}/profile", Uuid::new_v4());
        let (status, body) = call(
            app(Some(json!("Comptable; Juriste; comptable"))),
            "GET",
            &uri,
            Value::Null,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["strategy"], "delimited");
        assert_eq!(body["items"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_batch_trainings_with_empty_profile_is_empty() {
        let (status, body) = call(
            app(None),
            "POST",
            "/api/v1/rank/trainings/batch",
            json!({
                "recommendations": [],
                "records": [{"id": "t1", "label": "BTS Comptabilité"}]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "ranked");
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn test_batch_accepts_bodies_over_default_limit() {
        let records: Vec<Value> = (0..60_000)
            .map(|i| {
                let title = if i % 2 == 0 {
                    "Comptable"
                } else {
                    "Boulanger pâtissier de quartier"
                };
                json!({"id": i.to_string(), "title": title})
            })
            .collect();
        let body = json!({"recommendations": ["Comptable"], "records": records});
        assert!(body.to_string().len() > 2 * 1024 * 1024);

        let (status, body) = call(app(None), "POST", "/api/v1/rank/jobs/batch", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 30_000);
    }

    #[tokio::test]
    async fn test_parse_keeps_default_body_limit() {
        let text = json!("Comptable; ".repeat(300_000)).to_string();
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/recommendations/parse")
            .header("content-type", "application/json")
            .body(Body::from(text))
            .unwrap();
        let response = app(None).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_batch_jobs_skips_malformed_records() {
        let (status, body) = call(
            app(None),
            "POST",
            "/api/v1/rank/jobs/batch",
            json!({
                "recommendations": [{"label": "Comptable"}],
                "records": [
                    {"id": "1", "title": "Comptable"},
                    "not a record",
                    {"id": "2", "title": ["not", "text"]},
                    {"id": "3", "title": "Boulanger"}
                ]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "ranked");
        assert_eq!(body["total"], 1);
        assert_eq!(body["results"][0]["record"]["id"], "1");
        assert_eq!(body["profile_items"], 1);
    }
}
