use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rankwise::catalog::{JobPosting, TrainingProgram};
use rankwise::config::Config;
use rankwise::pipeline::Pipeline;
use rankwise::routes::build_router;
use rankwise::sources::{HttpCatalogSource, HttpProfileSource};
use rankwise::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={lvl},rankwise_api={lvl}",
                env!("CARGO_PKG_NAME"),
                lvl = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Rankwise API v{}", env!("CARGO_PKG_VERSION"));

    let settings = config.ranking.clone();

    // Upstream sources; the per-request budget is enforced by the pipeline, the client
    // timeout only bounds a single attempt.
    let profiles =
        HttpProfileSource::new(config.profile_source_url.clone(), settings.profile_timeout)?;
    let jobs = HttpCatalogSource::<JobPosting>::new(
        config.jobs_catalog_url.clone(),
        settings.catalog_timeout,
    )?;
    let trainings = HttpCatalogSource::<TrainingProgram>::new(
        config.trainings_catalog_url.clone(),
        settings.catalog_timeout,
    )?;
    info!(
        "Sources: profile={} jobs={} trainings={}",
        config.profile_source_url, config.jobs_catalog_url, config.trainings_catalog_url
    );
    info!(
        "Ranking: thresholds jobs={} trainings={}, debounce {:?}, session TTL {:?}",
        settings.jobs_threshold,
        settings.trainings_threshold,
        settings.debounce,
        settings.session_ttl
    );

    let pipeline = Pipeline::new(settings, Arc::new(profiles));
    pipeline.spawn_eviction();

    // Build app state
    let state = AppState {
        pipeline,
        jobs: Arc::new(jobs),
        trainings: Arc::new(trainings),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
