//! Pipeline runner: one ranking request from debounce to ranked page.
//!
//! Flow per request (state transitions are logged):
//!
//! ```text
//! Idle → Debounce → [Loading → ProfileReady | ProfileEmpty | ProfileUnavailable]
//!      → Fetching(page) → Scoring(page) → RankedPage
//! ```
//!
//! After every await point the request's generation is compared with its slot. A request
//! overtaken by a newer one ends as `Superseded` and its results are dropped.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{apply_policy, rank, CatalogKind, PageResults};
use crate::config::RankingSettings;
use crate::errors::AppError;
use crate::pipeline::cache::{ProfileCache, ProfileLookup, ProfileSnapshot, ProfileStatus};
use crate::pipeline::session::{QuerySlot, SlotKey, SlotRegistry};
use crate::recommendation::parse_value;
use crate::scoring::RecordScorer;
use crate::sources::{CatalogQuery, CatalogSource, ProfileSource, SourceError};

// ────────────────────────────────────────────────────────────────────────────
// Request / outcome types
// ────────────────────────────────────────────────────────────────────────────

/// What the caller asks for. Becomes a `RankingRequest` once a generation is assigned.
#[derive(Debug, Clone, Deserialize)]
pub struct RankParams {
    pub session_id: Uuid,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub page: u32,
    /// Filter and rank the page against the session's recommendation profile.
    #[serde(default)]
    pub recommended_only: bool,
}

/// A ranking request bound to its slot generation.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingRequest {
    pub session_id: Uuid,
    pub catalog: CatalogKind,
    pub query: String,
    pub page: u32,
    pub recommended_only: bool,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPage<R> {
    pub generation: u64,
    pub catalog: CatalogKind,
    pub page: u32,
    pub profile_status: ProfileStatus,
    #[serde(flatten)]
    pub results: PageResults<R>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome<R> {
    Completed(RankedPage<R>),
    /// A newer request for the same slot started; this result must not be shown.
    Superseded { generation: u64, latest: u64 },
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Shared pipeline state: settings, the profile source, the profile cache and the slots.
/// Cheap to clone.
#[derive(Clone)]
pub struct Pipeline {
    settings: RankingSettings,
    profile_source: Arc<dyn ProfileSource>,
    profiles: Arc<ProfileCache>,
    slots: Arc<SlotRegistry>,
}

impl Pipeline {
    pub fn new(settings: RankingSettings, profile_source: Arc<dyn ProfileSource>) -> Self {
        Self {
            settings,
            profile_source,
            profiles: Arc::new(ProfileCache::default()),
            slots: Arc::new(SlotRegistry::default()),
        }
    }

    pub fn settings(&self) -> &RankingSettings {
        &self.settings
    }

    /// Assigns the next generation of the `(session, catalog)` slot, superseding any request
    /// still in flight for it.
    pub fn begin(&self, catalog: CatalogKind, params: RankParams) -> RankingRequest {
        let generation = self
            .slots
            .slot(SlotKey::Ranking(params.session_id, catalog))
            .begin();
        RankingRequest {
            session_id: params.session_id,
            catalog,
            query: params.query,
            page: params.page,
            recommended_only: params.recommended_only,
            generation,
        }
    }

    // ── profile ────────────────────────────────────────────────────────────

    /// Cached profile for the session, loading it on first use.
    pub async fn profile_for(&self, session_id: Uuid) -> ProfileLookup {
        match self.profiles.get(session_id) {
            Some(snapshot) => ProfileLookup::from_snapshot(snapshot),
            None => self.load_profile(session_id).await,
        }
    }

    /// Drops the cached profile and fetches it again.
    pub async fn refresh_profile(
        &self,
        session_id: Uuid,
    ) -> Result<Arc<ProfileSnapshot>, AppError> {
        self.profiles.invalidate(session_id);
        match self.load_profile(session_id).await {
            ProfileLookup::Unavailable(e) => Err(AppError::ProfileUnavailable(e)),
            ProfileLookup::Ready(snapshot) | ProfileLookup::Empty(snapshot) => Ok(snapshot),
        }
    }

    /// Fetches and parses the profile. Failures are a state, not an error, and are not cached.
    ///
    /// Only the session's latest load publishes. A superseded load answers with whatever the
    /// newer load already published, and with its own result only while nothing is published.
    async fn load_profile(&self, session_id: Uuid) -> ProfileLookup {
        let slot = self.slots.slot(SlotKey::Profile(session_id));
        let generation = slot.begin();
        debug!("Session {session_id}: Loading profile (generation {generation})");

        let timeout = self.settings.profile_timeout;
        let fetched = tokio::time::timeout(timeout, self.profile_source.fetch_profile(session_id))
            .await
            .unwrap_or(Err(SourceError::Timeout(timeout)));

        let lookup = match fetched {
            Ok(raw) => {
                let snapshot = ProfileSnapshot::from_parsed(parse_value(raw));
                ProfileLookup::from_snapshot(Arc::new(snapshot))
            }
            Err(e) => ProfileLookup::Unavailable(e),
        };

        if !slot.is_current(generation) {
            return match self.profiles.get(session_id) {
                Some(current) => {
                    debug!("Session {session_id}: profile load {generation} superseded");
                    ProfileLookup::from_snapshot(current)
                }
                None => {
                    debug!("Session {session_id}: profile load {generation} superseded early");
                    lookup
                }
            };
        }

        match &lookup {
            ProfileLookup::Unavailable(e) => {
                warn!("Session {session_id}: ProfileUnavailable ({e})");
            }
            ProfileLookup::Ready(snapshot) | ProfileLookup::Empty(snapshot) => {
                self.profiles.publish(session_id, snapshot.clone());
                info!(
                    "Session {session_id}: profile {:?} with {} item(s)",
                    lookup.status(),
                    snapshot.profile.len()
                );
            }
        }
        lookup
    }

    // ── eviction ───────────────────────────────────────────────────────────

    /// Drops profiles older than the session TTL along with their sessions' slots, then any
    /// other slot idle for that long. Returns the number of profiles dropped.
    pub fn evict_idle(&self) -> usize {
        let ttl = self.settings.session_ttl;
        let sessions = self.profiles.evict_older_than(ttl);
        let mut slots: usize = sessions
            .iter()
            .map(|session_id| self.slots.forget_session(*session_id))
            .sum();
        slots += self.slots.evict_idle(ttl);

        if !sessions.is_empty() || slots > 0 {
            info!(
                "Evicted {} profile(s) and {slots} query slot(s) idle for {ttl:?}",
                sessions.len()
            );
        }
        sessions.len()
    }

    /// Runs `evict_idle` in the background, four times per TTL.
    pub fn spawn_eviction(&self) -> tokio::task::JoinHandle<()> {
        let pipeline = self.clone();
        let period = (self.settings.session_ttl / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                pipeline.evict_idle();
            }
        })
    }

    // ── ranking ────────────────────────────────────────────────────────────

    /// Runs one ranking request end to end.
    pub async fn run<S>(
        &self,
        catalog: &dyn CatalogSource<S::Record>,
        scorer: S,
        request: RankingRequest,
    ) -> Result<PipelineOutcome<S::Record>, AppError>
    where
        S: RecordScorer + 'static,
    {
        let slot = self
            .slots
            .slot(SlotKey::Ranking(request.session_id, request.catalog));
        let generation = request.generation;

        if !self.settings.debounce.is_zero() {
            tokio::time::sleep(self.settings.debounce).await;
        }
        if let Some(outcome) = superseded(&slot, generation) {
            return Ok(outcome);
        }

        let lookup = if request.recommended_only {
            Some(self.profile_for(request.session_id).await)
        } else {
            None
        };
        if let Some(outcome) = superseded(&slot, generation) {
            return Ok(outcome);
        }

        let profile_status = lookup
            .as_ref()
            .map(ProfileLookup::status)
            .unwrap_or(ProfileStatus::NotRequested);
        let snapshot = lookup.as_ref().and_then(|l| l.snapshot().cloned());

        let page_size = if snapshot.is_some() {
            self.settings.filtered_page_size
        } else {
            self.settings.page_size
        };
        let query = CatalogQuery {
            query: request.query.clone(),
            page: request.page,
            page_size,
        };

        debug!(
            "{} generation {generation}: Fetching page {} (size {page_size})",
            request.catalog.as_str(),
            request.page
        );
        let timeout = self.settings.catalog_timeout;
        let records = tokio::time::timeout(timeout, catalog.fetch_page(&query))
            .await
            .unwrap_or(Err(SourceError::Timeout(timeout)))
            .map_err(AppError::Catalog)?;
        if let Some(outcome) = superseded(&slot, generation) {
            return Ok(outcome);
        }

        let results = match snapshot {
            Some(snapshot) => {
                debug!(
                    "{} generation {generation}: Scoring {} record(s)",
                    request.catalog.as_str(),
                    records.len()
                );
                let kind = request.catalog;
                let threshold = kind.threshold(&self.settings);
                // Scoring is CPU-bound; it runs on the blocking pool.
                tokio::task::spawn_blocking(move || {
                    apply_policy(kind, rank(records, &snapshot.prepared, threshold, &scorer))
                })
                .await
                .map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("spawn_blocking failed in scoring: {e}"))
                })?
            }
            None => PageResults::Unranked { records },
        };
        if let Some(outcome) = superseded(&slot, generation) {
            return Ok(outcome);
        }

        let total = results.total();
        info!(
            "{} generation {generation}: RankedPage page={} total={total} ({profile_status:?})",
            request.catalog.as_str(),
            request.page
        );
        Ok(PipelineOutcome::Completed(RankedPage {
            generation,
            catalog: request.catalog,
            page: request.page,
            profile_status,
            results,
            total,
        }))
    }
}

fn superseded<R>(slot: &QuerySlot, generation: u64) -> Option<PipelineOutcome<R>> {
    if slot.is_current(generation) {
        return None;
    }
    let latest = slot.latest();
    debug!("Generation {generation} superseded by {latest}");
    Some(PipelineOutcome::Superseded { generation, latest })
}
