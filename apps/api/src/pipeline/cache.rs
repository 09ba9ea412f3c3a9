//! Per-session recommendation profile cache.
//!
//! Snapshots are immutable and shared as `Arc`. Publishing swaps the `Arc` in the map, so a
//! scoring pass that already holds a snapshot keeps using it undisturbed. Entries older than
//! the session TTL are swept; the next request for that session loads the profile again.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use crate::recommendation::{ParseStrategy, ParsedProfile, RecommendationProfile};
use crate::scoring::PreparedProfile;
use crate::sources::SourceError;

/// A parsed profile with its scoring token sets.
#[derive(Debug)]
pub struct ProfileSnapshot {
    pub profile: RecommendationProfile,
    pub prepared: PreparedProfile,
    pub strategy: ParseStrategy,
    pub fetched_at: DateTime<Utc>,
}

impl ProfileSnapshot {
    pub fn from_parsed(parsed: ParsedProfile) -> Self {
        let prepared = PreparedProfile::new(&parsed.profile);
        Self {
            profile: parsed.profile,
            prepared,
            strategy: parsed.strategy,
            fetched_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.profile.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    /// Ranking was not requested; the profile was not consulted.
    NotRequested,
    Ready,
    /// Fetched successfully, nothing parseable.
    Empty,
    /// The source failed; retry later.
    Unavailable,
}

/// Result of resolving a session's profile.
#[derive(Debug)]
pub enum ProfileLookup {
    Ready(Arc<ProfileSnapshot>),
    Empty(Arc<ProfileSnapshot>),
    Unavailable(SourceError),
}

impl ProfileLookup {
    pub fn from_snapshot(snapshot: Arc<ProfileSnapshot>) -> Self {
        if snapshot.is_empty() {
            ProfileLookup::Empty(snapshot)
        } else {
            ProfileLookup::Ready(snapshot)
        }
    }

    pub fn status(&self) -> ProfileStatus {
        match self {
            ProfileLookup::Ready(_) => ProfileStatus::Ready,
            ProfileLookup::Empty(_) => ProfileStatus::Empty,
            ProfileLookup::Unavailable(_) => ProfileStatus::Unavailable,
        }
    }

    pub fn snapshot(&self) -> Option<&Arc<ProfileSnapshot>> {
        match self {
            ProfileLookup::Ready(s) | ProfileLookup::Empty(s) => Some(s),
            ProfileLookup::Unavailable(_) => None,
        }
    }
}

/// Published snapshots by session, each stamped with its publish time.
#[derive(Debug, Default)]
pub struct ProfileCache {
    entries: RwLock<HashMap<Uuid, (Instant, Arc<ProfileSnapshot>)>>,
}

impl ProfileCache {
    pub fn get(&self, session_id: Uuid) -> Option<Arc<ProfileSnapshot>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&session_id)
            .map(|(_, snapshot)| snapshot.clone())
    }

    /// Replaces the session's snapshot. Readers holding the previous `Arc` are unaffected.
    pub fn publish(&self, session_id: Uuid, snapshot: Arc<ProfileSnapshot>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id, (Instant::now(), snapshot));
    }

    /// Drops snapshots published more than `max_age` ago. Returns the sessions removed.
    pub fn evict_older_than(&self, max_age: Duration) -> Vec<Uuid> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut evicted = Vec::new();
        entries.retain(|session_id, (published, _)| {
            let keep = published.elapsed() < max_age;
            if !keep {
                evicted.push(*session_id);
            }
            keep
        });
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn invalidate(&self, session_id: Uuid) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&session_id)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::parse_text;

    #[test]
    fn test_publish_is_copy_on_write() {
        let cache = ProfileCache::default();
        let session = Uuid::new_v4();

        let first = Arc::new(ProfileSnapshot::from_parsed(parse_text("Boulanger")));
        cache.publish(session, first.clone());
        let held = cache.get(session).unwrap();

        let second = Arc::new(ProfileSnapshot::from_parsed(parse_text("Comptable; Juriste")));
        cache.publish(session, second);

        // The reader's snapshot is unchanged; new readers see the new profile.
        assert_eq!(held.profile.len(), 1);
        assert_eq!(cache.get(session).unwrap().profile.len(), 2);
        assert!(Arc::ptr_eq(&held, &first));
    }

    #[test]
    fn test_invalidate() {
        let cache = ProfileCache::default();
        let session = Uuid::new_v4();
        assert!(!cache.invalidate(session));
        cache.publish(session, Arc::new(ProfileSnapshot::from_parsed(parse_text(""))));
        assert!(cache.invalidate(session));
        assert!(cache.get(session).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_snapshots_are_evicted() {
        let cache = ProfileCache::default();
        let stale = Uuid::new_v4();
        let recent = Uuid::new_v4();

        cache.publish(stale, Arc::new(ProfileSnapshot::from_parsed(parse_text("Boulanger"))));
        tokio::time::advance(Duration::from_secs(45 * 60)).await;
        cache.publish(recent, Arc::new(ProfileSnapshot::from_parsed(parse_text("Comptable"))));

        assert_eq!(cache.evict_older_than(Duration::from_secs(30 * 60)), vec![stale]);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(stale).is_none());
        assert!(cache.get(recent).is_some());
    }

    #[test]
    fn test_lookup_status() {
        let empty = Arc::new(ProfileSnapshot::from_parsed(parse_text("")));
        assert_eq!(ProfileLookup::from_snapshot(empty).status(), ProfileStatus::Empty);
        let ready = Arc::new(ProfileSnapshot::from_parsed(parse_text("BTS")));
        assert_eq!(ProfileLookup::from_snapshot(ready).status(), ProfileStatus::Ready);
    }
}
