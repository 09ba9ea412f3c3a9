//! Query slots and generation counters.
//!
//! Every request for a slot takes the next generation. Work is only published while its
//! generation is still the slot's latest, so two pipelines finishing out of order can never
//! overwrite a newer result with an older one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::catalog::CatalogKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKey {
    /// Ranking requests for one catalog in one session.
    Ranking(Uuid, CatalogKind),
    /// Profile loads for one session.
    Profile(Uuid),
}

impl SlotKey {
    pub fn session_id(&self) -> Uuid {
        match *self {
            SlotKey::Ranking(session_id, _) | SlotKey::Profile(session_id) => session_id,
        }
    }
}

#[derive(Debug, Default)]
pub struct QuerySlot {
    latest: AtomicU64,
}

impl QuerySlot {
    /// Starts a new generation, superseding all earlier ones.
    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.latest() == generation
    }
}

/// Slots by key, each stamped with its last use.
#[derive(Debug, Default)]
pub struct SlotRegistry {
    slots: Mutex<HashMap<SlotKey, (Instant, Arc<QuerySlot>)>>,
}

impl SlotRegistry {
    pub fn slot(&self, key: SlotKey) -> Arc<QuerySlot> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let (last_used, slot) = slots
            .entry(key)
            .or_insert_with(|| (Instant::now(), Arc::default()));
        *last_used = Instant::now();
        slot.clone()
    }

    /// Drops slots unused for `idle_for`. A slot still held by an in-flight request is kept,
    /// so its generation keeps counting.
    pub fn evict_idle(&self, idle_for: Duration) -> usize {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let before = slots.len();
        slots.retain(|_, (last_used, slot)| {
            last_used.elapsed() < idle_for || Arc::strong_count(slot) > 1
        });
        before - slots.len()
    }

    /// Drops every slot of `session_id` that no request is holding.
    pub fn forget_session(&self, session_id: Uuid) -> usize {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let before = slots.len();
        slots.retain(|key, (_, slot)| {
            key.session_id() != session_id || Arc::strong_count(slot) > 1
        });
        before - slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
