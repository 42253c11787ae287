//! Roster store — the live set of musicians heard on the multicast group.
//!
//! A concurrent map from uuid to RosterEntry, written by the multicast
//! listener, pruned by the expiry task and read by the query responder.
//! Entries are dropped once they go `ttl` without an announcement.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use roster_core::wire::{Announcement, ROSTER_TTL_MS};

/// A musician as currently known to the auditor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// Latest announcement received for this uuid.
    pub announcement: Announcement,
    /// Arrival time of that announcement. Never moves backwards.
    pub last_seen: Instant,
}

impl RosterEntry {
    pub fn uuid(&self) -> &str {
        &self.announcement.uuid
    }

    /// Strictly more than `ttl` since the last announcement.
    pub fn is_stale(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > ttl
    }
}

/// What an upsert did to the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// First announcement from this uuid.
    Inserted,
    /// Existing entry refreshed in place.
    Refreshed,
}

/// Handle to the roster. Clones share the same underlying map.
///
/// Upserts and sweeps lock only the DashMap shard they touch, so announcements
/// from different musicians do not contend. The `gate` is held shared by
/// writers and exclusively by `snapshot`, which therefore sees every shard at
/// the same instant.
#[derive(Debug, Clone)]
pub struct RosterStore {
    entries: Arc<DashMap<String, RosterEntry>>,
    gate: Arc<RwLock<()>>,
    ttl: Duration,
}

impl Default for RosterStore {
    fn default() -> Self {
        Self::new(Duration::from_millis(ROSTER_TTL_MS))
    }
}

impl RosterStore {
    /// Create an empty roster. `ttl` bounds what `snapshot` will return.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            gate: Arc::new(RwLock::new(())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Record an announcement that arrived at `now`.
    ///
    /// Inserts the uuid if unknown, otherwise replaces the stored payload and
    /// refreshes `last_seen`.
    pub fn upsert(&self, announcement: Announcement, now: Instant) -> Upsert {
        let _shared = self.gate.read().unwrap_or_else(PoisonError::into_inner);

        match self.entries.entry(announcement.uuid.clone()) {
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                entry.announcement = announcement;
                // Two arrivals can race to the shard; keep the later one.
                entry.last_seen = entry.last_seen.max(now);
                Upsert::Refreshed
            }
            Entry::Vacant(slot) => {
                slot.insert(RosterEntry {
                    announcement,
                    last_seen: now,
                });
                Upsert::Inserted
            }
        }
    }

    /// Point-in-time copy of the live roster, sorted by uuid.
    ///
    /// Entries already stale at `now` are left out even if no sweep has
    /// removed them yet.
    pub fn snapshot(&self, now: Instant) -> Vec<RosterEntry> {
        let exclusive = self.gate.write().unwrap_or_else(PoisonError::into_inner);

        let mut live: Vec<RosterEntry> = self
            .entries
            .iter()
            .filter(|e| !e.value().is_stale(now, self.ttl))
            .map(|e| e.value().clone())
            .collect();
        drop(exclusive);

        live.sort_by(|a, b| a.uuid().cmp(b.uuid()));
        live
    }

    /// Remove every entry not refreshed within `ttl` of `now`.
    /// Returns how many were removed.
    pub fn sweep(&self, now: Instant, ttl: Duration) -> usize {
        let _shared = self.gate.read().unwrap_or_else(PoisonError::into_inner);

        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_stale(now, ttl));
        before.saturating_sub(self.entries.len())
    }

    pub fn get(&self, uuid: &str) -> Option<RosterEntry> {
        self.entries.get(uuid).map(|e| e.value().clone())
    }

    /// Entries currently held, stale or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
