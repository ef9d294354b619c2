//! Tracks which freshly inserted orders are still "new" to the viewer.
//!
//! Every entry leaves the set through [`NewnessTracker::mark_seen`], whether
//! the viewer opened the order, it was displayed long enough, or it simply
//! expired. The tracker holds deadlines only; the owning task sleeps until
//! [`next_deadline`](NewnessTracker::next_deadline) and then calls
//! [`expire`](NewnessTracker::expire), so dropping the task cancels every
//! pending timer at once.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::domain::OrderId;
use crate::infrastructure::config::newness::NewnessConfig;

#[derive(Debug, Clone, Copy)]
struct Entry {
    added_at: Instant,
    expires_at: Instant,
    /// Set once the order was displayed; resolves before `expires_at`.
    viewed_at: Option<Instant>,
}

impl Entry {
    fn deadline(&self) -> Instant {
        match self.viewed_at {
            Some(viewed_at) => viewed_at.min(self.expires_at),
            None => self.expires_at,
        }
    }
}

/// Set of unseen order ids with per-entry deadlines.
#[derive(Debug, Clone)]
pub struct NewnessTracker {
    expiry: Duration,
    auto_view: Duration,
    entries: HashMap<OrderId, Entry>,
}

impl NewnessTracker {
    pub fn new(expiry: Duration, auto_view: Duration) -> Self {
        Self {
            expiry,
            auto_view,
            entries: HashMap::new(),
        }
    }

    pub fn from_config(config: &NewnessConfig) -> Self {
        Self::new(config.expiry(), config.auto_view())
    }

    /// Start tracking `id`. Returns false if it was already tracked.
    pub fn track(&mut self, id: OrderId, now: Instant) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }
        self.entries.insert(
            id,
            Entry {
                added_at: now,
                expires_at: now + self.expiry,
                viewed_at: None,
            },
        );
        true
    }

    /// Acknowledge `id`. Returns whether it was still new.
    pub fn mark_seen(&mut self, id: &OrderId) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Note that `id` is on screen; it counts as seen after the auto-view
    /// delay. Repeated calls keep the first schedule.
    pub fn displayed(&mut self, id: &OrderId, now: Instant) -> bool {
        let auto_view = self.auto_view;
        match self.entries.get_mut(id) {
            Some(entry) => {
                if entry.viewed_at.is_none() {
                    entry.viewed_at = Some(now + auto_view);
                }
                true
            }
            None => false,
        }
    }

    /// Resolve every entry whose deadline has passed. Returns the ids removed.
    pub fn expire(&mut self, now: Instant) -> Vec<OrderId> {
        let due: Vec<OrderId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.deadline() <= now)
            .map(|(id, _)| id.clone())
            .collect();
        due.into_iter().filter(|id| self.mark_seen(id)).collect()
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.values().map(Entry::deadline).min()
    }

    #[must_use]
    pub fn is_new(&self, id: &OrderId) -> bool {
        self.entries.contains_key(id)
    }

    /// Tracked ids, oldest first.
    #[must_use]
    pub fn ids(&self) -> Vec<OrderId> {
        let mut entries: Vec<(&OrderId, &Entry)> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.1.added_at.cmp(&b.1.added_at).then_with(|| a.0.cmp(b.0)));
        entries.into_iter().map(|(id, _)| id.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NewnessTracker {
    fn default() -> Self {
        Self::from_config(&NewnessConfig::default())
    }
}
