//! Freshness policy for stored player records.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::domain::models::PlayerRecord;

/// What a lookup must do with the record it found in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPlan {
    /// Within the freshness window; serve as is.
    Fresh(PlayerRecord),
    /// Nothing stored yet; fetch and insert.
    First,
    /// Stored but stale; fetch, overlay and update.
    Refresh(PlayerRecord),
}

/// Decides whether a stored record may be served without asking upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    ttl: chrono::Duration,
}

impl FreshnessPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    pub const fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// A record exactly `ttl` old is already stale.
    pub fn is_stale(&self, updated_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(updated_at) >= self.ttl
    }

    pub fn plan(&self, existing: Option<PlayerRecord>, now: DateTime<Utc>) -> SyncPlan {
        match existing {
            None => SyncPlan::First,
            Some(record) if self.is_stale(record.updated_at, now) => SyncPlan::Refresh(record),
            Some(record) => SyncPlan::Fresh(record),
        }
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}
