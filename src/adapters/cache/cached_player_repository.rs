//! Cached wrapper for PlayerRepository using a moka cache.
//!
//! Caches `find` lookups by account id. Inserts go to the inner store first
//! and then into the cache. Updates drop the cached entry, since the store
//! may keep a newer record than the one written. A cached entry is only
//! ever replaced by a record with the same or a later `updated_at`.
//! Freshness is still judged on the record's own `updated_at`; the cache
//! only saves the store round-trip.

use async_trait::async_trait;
use moka::future::Cache;
use moka::ops::compute::Op;
use std::future::ready;
use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{AccountId, PlayerRecord};
use crate::domain::ports::PlayerRepository;

/// Default maximum number of cached player entries.
const PLAYER_CACHE_MAX_CAPACITY: u64 = 10_000;

/// Cached player repository decorator.
pub struct CachedPlayerRepository<R: PlayerRepository> {
    inner: Arc<R>,
    by_id: Cache<AccountId, Arc<PlayerRecord>>,
}

impl<R: PlayerRepository> CachedPlayerRepository<R> {
    /// Create a new cached repository with the default capacity.
    pub fn new(inner: Arc<R>) -> Self {
        Self::with_capacity(inner, PLAYER_CACHE_MAX_CAPACITY)
    }

    /// Create with a custom capacity.
    pub fn with_capacity(inner: Arc<R>, max_capacity: u64) -> Self {
        let by_id = Cache::builder().max_capacity(max_capacity).build();
        Self { inner, by_id }
    }

    /// Cache `record` unless a newer one is already cached.
    async fn remember(&self, record: &PlayerRecord) {
        let candidate = Arc::new(record.clone());
        self.by_id
            .entry(record.id)
            .and_compute_with(move |current| {
                ready(match current {
                    Some(entry) if entry.value().updated_at > candidate.updated_at => Op::Nop,
                    _ => Op::Put(candidate),
                })
            })
            .await;
    }
}

#[async_trait]
impl<R: PlayerRepository + 'static> PlayerRepository for CachedPlayerRepository<R> {
    async fn find(&self, id: AccountId) -> DomainResult<Option<PlayerRecord>> {
        if let Some(cached) = self.by_id.get(&id).await {
            return Ok(Some((*cached).clone()));
        }

        let result = self.inner.find(id).await?;
        if let Some(ref record) = result {
            self.remember(record).await;
        }
        Ok(result)
    }

    async fn insert(&self, record: &PlayerRecord) -> DomainResult<()> {
        let result = self.inner.insert(record).await;
        match &result {
            Ok(()) => self.remember(record).await,
            // Another writer got there first; drop whatever we held.
            Err(_) => self.by_id.invalidate(&record.id).await,
        }
        result
    }

    async fn update(&self, record: &PlayerRecord) -> DomainResult<()> {
        let result = self.inner.update(record).await;
        self.by_id.invalidate(&record.id).await;
        result
    }

    async fn find_many(&self, ids: &[AccountId]) -> DomainResult<Vec<PlayerRecord>> {
        // Bulk projections go straight to the store
        self.inner.find_many(ids).await
    }
}
