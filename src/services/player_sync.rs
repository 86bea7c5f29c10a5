//! Player record synchronization cache.
//!
//! [`PlayerSyncCache::get_player`] serves a stored player record while it
//! is younger than the freshness window and otherwise refreshes it from the
//! upstream account API, writing the result back to the store.
//!
//! Lookups never fail loudly. An unknown account, an upstream outage, a
//! timeout, a store failure or a cancelled request all come back as `None`;
//! the next lookup past the window retries the whole synchronization.
//!
//! Concurrent lookups for the same account are not coalesced. Two callers
//! that both see a stale record may both fetch and write; the overlay is
//! idempotent, so they converge on the same record with the later
//! `updated_at` winning.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::errors::DomainError;
use crate::domain::models::{is_sentinel, AccountData, AccountId, PlayerRecord, SyncConfig};
use crate::domain::ports::{AccountFetcher, Clock, FetchError, PlayerRepository, SystemClock};

use super::freshness::{FreshnessPolicy, SyncPlan};

/// Why a lookup produced no record.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Account id 0 is not a valid player")]
    InvalidIdentifier,

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[source] FetchError),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] DomainError),

    #[error("Synchronization cancelled")]
    Cancelled,
}

impl From<FetchError> for SyncError {
    fn from(err: FetchError) -> Self {
        Self::UpstreamUnavailable(err)
    }
}

/// Store-backed cache of upstream player records.
pub struct PlayerSyncCache {
    store: Arc<dyn PlayerRepository>,
    fetcher: Arc<dyn AccountFetcher>,
    clock: Arc<dyn Clock>,
    policy: FreshnessPolicy,
    fetch_timeout: Duration,
}

impl PlayerSyncCache {
    /// Create a cache over `store` and `fetcher` using the wall clock.
    pub fn new(store: Arc<dyn PlayerRepository>, fetcher: Arc<dyn AccountFetcher>, config: &SyncConfig) -> Self {
        Self {
            store,
            fetcher,
            clock: Arc::new(SystemClock),
            policy: FreshnessPolicy::new(config.freshness_ttl()),
            fetch_timeout: config.fetch_timeout(),
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Return a fresh-enough record for `id`, or `None` when none can be produced.
    #[instrument(skip(self), fields(account_id = id))]
    pub async fn get_player(&self, id: AccountId) -> Option<PlayerRecord> {
        self.get_player_until_cancelled(id, &CancellationToken::new()).await
    }

    /// Like [`get_player`](Self::get_player), but gives up as soon as `cancel` fires.
    ///
    /// A cancelled lookup never writes to the store.
    #[instrument(skip(self, cancel), fields(account_id = id))]
    pub async fn get_player_until_cancelled(
        &self,
        id: AccountId,
        cancel: &CancellationToken,
    ) -> Option<PlayerRecord> {
        match self.resolve(id, cancel).await {
            Ok(record) => Some(record),
            Err(err) => {
                log_failure(id, &err);
                None
            }
        }
    }

    async fn resolve(&self, id: AccountId, cancel: &CancellationToken) -> Result<PlayerRecord, SyncError> {
        if is_sentinel(id) {
            return Err(SyncError::InvalidIdentifier);
        }

        let existing = self.store.find(id).await?;
        let now = self.clock.now();

        match self.policy.plan(existing, now) {
            SyncPlan::Fresh(record) => {
                debug!(account_id = id, updated_at = %record.updated_at, "serving fresh player record");
                Ok(record)
            }
            SyncPlan::First => {
                let data = self.fetch(id, cancel).await?;
                let record = PlayerRecord::from_account(data, now);
                self.store.insert(&record).await?;
                info!(account_id = id, "player record created");
                Ok(record)
            }
            SyncPlan::Refresh(mut record) => {
                let data = self.fetch(id, cancel).await?;
                record.merge_from(data, now);
                self.store.update(&record).await?;
                info!(account_id = id, "player record refreshed");
                Ok(record)
            }
        }
    }

    /// Fetch upstream data, bounded by the fetch timeout and the cancellation token.
    ///
    /// Only returns `Ok` while the token is still live, so the caller's write
    /// cannot start after cancellation.
    async fn fetch(&self, id: AccountId, cancel: &CancellationToken) -> Result<AccountData, SyncError> {
        let fetch = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(id));

        let data = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(SyncError::Cancelled),
            result = fetch => result.map_err(|_| FetchError::Timeout).and_then(|inner| inner)?,
        };

        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        if data.id != id {
            return Err(FetchError::InvalidPayload(format!("asked for account {id}, got {}", data.id)).into());
        }

        Ok(data)
    }
}

fn log_failure(id: AccountId, err: &SyncError) {
    match err {
        SyncError::InvalidIdentifier => debug!(account_id = id, "ignoring sentinel account id"),
        SyncError::UpstreamUnavailable(cause) => {
            warn!(account_id = id, error = %cause, "player data unavailable from upstream");
        }
        SyncError::PersistenceFailure(cause) => {
            error!(account_id = id, error = %cause, "failed to persist player record");
        }
        SyncError::Cancelled => info!(account_id = id, "player lookup cancelled"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::ManualClock;
    use crate::adapters::memory::InMemoryPlayerRepository;
    use crate::adapters::upstream::MockAccountFetcher;
    use chrono::{DateTime, TimeZone, Utc};

    struct Harness {
        store: Arc<InMemoryPlayerRepository>,
        fetcher: Arc<MockAccountFetcher>,
        clock: Arc<ManualClock>,
        cache: PlayerSyncCache,
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryPlayerRepository::new());
        let fetcher = Arc::new(MockAccountFetcher::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let config = SyncConfig { freshness_ttl_secs: 3600, fetch_timeout_ms: 200 };
        let cache = PlayerSyncCache::new(store.clone(), fetcher.clone(), &config).with_clock(clock.clone());
        Harness { store, fetcher, clock, cache }
    }

    #[tokio::test]
    async fn test_sentinel_touches_nothing() {
        let h = harness();

        assert!(h.cache.get_player(0).await.is_none());

        assert_eq!(h.store.stats().finds, 0);
        assert_eq!(h.fetcher.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_first_sync_inserts() {
        let h = harness();
        h.fetcher.set_account(AccountData::new(42, "Yamato").with_karma(7)).await;

        let record = h.cache.get_player(42).await.expect("record");

        assert_eq!(record.site_karma, 7);
        assert_eq!(record.updated_at, t0());
        assert_eq!(h.store.get(42).await, Some(record));
        assert_eq!(h.store.stats().inserts, 1);
    }

    #[tokio::test]
    async fn test_unknown_account_is_absent() {
        let h = harness();

        assert!(h.cache.get_player(42).await.is_none());
        assert!(h.store.is_empty().await);
        assert_eq!(h.store.stats().writes(), 0);
    }

    #[tokio::test]
    async fn test_store_read_failure_is_absent() {
        let h = harness();
        h.store.fail_reads(true);
        h.fetcher.set_account(AccountData::new(42, "Yamato")).await;

        assert!(h.cache.get_player(42).await.is_none());
        assert_eq!(h.fetcher.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_timeout_is_absent() {
        let h = harness();
        h.fetcher.set_account(AccountData::new(42, "Yamato")).await;
        h.fetcher.set_delay(Duration::from_millis(1_000));

        assert!(h.cache.get_player(42).await.is_none());
        assert_eq!(h.store.stats().writes(), 0);
    }

    struct WrongAccountFetcher;

    #[async_trait::async_trait]
    impl AccountFetcher for WrongAccountFetcher {
        async fn fetch(&self, id: AccountId) -> Result<AccountData, FetchError> {
            Ok(AccountData::new(id + 1, "Musashi"))
        }

        async fn search(&self, _query: &str) -> Result<Vec<crate::domain::models::AccountListing>, FetchError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_mismatched_payload_is_absent() {
        let store = Arc::new(InMemoryPlayerRepository::new());
        let cache = PlayerSyncCache::new(store.clone(), Arc::new(WrongAccountFetcher), &SyncConfig::default());

        assert!(cache.get_player(42).await.is_none());
        assert_eq!(store.stats().writes(), 0);
    }

    #[tokio::test]
    async fn test_updated_at_comes_from_local_clock() {
        let h = harness();
        h.fetcher.set_account(AccountData::new(42, "Yamato")).await;
        h.clock.advance(chrono::Duration::minutes(5));

        let record = h.cache.get_player(42).await.expect("record");
        assert_eq!(record.updated_at, t0() + chrono::Duration::minutes(5));
    }

    #[tokio::test]
    async fn test_first_sync_write_failure_is_absent() {
        let h = harness();
        h.fetcher.set_account(AccountData::new(42, "Yamato").with_karma(7)).await;
        h.store.fail_writes(true);

        assert!(h.cache.get_player(42).await.is_none());
        assert!(h.store.is_empty().await);
        assert_eq!(h.store.stats().inserts, 1);
    }

    #[tokio::test]
    async fn test_refresh_write_failure_keeps_stored_record() {
        let h = harness();
        let stale = PlayerRecord::from_account(
            AccountData::new(42, "Yamato").with_karma(3),
            t0() - chrono::Duration::hours(2),
        );
        h.store.seed(stale.clone()).await;
        h.fetcher.set_account(AccountData::new(42, "Yamato").with_karma(10)).await;
        h.store.fail_writes(true);

        assert!(h.cache.get_player(42).await.is_none());
        assert_eq!(h.store.get(42).await, Some(stale));

        // The next lookup retries the whole synchronization
        h.store.fail_writes(false);
        let record = h.cache.get_player(42).await.expect("record after recovery");
        assert_eq!(record.site_karma, 10);
        assert_eq!(record.updated_at, t0());
        assert_eq!(h.store.get(42).await, Some(record));
        assert_eq!(h.fetcher.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_slower_refresh_does_not_rewind_updated_at() {
        let store = Arc::new(InMemoryPlayerRepository::new());
        store
            .seed(PlayerRecord::from_account(
                AccountData::new(42, "Yamato").with_karma(1),
                t0() - chrono::Duration::hours(2),
            ))
            .await;
        let config = SyncConfig { freshness_ttl_secs: 3600, fetch_timeout_ms: 1_000 };

        // Reads the clock first but finishes last
        let slow_fetcher = Arc::new(MockAccountFetcher::new());
        slow_fetcher.set_account(AccountData::new(42, "Yamato").with_karma(2)).await;
        slow_fetcher.set_delay(Duration::from_millis(100));
        let slow = PlayerSyncCache::new(store.clone(), slow_fetcher, &config)
            .with_clock(Arc::new(ManualClock::new(t0())));

        let fast_fetcher = Arc::new(MockAccountFetcher::new());
        fast_fetcher.set_account(AccountData::new(42, "Yamato").with_karma(3)).await;
        let later = t0() + chrono::Duration::seconds(5);
        let fast = PlayerSyncCache::new(store.clone(), fast_fetcher, &config)
            .with_clock(Arc::new(ManualClock::new(later)));

        let (slow_result, fast_result) = tokio::join!(slow.get_player(42), fast.get_player(42));
        assert!(slow_result.is_some());
        assert!(fast_result.is_some());

        let stored = store.get(42).await.expect("stored");
        assert_eq!(stored.updated_at, later);
        assert_eq!(stored.site_karma, 3);
    }
}
