//! Player synchronization against a real SQLite store.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use futures::future::join_all;
use karma_sync::domain::models::{AccountData, PlayerRecord};
use karma_sync::adapters::clock::ManualClock;
use karma_sync::adapters::upstream::MockAccountFetcher;
use karma_sync::domain::ports::PlayerRepository;
use karma_sync::services::PlayerSyncCache;
use tokio_util::sync::CancellationToken;

use common::{sqlite_harness, sync_config, t0};

async fn seed(store: &dyn PlayerRepository, data: AccountData, synced_at: chrono::DateTime<chrono::Utc>) -> PlayerRecord {
    let record = PlayerRecord::from_account(data, synced_at);
    store.insert(&record).await.expect("seed insert");
    record
}

#[tokio::test]
async fn test_stale_record_is_refreshed_and_written_back() {
    let h = sqlite_harness().await;
    let created = t0() - ChronoDuration::minutes(61);
    seed(h.store.as_ref(), AccountData::new(42, "Yamato").with_karma(3), created).await;
    h.fetcher
        .set_account(AccountData { id: 42, site_karma: Some(10), ..Default::default() })
        .await;

    let record = h.cache.get_player(42).await.expect("refreshed record");

    assert_eq!(record.id, 42);
    assert_eq!(record.site_karma, 10);
    assert_eq!(record.updated_at, t0());
    assert_eq!(record.username, "Yamato");
    assert_eq!(record.created_at, created);

    let stored = h.store.find(42).await.expect("find").expect("stored");
    assert_eq!(stored, record);
    assert_eq!(h.fetcher.fetch_count(), 1);
}

#[tokio::test]
async fn test_fresh_record_is_served_without_upstream() {
    let h = sqlite_harness().await;
    let seeded = seed(h.store.as_ref(), AccountData::new(42, "Yamato").with_karma(3), t0() - ChronoDuration::minutes(59)).await;
    h.fetcher.set_account(AccountData::new(42, "Renamed").with_karma(99)).await;

    let record = h.cache.get_player(42).await.expect("record");

    assert_eq!(record, seeded);
    assert_eq!(h.fetcher.fetch_count(), 0);
}

#[tokio::test]
async fn test_first_lookup_creates_record() {
    let h = sqlite_harness().await;
    h.fetcher
        .set_account(AccountData::new(7, "Shimakaze").with_karma(-2).with_ratings(4, 5, 6))
        .await;

    let record = h.cache.get_player(7).await.expect("record");

    assert_eq!(record.created_at, t0());
    assert_eq!(record.updated_at, t0());
    assert_eq!(record.courtesy_rating, 6);
    assert_eq!(h.store.find(7).await.expect("find"), Some(record));
}

#[tokio::test]
async fn test_unknown_account_leaves_store_empty() {
    let h = sqlite_harness().await;

    assert!(h.cache.get_player(404).await.is_none());
    assert!(h.store.find(404).await.expect("find").is_none());
}

#[tokio::test]
async fn test_sentinel_never_reaches_upstream() {
    let h = sqlite_harness().await;

    assert!(h.cache.get_player(0).await.is_none());
    assert_eq!(h.fetcher.fetch_count(), 0);
}

#[tokio::test]
async fn test_failed_refresh_leaves_record_untouched() {
    let h = sqlite_harness().await;
    let seeded = seed(h.store.as_ref(), AccountData::new(42, "Yamato").with_karma(3), t0() - ChronoDuration::hours(2)).await;
    h.fetcher.set_failing(true);

    assert!(h.cache.get_player(42).await.is_none());
    assert_eq!(h.store.find(42).await.expect("find"), Some(seeded));

    // The next lookup retries the whole synchronization
    h.fetcher.set_failing(false);
    h.fetcher.set_account(AccountData::new(42, "Yamato").with_karma(4)).await;
    let record = h.cache.get_player(42).await.expect("record after recovery");
    assert_eq!(record.site_karma, 4);
    assert_eq!(h.fetcher.fetch_count(), 2);
}

#[tokio::test]
async fn test_refresh_is_idempotent_apart_from_timestamp() {
    let h = sqlite_harness().await;
    h.fetcher
        .set_account(AccountData::new(42, "Yamato").with_karma(10).with_ratings(1, 2, 3))
        .await;

    let first = h.cache.get_player(42).await.expect("first");
    h.clock.advance(ChronoDuration::hours(1));
    let second = h.cache.get_player(42).await.expect("second");

    assert_eq!(h.fetcher.fetch_count(), 2);
    assert_eq!(second.updated_at, t0() + ChronoDuration::hours(1));
    assert_eq!(PlayerRecord { updated_at: first.updated_at, ..second.clone() }, first);
}

#[tokio::test]
async fn test_timeout_leaves_record_untouched() {
    let h = sqlite_harness().await;
    let seeded = seed(h.store.as_ref(), AccountData::new(42, "Yamato"), t0() - ChronoDuration::hours(2)).await;
    h.fetcher.set_account(AccountData::new(42, "Yamato").with_karma(8)).await;
    h.fetcher.set_delay(Duration::from_secs(2));

    assert!(h.cache.get_player(42).await.is_none());
    assert_eq!(h.store.find(42).await.expect("find"), Some(seeded));
}

#[tokio::test]
async fn test_cancelled_lookup_does_not_write() {
    let h = sqlite_harness().await;
    h.fetcher.set_account(AccountData::new(42, "Yamato").with_karma(8)).await;
    h.fetcher.set_delay(Duration::from_millis(300));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    assert!(h.cache.get_player_until_cancelled(42, &cancel).await.is_none());
    assert!(started.elapsed() < Duration::from_millis(300));

    // Give the abandoned fetch time to finish; nothing may land afterwards
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(h.store.find(42).await.expect("find").is_none());
}

#[tokio::test]
async fn test_already_cancelled_token_skips_fetch_result() {
    let h = sqlite_harness().await;
    h.fetcher.set_account(AccountData::new(42, "Yamato")).await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    assert!(h.cache.get_player_until_cancelled(42, &cancel).await.is_none());
    assert!(h.store.find(42).await.expect("find").is_none());
}

#[tokio::test]
async fn test_concurrent_refreshes_converge() {
    let h = sqlite_harness().await;
    seed(h.store.as_ref(), AccountData::new(42, "Yamato").with_karma(1), t0() - ChronoDuration::hours(3)).await;
    h.fetcher.set_account(AccountData::new(42, "Yamato").with_karma(12)).await;
    h.fetcher.set_delay(Duration::from_millis(20));

    let lookups = (0..16).map(|_| {
        let cache = Arc::clone(&h.cache);
        async move { cache.get_player(42).await }
    });
    let results = join_all(lookups).await;

    for result in &results {
        let record = result.as_ref().expect("every refresh succeeds");
        assert_eq!(record.site_karma, 12);
        assert_eq!(record.updated_at, t0());
    }
    let stored = h.store.find(42).await.expect("find").expect("stored");
    assert_eq!(stored.site_karma, 12);
}

#[tokio::test]
async fn test_concurrent_first_sync_stores_one_record() {
    let h = sqlite_harness().await;
    h.fetcher.set_account(AccountData::new(42, "Yamato").with_karma(12)).await;
    // Long enough for every lookup to find the store empty before any insert
    h.fetcher.set_delay(Duration::from_millis(200));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&h.cache);
            tokio::spawn(async move { cache.get_player(42).await })
        })
        .collect();
    let results: Vec<_> = join_all(tasks).await.into_iter().map(|r| r.expect("task")).collect();

    // Losing inserts surface as absent; exactly one caller wins
    assert_eq!(results.iter().filter(|r| r.is_some()).count(), 1);
    assert_eq!(h.fetcher.fetch_count(), 8);
    let stored = h.store.find_many(&[42]).await.expect("find_many");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].site_karma, 12);
}

#[tokio::test]
async fn test_later_sync_survives_slower_earlier_one() {
    let h = sqlite_harness().await;
    seed(h.store.as_ref(), AccountData::new(42, "Yamato").with_karma(1), t0() - ChronoDuration::hours(3)).await;
    h.fetcher.set_account(AccountData::new(42, "Yamato").with_karma(2)).await;
    h.fetcher.set_delay(Duration::from_millis(100));

    let fetcher = Arc::new(MockAccountFetcher::new());
    fetcher.set_account(AccountData::new(42, "Yamato").with_karma(3)).await;
    let later = t0() + ChronoDuration::seconds(5);
    let other = PlayerSyncCache::new(h.store.clone(), fetcher, &sync_config())
        .with_clock(Arc::new(ManualClock::new(later)));

    let (earlier_result, later_result) = tokio::join!(h.cache.get_player(42), other.get_player(42));
    assert!(earlier_result.is_some());
    assert_eq!(later_result.expect("later sync").updated_at, later);

    let stored = h.store.find(42).await.expect("find").expect("stored");
    assert_eq!(stored.updated_at, later);
    assert_eq!(stored.site_karma, 3);
}
