//! Common test utilities for integration tests
//!
//! Provides shared fixtures, helpers, and test utilities used across
//! multiple integration test files.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use karma_sync::adapters::clock::ManualClock;
use karma_sync::adapters::sqlite::{create_migrated_test_pool, SqlitePlayerRepository};
use karma_sync::adapters::upstream::MockAccountFetcher;
use karma_sync::domain::models::SyncConfig;
use karma_sync::services::PlayerSyncCache;

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Fixed reference instant all scenarios start from.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// One-hour freshness window and a short fetch bound.
pub fn sync_config() -> SyncConfig {
    SyncConfig {
        freshness_ttl_secs: 3600,
        fetch_timeout_ms: 500,
    }
}

/// A sync cache over a migrated in-memory SQLite store.
pub struct SqliteHarness {
    pub store: Arc<SqlitePlayerRepository>,
    pub fetcher: Arc<MockAccountFetcher>,
    pub clock: Arc<ManualClock>,
    pub cache: Arc<PlayerSyncCache>,
}

pub async fn sqlite_harness() -> SqliteHarness {
    setup_test_logging();

    let pool = create_migrated_test_pool().await.expect("test pool");
    let store = Arc::new(SqlitePlayerRepository::new(pool));
    let fetcher = Arc::new(MockAccountFetcher::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let cache = Arc::new(
        PlayerSyncCache::new(store.clone(), fetcher.clone(), &sync_config()).with_clock(clock.clone()),
    );

    SqliteHarness {
        store,
        fetcher,
        clock,
        cache,
    }
}
