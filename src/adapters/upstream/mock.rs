//! Scripted account fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::models::{AccountData, AccountId, AccountListing};
use crate::domain::ports::{AccountFetcher, FetchError};

/// Fetcher that answers from an in-memory table.
///
/// Unknown ids yield [`FetchError::NotFound`]. `set_failing(true)` turns
/// every call into [`FetchError::Unavailable`], and `set_delay` holds each
/// call for a while before answering.
#[derive(Default)]
pub struct MockAccountFetcher {
    accounts: RwLock<HashMap<AccountId, AccountData>>,
    listings: RwLock<Vec<AccountListing>>,
    failing: AtomicBool,
    delay_ms: AtomicU64,
    fetches: AtomicUsize,
    searches: AtomicUsize,
}

impl MockAccountFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the response for `data.id`.
    pub async fn set_account(&self, data: AccountData) {
        self.accounts.write().await.insert(data.id, data);
    }

    /// Script the search index; searches match on a case-insensitive nickname prefix.
    pub async fn set_listings(&self, listings: Vec<AccountListing>) {
        *self.listings.write().await = listings;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of `fetch` calls so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of `search` calls so far.
    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let millis = self.delay_ms.load(Ordering::SeqCst);
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    fn check_failing(&self) -> Result<(), FetchError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Unavailable("mock upstream is down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountFetcher for MockAccountFetcher {
    async fn fetch(&self, id: AccountId) -> Result<AccountData, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check_failing()?;

        self.accounts
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(FetchError::NotFound(id))
    }

    async fn search(&self, query: &str) -> Result<Vec<AccountListing>, FetchError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check_failing()?;

        let needle = query.to_lowercase();
        Ok(self
            .listings
            .read()
            .await
            .iter()
            .filter(|l| l.username.to_lowercase().starts_with(&needle))
            .cloned()
            .collect())
    }
}
