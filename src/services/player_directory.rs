//! Read-only player projections.
//!
//! Bulk karma lookups read whatever is already stored and never trigger a
//! synchronization. Nickname search is a straight pass-through to the
//! upstream API.

use std::sync::Arc;

use tracing::{instrument, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{is_sentinel, AccountFullKarma, AccountId, AccountKarma, AccountListing, PlayerRecord};
use crate::domain::ports::{AccountFetcher, PlayerRepository};

/// Searches shorter than this are not sent upstream.
pub const MIN_SEARCH_LEN: usize = 3;

pub struct PlayerDirectory {
    store: Arc<dyn PlayerRepository>,
    fetcher: Arc<dyn AccountFetcher>,
}

impl PlayerDirectory {
    pub fn new(store: Arc<dyn PlayerRepository>, fetcher: Arc<dyn AccountFetcher>) -> Self {
        Self { store, fetcher }
    }

    async fn stored(&self, ids: &[AccountId]) -> DomainResult<Vec<PlayerRecord>> {
        let mut ids: Vec<_> = ids.iter().copied().filter(|id| !is_sentinel(*id)).collect();
        ids.sort_unstable();
        ids.dedup();
        self.store.find_many(&ids).await
    }

    /// Site karma of every stored player in `ids`.
    pub async fn get_players_karma(&self, ids: &[AccountId]) -> DomainResult<Vec<AccountKarma>> {
        Ok(self.stored(ids).await?.iter().map(AccountKarma::from).collect())
    }

    /// All four ratings of every stored player in `ids`.
    pub async fn get_players_full_karma(&self, ids: &[AccountId]) -> DomainResult<Vec<AccountFullKarma>> {
        Ok(self.stored(ids).await?.iter().map(AccountFullKarma::from).collect())
    }

    /// Search upstream accounts by nickname.
    ///
    /// `None` when the query is too short, nothing matched, or upstream failed.
    #[instrument(skip(self))]
    pub async fn list_players(&self, search: &str) -> Option<Vec<AccountListing>> {
        let search = search.trim();
        if search.chars().count() < MIN_SEARCH_LEN {
            return None;
        }

        match self.fetcher.search(search).await {
            Ok(listings) if listings.is_empty() => None,
            Ok(listings) => Some(listings),
            Err(err) => {
                warn!(search, error = %err, "player search failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPlayerRepository;
    use crate::adapters::upstream::MockAccountFetcher;
    use crate::domain::models::AccountData;
    use chrono::Utc;

    async fn directory() -> (PlayerDirectory, Arc<MockAccountFetcher>) {
        let store = Arc::new(InMemoryPlayerRepository::new());
        for (id, karma) in [(1, 10), (2, -3), (3, 0)] {
            let data = AccountData::new(id, format!("p{id}")).with_karma(karma).with_ratings(id as i32, 0, 1);
            store.seed(PlayerRecord::from_account(data, Utc::now())).await;
        }
        let fetcher = Arc::new(MockAccountFetcher::new());
        fetcher
            .set_listings(vec![
                AccountListing { id: 1, username: "Alpha".to_string() },
                AccountListing { id: 2, username: "Alpine".to_string() },
                AccountListing { id: 3, username: "Bravo".to_string() },
            ])
            .await;
        (PlayerDirectory::new(store, fetcher.clone()), fetcher)
    }

    #[tokio::test]
    async fn test_players_karma() {
        let (dir, fetcher) = directory().await;

        let karma = dir.get_players_karma(&[2, 1, 0, 99, 1]).await.unwrap();
        assert_eq!(karma, vec![AccountKarma { id: 1, site_karma: 10 }, AccountKarma { id: 2, site_karma: -3 }]);
        assert_eq!(fetcher.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_players_full_karma() {
        let (dir, _) = directory().await;

        let full = dir.get_players_full_karma(&[3]).await.unwrap();
        assert_eq!(
            full,
            vec![AccountFullKarma { id: 3, site_karma: 0, performance: 3, teamplay: 0, courtesy: 1 }]
        );
    }

    #[tokio::test]
    async fn test_list_players() {
        let (dir, _) = directory().await;

        let hits = dir.list_players("alp").await.expect("hits");
        assert_eq!(hits.len(), 2);
        assert!(dir.list_players("zulu").await.is_none());
    }

    #[tokio::test]
    async fn test_short_search_skips_upstream() {
        let (dir, fetcher) = directory().await;

        assert!(dir.list_players(" al ").await.is_none());
        assert_eq!(fetcher.search_count(), 0);
    }

    #[tokio::test]
    async fn test_search_failure_is_none() {
        let (dir, fetcher) = directory().await;
        fetcher.set_failing(true);

        assert!(dir.list_players("Alpha").await.is_none());
    }
}
