//! In-memory player repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AccountId, PlayerRecord};
use crate::domain::ports::PlayerRepository;

/// Call counts observed by an [`InMemoryPlayerRepository`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    pub finds: usize,
    pub inserts: usize,
    pub updates: usize,
}

impl RepositoryStats {
    /// Total number of write calls, successful or not.
    pub const fn writes(&self) -> usize {
        self.inserts + self.updates
    }
}

/// `HashMap`-backed repository that counts calls and can be told to fail.
#[derive(Default)]
pub struct InMemoryPlayerRepository {
    players: RwLock<HashMap<AccountId, PlayerRecord>>,
    finds: AtomicUsize,
    inserts: AtomicUsize,
    updates: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryPlayerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record directly, bypassing counters and failure switches.
    pub async fn seed(&self, record: PlayerRecord) {
        self.players.write().await.insert(record.id, record);
    }

    /// Read a record directly, bypassing counters and failure switches.
    pub async fn get(&self, id: AccountId) -> Option<PlayerRecord> {
        self.players.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.players.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.players.read().await.is_empty()
    }

    /// Make every subsequent `find`/`find_many` fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `insert`/`update` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn stats(&self) -> RepositoryStats {
        RepositoryStats {
            finds: self.finds.load(Ordering::SeqCst),
            inserts: self.inserts.load(Ordering::SeqCst),
            updates: self.updates.load(Ordering::SeqCst),
        }
    }

    fn check_reads(&self) -> DomainResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("injected read failure".to_string()));
        }
        Ok(())
    }

    fn check_writes(&self) -> DomainResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("injected write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PlayerRepository for InMemoryPlayerRepository {
    async fn find(&self, id: AccountId) -> DomainResult<Option<PlayerRecord>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;
        Ok(self.players.read().await.get(&id).cloned())
    }

    async fn insert(&self, record: &PlayerRecord) -> DomainResult<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.check_writes()?;

        let mut players = self.players.write().await;
        if players.contains_key(&record.id) {
            return Err(DomainError::PlayerExists(record.id));
        }
        players.insert(record.id, record.clone());
        Ok(())
    }

    async fn update(&self, record: &PlayerRecord) -> DomainResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.check_writes()?;

        let mut players = self.players.write().await;
        match players.get_mut(&record.id) {
            Some(existing) => {
                if record.updated_at >= existing.updated_at {
                    *existing = record.clone();
                }
                Ok(())
            }
            None => Err(DomainError::PlayerNotFound(record.id)),
        }
    }

    async fn find_many(&self, ids: &[AccountId]) -> DomainResult<Vec<PlayerRecord>> {
        self.check_reads()?;

        let players = self.players.read().await;
        let mut found: Vec<_> = ids.iter().filter_map(|id| players.get(id).cloned()).collect();
        found.sort_by_key(|p| p.id);
        found.dedup_by_key(|p| p.id);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::AccountData;
    use chrono::{Duration, TimeZone, Utc};

    fn record(karma: i32, offset_secs: i64) -> PlayerRecord {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::seconds(offset_secs);
        PlayerRecord::from_account(AccountData::new(42, "Yamato").with_karma(karma), at)
    }

    #[tokio::test]
    async fn test_older_update_is_discarded() {
        let repo = InMemoryPlayerRepository::new();
        repo.seed(record(1, 5)).await;

        repo.update(&record(7, 0)).await.expect("stale update is not an error");

        assert_eq!(repo.get(42).await, Some(record(1, 5)));
        assert_eq!(repo.stats().updates, 1);
    }

    #[tokio::test]
    async fn test_newer_update_replaces() {
        let repo = InMemoryPlayerRepository::new();
        repo.seed(record(1, 0)).await;

        repo.update(&record(7, 5)).await.expect("update");

        assert_eq!(repo.get(42).await, Some(record(7, 5)));
    }

    #[tokio::test]
    async fn test_failing_writes() {
        let repo = InMemoryPlayerRepository::new();
        repo.fail_writes(true);

        assert!(repo.insert(&record(1, 0)).await.is_err());
        assert!(repo.is_empty().await);
        assert_eq!(repo.stats().writes(), 1);
    }
}
