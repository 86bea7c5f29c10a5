//! Player repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{AccountId, PlayerRecord};

/// Repository interface for player record persistence.
///
/// Implementations must be safe to share between concurrent callers.
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// Get a player record by account id.
    async fn find(&self, id: AccountId) -> DomainResult<Option<PlayerRecord>>;

    /// Insert a new player record.
    ///
    /// Fails with [`DomainError::PlayerExists`](crate::domain::errors::DomainError::PlayerExists)
    /// when a record with the same id is already stored.
    async fn insert(&self, record: &PlayerRecord) -> DomainResult<()>;

    /// Replace a stored player record, keyed by its id.
    ///
    /// A record whose `updated_at` is older than the stored one is discarded and the
    /// call still succeeds, so the stored `updated_at` never moves backwards.
    /// Fails with [`DomainError::PlayerNotFound`](crate::domain::errors::DomainError::PlayerNotFound)
    /// when no record with that id exists.
    async fn update(&self, record: &PlayerRecord) -> DomainResult<()>;

    /// Get every stored record whose id is in `ids`. Unknown ids are skipped.
    async fn find_many(&self, ids: &[AccountId]) -> DomainResult<Vec<PlayerRecord>>;
}
