//! Upstream account API port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::{AccountData, AccountId, AccountListing};

/// Upstream fetch failures.
///
/// Callers of the player cache never see these; they all collapse to an
/// absent record.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    #[error("Upstream request timed out")]
    Timeout,

    #[error("Unusable upstream payload: {0}")]
    InvalidPayload(String),
}

impl FetchError {
    /// Whether retrying the same request may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout)
    }
}

/// Client for the upstream game-account API.
#[async_trait]
pub trait AccountFetcher: Send + Sync {
    /// Fetch the current account data for `id`.
    async fn fetch(&self, id: AccountId) -> Result<AccountData, FetchError>;

    /// Search accounts by nickname prefix.
    async fn search(&self, query: &str) -> Result<Vec<AccountListing>, FetchError>;
}
