//! Upstream API response models.
//!
//! These structs map to the account and search JSON payloads. They are used
//! internally by the upstream adapter and are not part of the domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::models::{AccountData, AccountId, AccountListing};
use crate::domain::ports::FetchError;

/// Envelope returned by `GET /api/accounts/{id}/`.
///
/// `data` is keyed by the stringified account id; a `null` entry means the
/// account does not exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<HashMap<String, Option<UpstreamAccount>>>,
}

/// One account entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamAccount {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hidden_profile: Option<bool>,
    /// Unix seconds
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Unix seconds
    #[serde(default)]
    pub last_battle_time: Option<i64>,
    #[serde(default)]
    pub karma: Option<i32>,
    #[serde(default)]
    pub ratings: Option<UpstreamRatings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamRatings {
    #[serde(default)]
    pub performance: Option<i32>,
    #[serde(default)]
    pub teamplay: Option<i32>,
    #[serde(default)]
    pub courtesy: Option<i32>,
}

/// Envelope returned by the player search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<Vec<SearchHit>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub account_id: AccountId,
    pub nickname: String,
}

fn from_unix(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
}

impl AccountResponse {
    /// Extract the account for `id`, rejecting payloads with no usable data.
    pub fn into_account_data(self, id: AccountId) -> Result<AccountData, FetchError> {
        if self.status != "ok" {
            return Err(FetchError::InvalidPayload(format!("status '{}'", self.status)));
        }

        let account = self
            .data
            .and_then(|mut data| data.remove(&id.to_string()))
            .flatten()
            .ok_or(FetchError::NotFound(id))?;

        let username = account
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| FetchError::InvalidPayload(format!("account {id} has no name")))?;

        let ratings = account.ratings.unwrap_or_default();

        Ok(AccountData {
            id,
            username: Some(username),
            hidden: account.hidden_profile,
            account_created_at: from_unix(account.created_at),
            last_battle_at: from_unix(account.last_battle_time),
            site_karma: account.karma,
            performance_rating: ratings.performance,
            teamplay_rating: ratings.teamplay,
            courtesy_rating: ratings.courtesy,
        })
    }
}

impl SearchResponse {
    pub fn into_listings(self) -> Result<Vec<AccountListing>, FetchError> {
        if self.status != "ok" {
            return Err(FetchError::InvalidPayload(format!("status '{}'", self.status)));
        }

        Ok(self
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|hit| AccountListing { id: hit.account_id, username: hit.nickname })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> AccountResponse {
        serde_json::from_value(json).expect("valid envelope")
    }

    #[test]
    fn test_full_account() {
        let response = parse(serde_json::json!({
            "status": "ok",
            "data": {
                "42": {
                    "name": "Yamato",
                    "hidden_profile": true,
                    "created_at": 1_500_000_000,
                    "karma": 10,
                    "ratings": { "performance": 1, "teamplay": 2 }
                }
            }
        }));

        let data = response.into_account_data(42).expect("usable");
        assert_eq!(data.username.as_deref(), Some("Yamato"));
        assert_eq!(data.hidden, Some(true));
        assert_eq!(data.site_karma, Some(10));
        assert_eq!(data.performance_rating, Some(1));
        assert_eq!(data.courtesy_rating, None);
        assert_eq!(data.account_created_at.map(|d| d.timestamp()), Some(1_500_000_000));
        assert!(data.last_battle_at.is_none());
    }

    #[test]
    fn test_null_account_is_not_found() {
        let response = parse(serde_json::json!({ "status": "ok", "data": { "42": null } }));
        assert!(matches!(response.into_account_data(42), Err(FetchError::NotFound(42))));
    }

    #[test]
    fn test_other_account_is_not_found() {
        let response = parse(serde_json::json!({ "status": "ok", "data": { "7": { "name": "x" } } }));
        assert!(matches!(response.into_account_data(42), Err(FetchError::NotFound(42))));
    }

    #[test]
    fn test_error_status_is_unusable() {
        let response = parse(serde_json::json!({ "status": "error" }));
        assert!(matches!(response.into_account_data(42), Err(FetchError::InvalidPayload(_))));
    }

    #[test]
    fn test_nameless_account_is_unusable() {
        let response = parse(serde_json::json!({ "status": "ok", "data": { "42": { "name": "" } } }));
        assert!(matches!(response.into_account_data(42), Err(FetchError::InvalidPayload(_))));
    }

    #[test]
    fn test_search_listings() {
        let response: SearchResponse = serde_json::from_value(serde_json::json!({
            "status": "ok",
            "data": [ { "account_id": 1, "nickname": "Alpha" }, { "account_id": 2, "nickname": "Alpine" } ]
        }))
        .unwrap();

        let listings = response.into_listings().unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[1], AccountListing { id: 2, username: "Alpine".to_string() });
    }
}
