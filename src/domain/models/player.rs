//! Player domain model.
//!
//! A [`PlayerRecord`] is the locally cached snapshot of one upstream
//! account. [`AccountData`] is what the upstream fetcher hands back; every
//! field except the id is optional so that a refresh only overlays what
//! upstream actually supplied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric upstream account identifier. Zero is never a valid account.
pub type AccountId = u32;

/// Returns true when `id` is the zero sentinel.
pub const fn is_sentinel(id: AccountId) -> bool {
    id == 0
}

/// Cached snapshot of one upstream account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Upstream account id, immutable once stored
    pub id: AccountId,
    /// In-game nickname
    pub username: String,
    /// Whether the upstream profile is hidden
    pub hidden: bool,
    /// When the upstream account was created
    pub account_created_at: Option<DateTime<Utc>>,
    /// Last battle reported by upstream
    pub last_battle_at: Option<DateTime<Utc>>,
    /// Site karma
    pub site_karma: i32,
    /// Performance rating
    pub performance_rating: i32,
    /// Teamplay rating
    pub teamplay_rating: i32,
    /// Courtesy rating
    pub courtesy_rating: i32,
    /// When this record was first stored locally
    pub created_at: DateTime<Utc>,
    /// Time of the last successful synchronization (local clock)
    pub updated_at: DateTime<Utc>,
}

impl PlayerRecord {
    /// Build a brand-new record from a first synchronization.
    ///
    /// Rating fields upstream did not supply start at zero.
    pub fn from_account(data: AccountData, synced_at: DateTime<Utc>) -> Self {
        Self {
            id: data.id,
            username: data.username.unwrap_or_default(),
            hidden: data.hidden.unwrap_or(false),
            account_created_at: data.account_created_at,
            last_battle_at: data.last_battle_at,
            site_karma: data.site_karma.unwrap_or_default(),
            performance_rating: data.performance_rating.unwrap_or_default(),
            teamplay_rating: data.teamplay_rating.unwrap_or_default(),
            courtesy_rating: data.courtesy_rating.unwrap_or_default(),
            created_at: synced_at,
            updated_at: synced_at,
        }
    }

    /// Overlay freshly fetched fields onto this record.
    ///
    /// Fields absent from `data` keep their stored value. `id` and
    /// `created_at` are locally owned and never touched. `updated_at` moves
    /// forward to `synced_at` and never backwards.
    pub fn merge_from(&mut self, data: AccountData, synced_at: DateTime<Utc>) {
        if let Some(username) = data.username {
            self.username = username;
        }
        if let Some(hidden) = data.hidden {
            self.hidden = hidden;
        }
        if data.account_created_at.is_some() {
            self.account_created_at = data.account_created_at;
        }
        if data.last_battle_at.is_some() {
            self.last_battle_at = data.last_battle_at;
        }
        if let Some(karma) = data.site_karma {
            self.site_karma = karma;
        }
        if let Some(rating) = data.performance_rating {
            self.performance_rating = rating;
        }
        if let Some(rating) = data.teamplay_rating {
            self.teamplay_rating = rating;
        }
        if let Some(rating) = data.courtesy_rating {
            self.courtesy_rating = rating;
        }
        self.updated_at = self.updated_at.max(synced_at);
    }
}

/// Raw account data returned by the upstream fetcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountData {
    pub id: AccountId,
    pub username: Option<String>,
    pub hidden: Option<bool>,
    pub account_created_at: Option<DateTime<Utc>>,
    pub last_battle_at: Option<DateTime<Utc>>,
    pub site_karma: Option<i32>,
    pub performance_rating: Option<i32>,
    pub teamplay_rating: Option<i32>,
    pub courtesy_rating: Option<i32>,
}

impl AccountData {
    /// Minimal payload carrying only an id and a username.
    pub fn new(id: AccountId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: Some(username.into()),
            ..Default::default()
        }
    }

    /// Set the site karma.
    #[must_use]
    pub const fn with_karma(mut self, karma: i32) -> Self {
        self.site_karma = Some(karma);
        self
    }

    /// Set the three community ratings.
    #[must_use]
    pub const fn with_ratings(mut self, performance: i32, teamplay: i32, courtesy: i32) -> Self {
        self.performance_rating = Some(performance);
        self.teamplay_rating = Some(teamplay);
        self.courtesy_rating = Some(courtesy);
        self
    }
}

/// Site karma projection for bulk lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKarma {
    pub id: AccountId,
    pub site_karma: i32,
}

/// All four ratings for bulk lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFullKarma {
    pub id: AccountId,
    pub site_karma: i32,
    pub performance: i32,
    pub teamplay: i32,
    pub courtesy: i32,
}

impl From<&PlayerRecord> for AccountKarma {
    fn from(record: &PlayerRecord) -> Self {
        Self {
            id: record.id,
            site_karma: record.site_karma,
        }
    }
}

impl From<&PlayerRecord> for AccountFullKarma {
    fn from(record: &PlayerRecord) -> Self {
        Self {
            id: record.id,
            site_karma: record.site_karma,
            performance: record.performance_rating,
            teamplay: record.teamplay_rating,
            courtesy: record.courtesy_rating,
        }
    }
}

/// One hit from an upstream player search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountListing {
    pub id: AccountId,
    pub username: String,
}
