//! karma-sync - player karma records cached from the upstream account API
//!
//! Player records are kept in SQLite and served while they are younger than
//! a freshness window. Older or missing records are fetched from the
//! upstream account API, overlaid onto what is stored and written back.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): player models, configuration and port traits
//! - **Adapters** (`adapters`): SQLite store, moka read cache, upstream HTTP client, test doubles
//! - **Service Layer** (`services`): freshness policy, synchronization cache, bulk projections
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging and setup
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use karma_sync::domain::models::Config;
//! use karma_sync::infrastructure::setup::AppContext;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = AppContext::build(&Config::default()).await?;
//!     if let Some(player) = ctx.sync.get_player(42).await {
//!         println!("{} has {} karma", player.username, player.site_karma);
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    AccountData, AccountFullKarma, AccountId, AccountKarma, AccountListing, Config, PlayerRecord, Region,
};
pub use domain::ports::{AccountFetcher, Clock, FetchError, PlayerRepository};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{FreshnessPolicy, PlayerDirectory, PlayerSyncCache, SyncError};
