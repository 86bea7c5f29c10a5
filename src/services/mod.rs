//! Service layer: freshness policy, player synchronization and projections.

pub mod freshness;
pub mod player_directory;
pub mod player_sync;

pub use freshness::{FreshnessPolicy, SyncPlan};
pub use player_directory::{PlayerDirectory, MIN_SEARCH_LEN};
pub use player_sync::{PlayerSyncCache, SyncError};
