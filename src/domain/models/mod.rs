pub mod config;
pub mod player;
pub mod region;

pub use config::{
    CacheConfig, Config, DatabaseConfig, LoggingConfig, RateLimitConfig, RetryConfig, SyncConfig,
    UpstreamConfig,
};
pub use player::{
    is_sentinel, AccountData, AccountFullKarma, AccountId, AccountKarma, AccountListing,
    PlayerRecord,
};
pub use region::Region;
