//! In-memory caching layer for hot-path repository reads.
//!
//! Uses `moka` for concurrent caching with write-through updates. Wraps
//! repository traits as decorators.

pub mod cached_player_repository;

pub use cached_player_repository::CachedPlayerRepository;
