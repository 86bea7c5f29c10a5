//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces the player cache depends on:
//! - PlayerRepository: keyed persistence of player records
//! - AccountFetcher: upstream account API
//! - Clock: source of synchronization timestamps

pub mod account_fetcher;
pub mod clock;
pub mod player_repository;

pub use account_fetcher::{AccountFetcher, FetchError};
pub use clock::{Clock, SystemClock};
pub use player_repository::PlayerRepository;
