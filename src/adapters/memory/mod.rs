//! In-memory adapters for tests and local experiments.

pub mod player_repository;

pub use player_repository::{InMemoryPlayerRepository, RepositoryStats};
