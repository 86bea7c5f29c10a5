//! Upstream account API adapters.

pub mod client;
pub mod mock;
pub mod models;

pub use client::{ClientBuildError, VortexClient, VortexClientConfig};
pub use mock::MockAccountFetcher;
