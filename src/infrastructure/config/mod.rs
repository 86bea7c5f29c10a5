//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - Programmatic defaults
//! - `.karma/config.yaml` and `.karma/local.yaml`
//! - `KARMA_` environment variable overrides
//! - Validation after extraction

pub mod loader;

pub use loader::{ConfigError, ConfigLoader, CONFIG_DIR};
