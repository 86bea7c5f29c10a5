//! Infrastructure layer module
//!
//! Configuration loading, logging setup and project initialization. The
//! adapters that satisfy the domain ports live in `crate::adapters`.

pub mod config;
pub mod logging;
pub mod setup;

pub use config::{ConfigError, ConfigLoader};
pub use logging::{LogConfig, LoggerImpl};
pub use setup::{initialize_project, AppContext, SetupPaths, SetupReport};
