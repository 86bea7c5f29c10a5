//! Domain layer for karma-sync
//!
//! Player records, configuration models, errors and the port traits the
//! adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
