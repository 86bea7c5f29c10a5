//! Infrastructure adapters for external systems.

pub mod cache;
pub mod clock;
pub mod memory;
pub mod sqlite;
pub mod upstream;
