//! Integration test utilities
//!
//! Spawns the API on a local port, backed by the in-memory store unless a
//! real database is configured, and provides response fixtures.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
