//! Shared helpers for integration tests.

pub mod sources;
pub mod workspace;
