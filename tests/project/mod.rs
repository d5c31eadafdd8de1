//! Project layer tests
//!
//! Tests for:
//! - Activation closure driven through the host
//! - Project descriptors and search paths
//! - Background activation scheduling
//! - Index snapshots

pub mod tests_activation;
pub mod tests_descriptor;
#[cfg(feature = "persistence")]
pub mod tests_persistence;
pub mod tests_scheduler;
