//! IDE feature tests
//!
//! Tests for:
//! - Go to definition
//! - File diagnostics

pub mod tests_diagnostics;
pub mod tests_goto;
