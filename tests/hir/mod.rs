//! HIR layer tests
//!
//! Tests for the name-resolution model:
//! - Index round-trips through the host
//! - Uses-clause visibility and ambiguity across units
//! - Member visibility and inheritance in chains
//! - Unit lookup with scope-name aliases

pub mod tests_index;
pub mod tests_member_visibility;
pub mod tests_unit_aliases;
pub mod tests_uses_visibility;
