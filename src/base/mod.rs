//! Foundation types for the unitscope toolchain.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`FileId`] - Interned file identifiers
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - [`LineCol`], [`LineIndex`] - Line/column conversion
//! - [`fold_name`], [`names_eq`] - Case-insensitive naming
//! - Domain constants (file extensions, implicit units)
//!
//! This module has NO dependencies on other unitscope modules.

pub mod constants;
mod file_id;
mod name;
mod span;

pub use file_id::FileId;
pub use name::{fold_name, names_eq, strip_generic_args};
pub use span::{LineCol, LineIndex, TextRange, TextSize};

// Re-export text-size types for convenience
pub use text_size;
