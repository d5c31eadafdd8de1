//! # unitscope-base
//!
//! Core library for indexing Object Pascal units and resolving names
//! across them.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide       → AnalysisHost / Analysis, goto-definition
//!   ↓
//! project   → Files, descriptors, configuration, activation closure
//!   ↓
//! hir       → Skeletons, definition index, unit/scope/chain resolution
//!   ↓
//! parser    → Logos lexer, keywords, token cursor
//!   ↓
//! base      → Primitives (FileId, case-folded names, TextRange)
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → hir → project → ide)
// ============================================================================

/// Foundation types: FileId, case-insensitive names, TextRange
pub mod base;

/// Token layer: Logos lexer, reserved words, cursor
pub mod parser;

/// High-level IR: declaration skeletons, index and resolvers
pub mod hir;

/// Project management: overlay, descriptors, activation
pub mod project;

/// IDE features: analysis host and snapshot, goto-definition
pub mod ide;

// Re-export commonly needed items
pub use parser::keywords;

// Re-export foundation types
pub use base::{FileId, LineCol, LineIndex, TextRange, TextSize};
pub use hir::{ChainResult, DefinitionRecord, ResolveResult};
pub use ide::{Analysis, AnalysisHost};
