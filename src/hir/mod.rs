//! High-level IR (HIR) — declaration records, the index and name resolution.
//!
//! ## Key Types
//!
//! - [`FileSkeleton`] — declarations extracted from one file
//! - [`DefinitionRecord`] — one declaration, with a [`DefinitionData`] payload
//! - [`DefinitionIndex`] — multi-key index over the active files
//! - [`UnitResolver`] — unit name → file
//! - [`Resolver`] — scope-aware name and member-chain resolution
//! - [`RootDatabase`] — Salsa database memoizing extraction
//!
//! ## Query Layers
//!
//! ```text
//! file_text(file)             ← INPUT: raw source text
//!     │
//!     ▼
//! file_skeleton(file)         ← declaration records + uses (per-file)
//!     │
//!     ▼
//! DefinitionIndex             ← active files only, replaced per file
//!     │
//!     ▼
//! resolve(name, file, offset) ← scope layers, uses visibility
//! resolve_chain(segments, ..) ← members of static types
//!     │
//!     ▼
//! check_file(file)            ← ambiguity / missing-uses diagnostics
//! ```

mod chain;
mod db;
mod diagnostics;
mod index;
mod records;
mod resolve;
mod skeleton;
mod units;
mod uses;

pub use chain::ChainResult;
pub use db::{FileText, RootDatabase, file_skeleton};
pub use diagnostics::{Diagnostic, DiagnosticCollector, RelatedInfo, Severity, check_file, codes};
pub use index::DefinitionIndex;
pub use records::{
    AttributeDef, AttributeTarget, DefKind, DefinitionData, DefinitionRecord, GenericParam, Param,
    ParamModifier, ParseSkip, PropertyDef, RoutineDef, RoutineKind, SCHEMA_VERSION, ScopedKey, Section,
    TypeDef, TypeKind, VariableDef, VariableKind, Visibility,
};
pub use resolve::{NamePosition, ResolveResult, Resolver, UsesSection};
pub use skeleton::{FileSkeleton, declaration_of, extract};
pub use units::UnitResolver;
pub use uses::{HeaderKind, UsesEntry, UsesInfo, parse_uses, scan_uses};
