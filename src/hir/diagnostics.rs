//! Diagnostics — resolution problems and extractor recoveries.
//!
//! Every type name a file's records mention is resolved where it is
//! written. Names that bind to several in-scope units, or only to units
//! missing from the uses clauses, become diagnostics; names that resolve to
//! nothing are silent, since most of them live in units outside the index.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use text_size::TextRange;

use super::records::{DefinitionData, DefinitionRecord, Param};
use super::resolve::{Lookup, Resolver, UsesSection};
use super::skeleton::FileSkeleton;
use crate::base::{FileId, LineIndex, fold_name, names_eq, strip_generic_args};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// Convert to LSP severity number.
    pub fn to_lsp(&self) -> u32 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
            Severity::Hint => 4,
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: FileId,
    /// Start line (0-indexed).
    pub start_line: u32,
    /// Start column (0-indexed).
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub severity: Severity,
    /// Diagnostic code (e.g., "U0001").
    pub code: Option<Arc<str>>,
    pub message: Arc<str>,
    /// Declarations the message refers to.
    pub related: Vec<RelatedInfo>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelatedInfo {
    pub file: FileId,
    /// Range of the related declaration's name.
    pub range: TextRange,
    pub message: Arc<str>,
}

impl Diagnostic {
    fn new(file: FileId, severity: Severity, message: impl Into<Arc<str>>) -> Self {
        Self {
            file,
            start_line: 0,
            start_col: 0,
            end_line: 0,
            end_col: 0,
            severity,
            code: None,
            message: message.into(),
            related: Vec::new(),
        }
    }

    /// Create a new error diagnostic.
    pub fn error(file: FileId, message: impl Into<Arc<str>>) -> Self {
        Self::new(file, Severity::Error, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(file: FileId, message: impl Into<Arc<str>>) -> Self {
        Self::new(file, Severity::Warning, message)
    }

    pub fn hint(file: FileId, message: impl Into<Arc<str>>) -> Self {
        Self::new(file, Severity::Hint, message)
    }

    /// Place the diagnostic on `range`.
    pub fn with_range(mut self, lines: &LineIndex, range: TextRange) -> Self {
        let start = lines.line_col(range.start());
        let end = lines.line_col(range.end());
        self.start_line = start.line;
        self.start_col = start.col;
        self.end_line = end.line;
        self.end_col = end.col;
        self
    }

    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Diagnostic codes.
pub mod codes {
    /// A name is declared by several units in scope.
    pub const AMBIGUOUS_REFERENCE: &str = "U0001";
    /// A name is declared only by units missing from the uses clauses.
    pub const MISSING_USES: &str = "U0002";
    /// Unparseable tokens were skipped.
    pub const SKIPPED_TOKENS: &str = "U0003";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics for one or more files.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == severity).count()
    }

    /// Sorted by position, duplicates removed.
    pub fn finish(mut self) -> Vec<Diagnostic> {
        self.diagnostics
            .sort_by_key(|d| (d.start_line, d.start_col, d.code.clone(), d.message.clone()));
        self.diagnostics.dedup();
        self.diagnostics
    }
}

// ============================================================================
// FILE CHECKER
// ============================================================================

/// Check every type reference in `skel`, plus its skipped token runs.
pub fn check_file(resolver: &Resolver<'_>, file: FileId, skel: &FileSkeleton, text: &str) -> Vec<Diagnostic> {
    let lines = LineIndex::new(text);
    let mut collector = DiagnosticCollector::new();

    for record in &skel.records {
        let generics = generic_names_in_scope(skel, record);
        for type_name in referenced_types(record) {
            let Some(name) = plain_type_name(type_name) else {
                continue;
            };
            if generics.contains(&fold_name(&name)) {
                continue;
            }
            match resolver.lookup_type(&name, file, record.range.start()) {
                Lookup::Ambiguous(units) => {
                    let message = format!("'{}' is declared by several units in scope: {}", name, units.join(", "));
                    collector.add(
                        Diagnostic::warning(file, message)
                            .with_range(&lines, record.range)
                            .with_code(codes::AMBIGUOUS_REFERENCE),
                    );
                }
                Lookup::MissingUses {
                    unit,
                    section,
                    candidates,
                } => {
                    let target = match section {
                        UsesSection::Interface => "interface",
                        UsesSection::Implementation => "implementation",
                    };
                    let message = format!("'{}' is declared in unit {}, add it to the {} uses clause", name, unit, target);
                    let mut diagnostic = Diagnostic::error(file, message)
                        .with_range(&lines, record.range)
                        .with_code(codes::MISSING_USES);
                    for candidate in candidates {
                        diagnostic = diagnostic.with_related(RelatedInfo {
                            file: candidate.file,
                            range: candidate.range,
                            message: format!("declared in {}", candidate.unit).into(),
                        });
                    }
                    collector.add(diagnostic);
                }
                Lookup::Unique(_) | Lookup::NotFound => {}
            }
        }
    }

    for skip in &skel.skipped {
        let message = format!("skipped unparseable tokens in {}", skip.context);
        collector.add(
            Diagnostic::hint(file, message)
                .with_range(&lines, skip.range)
                .with_code(codes::SKIPPED_TOKENS),
        );
    }

    let diagnostics = collector.finish();
    tracing::trace!("[DIAGNOSTICS] {} in {}", diagnostics.len(), file);
    diagnostics
}

/// Type names written in a record's declaration.
fn referenced_types(record: &DefinitionRecord) -> Vec<&str> {
    fn params(params: &[Param]) -> impl Iterator<Item = &str> {
        params.iter().filter_map(|p| p.type_name.as_deref())
    }
    match &record.data {
        DefinitionData::Type(t) => t
            .parent
            .iter()
            .chain(&t.interfaces)
            .chain(&t.alias_target)
            .chain(&t.helper_for)
            .map(|s| s.as_str())
            .collect(),
        DefinitionData::Routine(r) => params(&r.params).chain(r.return_type.as_deref()).collect(),
        DefinitionData::Property(p) => params(&p.index_params).chain(p.type_name.as_deref()).collect(),
        DefinitionData::Variable(v) => v.type_name.as_deref().into_iter().collect(),
        DefinitionData::Attribute(_) => Vec::new(),
    }
}

/// Generic parameter names visible to `record`: its own, those of the
/// types that enclose it and those of routine bodies around it.
fn generic_names_in_scope(skel: &FileSkeleton, record: &DefinitionRecord) -> FxHashSet<SmolStr> {
    let mut names = FxHashSet::default();
    let mut add = |r: &DefinitionRecord| {
        let generics = match &r.data {
            DefinitionData::Type(t) => &t.generics,
            DefinitionData::Routine(d) => &d.generics,
            _ => return,
        };
        names.extend(generics.iter().map(|g| fold_name(&g.name)));
    };
    add(record);
    for routine in &skel.records {
        let is_body = routine.as_routine().is_some_and(|d| d.is_implementation);
        if is_body && !std::ptr::eq(routine, record) && routine.contains(record.range.start()) {
            add(routine);
        }
    }
    let Some(owner) = record.owner.as_deref() else {
        return names;
    };
    for r in &skel.records {
        let path = r.member_owner_path();
        let encloses = names_eq(owner, &path)
            || owner
                .get(..path.len())
                .is_some_and(|prefix| names_eq(prefix, &path) && owner[path.len()..].starts_with('.'));
        if encloses {
            add(r);
        }
    }
    names
}

/// The named type inside a type expression: element types of `array of`
/// and `set of`, pointer targets, generic arguments stripped. `None` for
/// anonymous structures.
fn plain_type_name(text: &str) -> Option<SmolStr> {
    let mut rest = text.trim();
    loop {
        rest = rest.trim_start_matches('^').trim_start();
        if let Some(after) = strip_word(rest, "array") {
            let after = match after.strip_prefix('[') {
                Some(bounds) => &bounds[bounds.find(']')? + 1..],
                None => after,
            };
            rest = strip_word(after.trim_start(), "of")?;
        } else if let Some(after) = strip_word(rest, "set") {
            rest = strip_word(after, "of")?;
        } else {
            break;
        }
    }
    let name = strip_generic_args(rest);
    let valid = !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
                && chars.all(|c| c.is_alphanumeric() || c == '_')
        });
    valid.then_some(name)
}

/// `text` without a leading keyword `word`, trimmed.
fn strip_word<'t>(text: &'t str, word: &str) -> Option<&'t str> {
    let head = text.get(..word.len())?;
    let rest = &text[word.len()..];
    let boundary = rest.chars().next().is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
    (names_eq(head, word) && boundary).then(|| rest.trim_start())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::hir::index::DefinitionIndex;
    use crate::hir::skeleton::extract;
    use crate::hir::units::UnitResolver;

    fn check(files: &[(&str, &str)]) -> Vec<Diagnostic> {
        let mut index = DefinitionIndex::new();
        let mut units = UnitResolver::new();
        for (i, (path, text)) in files.iter().enumerate() {
            let file = FileId::new(i as u32);
            let skel = extract(file, text, "X");
            units.add_candidate(file, Path::new(path));
            units.set_declared(file, &skel.unit);
            index.replace_file(file, skel);
        }
        let implicit = vec![SmolStr::new("System")];
        let resolver = Resolver::new(&index, &units, &implicit);
        let first = FileId::new(0);
        let skel = index.skeleton(first).unwrap();
        check_file(&resolver, first, skel, files[0].1)
    }

    #[test]
    fn test_plain_type_name() {
        assert_eq!(plain_type_name("TFoo").as_deref(), Some("TFoo"));
        assert_eq!(plain_type_name("array of TFoo").as_deref(), Some("TFoo"));
        assert_eq!(plain_type_name("array [0..3] of ^TFoo").as_deref(), Some("TFoo"));
        assert_eq!(plain_type_name("array[0..3]of^TFoo").as_deref(), Some("TFoo"));
        assert_eq!(plain_type_name("Arrays").as_deref(), Some("Arrays"));
        assert_eq!(plain_type_name("set of TColor").as_deref(), Some("TColor"));
        assert_eq!(plain_type_name("TList<Integer>").as_deref(), Some("TList"));
        assert_eq!(plain_type_name("System.TObject").as_deref(), Some("System.TObject"));
        assert_eq!(plain_type_name("(a, b)"), None);
        assert_eq!(plain_type_name("string[10]"), None);
    }

    #[test]
    fn test_missing_uses_reported_with_candidates() {
        let diagnostics = check(&[
            ("A.pas", "unit A;\ninterface\nvar\n  X: TThing;\nimplementation\nend."),
            ("B.pas", "unit B; interface type TThing = class end; implementation end."),
        ]);
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.code.as_deref(), Some(codes::MISSING_USES));
        assert_eq!((d.start_line, d.start_col), (3, 2));
        assert!(d.message.contains("interface uses"));
        assert_eq!(d.related.len(), 1);
        assert_eq!(d.related[0].file, FileId::new(1));
    }

    #[test]
    fn test_ambiguous_reported_as_warning() {
        let diagnostics = check(&[
            ("A.pas", "unit A; interface uses B1, B2; type TDerived = class(TBase) end; implementation end."),
            ("B1.pas", "unit B1; interface type TBase = class end; implementation end."),
            ("B2.pas", "unit B2; interface type TBase = class end; implementation end."),
        ]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].code.as_deref(), Some(codes::AMBIGUOUS_REFERENCE));
        assert!(diagnostics[0].message.contains("B1, B2"));
    }

    #[test]
    fn test_generic_params_and_unknown_names_are_silent() {
        let diagnostics = check(&[
            (
                "A.pas",
                "unit A; interface type TBox<T> = class FItem: T; function Get: T; end; var N: Integer; implementation end.",
            ),
            ("B.pas", "unit B; interface type T = record end; implementation end."),
        ]);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn test_method_type_params_are_silent() {
        let diagnostics = check(&[
            (
                "A.pas",
                "unit A; interface type TBox<T> = class function Map<U>(const V: T): U; end; \
                 implementation function TBox<T>.Map<U>(const V: T): U; var Tmp: U; begin end; end.",
            ),
            ("B.pas", "unit B; interface type U = record end; implementation end."),
        ]);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn test_skipped_tokens_are_hints() {
        let diagnostics = check(&[(
            "A.pas",
            "unit A; interface type TFoo = class FOk: Integer; 123 + garbage; FNext: Integer; end; implementation end.",
        )]);
        assert!(diagnostics.iter().any(|d| d.code.as_deref() == Some(codes::SKIPPED_TOKENS)
            && d.severity == Severity::Hint
            && d.message.contains("type body")));
    }

    #[test]
    fn test_severity_to_lsp() {
        assert_eq!(Severity::Error.to_lsp(), 1);
        assert_eq!(Severity::Hint.to_lsp(), 4);
    }
}
