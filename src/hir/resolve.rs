//! Scope-aware name resolution.
//!
//! [`Resolver::resolve_at`] answers "what does `name` mean at `offset` in
//! `file`" in layers, the first non-empty layer winning:
//!
//! 1. lexical scopes: inline variables, then the innermost routine's
//!    parameters and locals, then members of the method's type (and its
//!    ancestors), then outer routines of a nested routine
//! 2. top-level declarations of the same file
//! 3. interface declarations of other indexed files, filtered by the
//!    uses clauses visible at `offset`
//!
//! Layer 3 never guesses. Several visible units give
//! [`ResolveResult::Ambiguous`]; candidates whose units are not visible
//! give [`ResolveResult::MissingUses`].

use smol_str::SmolStr;
use text_size::TextSize;

use crate::base::{FileId, names_eq, strip_generic_args};

use super::chain::AccessContext;
use super::index::DefinitionIndex;
use super::records::{DefKind, DefinitionRecord, Section, VariableKind};
use super::skeleton::FileSkeleton;
use super::units::UnitResolver;
use super::uses::UsesInfo;

// ============================================================================
// RESOLUTION RESULT
// ============================================================================

/// Which uses list a missing unit belongs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UsesSection {
    Interface,
    Implementation,
}

/// Result of resolving a name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveResult {
    /// Bound to a single declaration.
    Unique(DefinitionRecord),
    /// Declared by several units visible at the reference.
    Ambiguous(Vec<SmolStr>),
    /// Declared only by units that are not in scope. `unit` is the first of
    /// them; `candidates` holds every out-of-scope declaration.
    MissingUses {
        unit: SmolStr,
        section: UsesSection,
        candidates: Vec<DefinitionRecord>,
    },
    NotFound,
}

impl ResolveResult {
    /// Get the resolved record if unique.
    pub fn record(&self) -> Option<&DefinitionRecord> {
        match self {
            ResolveResult::Unique(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<DefinitionRecord> {
        match self {
            ResolveResult::Unique(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ResolveResult::Unique(_))
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ResolveResult::Ambiguous(_))
    }
}

/// Syntactic position of the name being resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum NamePosition {
    /// Bare identifier: variables win over same-named routines.
    #[default]
    Bare,
    /// Inside a call's argument list: routines win.
    CallArgument,
}

/// Borrowed form of [`ResolveResult`] used while walking the index.
#[derive(Clone, Debug)]
pub(super) enum Lookup<'a> {
    Unique(&'a DefinitionRecord),
    Ambiguous(Vec<SmolStr>),
    MissingUses {
        unit: SmolStr,
        section: UsesSection,
        candidates: Vec<&'a DefinitionRecord>,
    },
    NotFound,
}

impl<'a> Lookup<'a> {
    pub(super) fn unique(&self) -> Option<&'a DefinitionRecord> {
        match self {
            Lookup::Unique(r) => Some(r),
            _ => None,
        }
    }

    fn into_result(self) -> ResolveResult {
        match self {
            Lookup::Unique(r) => ResolveResult::Unique(r.clone()),
            Lookup::Ambiguous(units) => ResolveResult::Ambiguous(units),
            Lookup::MissingUses {
                unit,
                section,
                candidates,
            } => ResolveResult::MissingUses {
                unit,
                section,
                candidates: candidates.into_iter().cloned().collect(),
            },
            Lookup::NotFound => ResolveResult::NotFound,
        }
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Name resolver over the definition index.
///
/// Holds only borrows; build one per query batch from an
/// [`Analysis`](crate::ide::Analysis) snapshot.
#[derive(Clone, Copy, Debug)]
pub struct Resolver<'a> {
    pub(super) index: &'a DefinitionIndex,
    pub(super) units: &'a UnitResolver,
    implicit_units: &'a [SmolStr],
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a DefinitionIndex, units: &'a UnitResolver, implicit_units: &'a [SmolStr]) -> Self {
        Self {
            index,
            units,
            implicit_units,
        }
    }

    /// Resolve `name` at `offset`, taking the name's position from the
    /// file's recorded call-argument ranges.
    pub fn resolve(&self, name: &str, file: FileId, offset: TextSize) -> ResolveResult {
        self.lookup(name, file, offset).into_result()
    }

    /// Resolve `name` at `offset` with an explicit name position.
    pub fn resolve_at(&self, name: &str, file: FileId, offset: TextSize, position: NamePosition) -> ResolveResult {
        self.lookup_at(name, file, offset, position).into_result()
    }

    /// Exported declarations of `name` in `units`: the candidates behind an
    /// [`ResolveResult::Ambiguous`].
    pub fn declarations_in_units(&self, name: &str, units: &[SmolStr]) -> Vec<DefinitionRecord> {
        self.index
            .find_by_name(name)
            .into_iter()
            .filter(|r| r.is_top_level() && r.section == Section::Interface)
            .filter(|r| units.iter().any(|u| names_eq(u, &r.unit)))
            .cloned()
            .collect()
    }

    pub(super) fn lookup(&self, name: &str, file: FileId, offset: TextSize) -> Lookup<'a> {
        let position = match self.index.skeleton(file) {
            Some(skel) if skel.in_call_args(offset) => NamePosition::CallArgument,
            _ => NamePosition::Bare,
        };
        self.lookup_at(name, file, offset, position)
    }

    pub(super) fn lookup_at(&self, name: &str, file: FileId, offset: TextSize, position: NamePosition) -> Lookup<'a> {
        let Some(skel) = self.index.skeleton(file) else {
            tracing::trace!("[RESOLVE] {} is not indexed", file);
            return Lookup::NotFound;
        };
        let skel: &'a FileSkeleton = skel;

        if let Some(record) = self.resolve_lexical(skel, name, offset, position) {
            tracing::trace!("[RESOLVE] '{}' in {} -> lexical {:?}", name, file, record.owner);
            return Lookup::Unique(record);
        }

        let same_file: Vec<&DefinitionRecord> =
            skel.records.iter().filter(|r| r.is_top_level() && r.is_named(name)).collect();
        if let Some(record) = pick(&same_file, position) {
            tracing::trace!("[RESOLVE] '{}' in {} -> same file", name, file);
            return Lookup::Unique(record);
        }

        self.resolve_cross_file(name, file, &skel.uses, offset, position)
    }

    /// Resolve a type name as written in a declaration at `offset`:
    /// generic arguments stripped, dotted qualifiers honored, non-type
    /// bindings skipped.
    pub(super) fn lookup_type(&self, name: &str, file: FileId, offset: TextSize) -> Lookup<'a> {
        let name = strip_generic_args(name);
        if let Some(last_dot) = name.rfind('.') {
            return self.lookup_dotted_type(&name, last_dot, file, offset);
        }
        let found = self.lookup_at(&name, file, offset, NamePosition::Bare);
        match found {
            Lookup::Unique(r) if r.kind() != DefKind::Type => self.lookup_type_only(&name, file, offset),
            other => other,
        }
    }

    /// Like [`lookup_type`](Self::lookup_type) but considering type records only.
    fn lookup_type_only(&self, name: &str, file: FileId, offset: TextSize) -> Lookup<'a> {
        let Some(skel) = self.index.skeleton(file) else {
            return Lookup::NotFound;
        };
        let skel: &'a FileSkeleton = skel;
        let local: Vec<&DefinitionRecord> = skel
            .records
            .iter()
            .filter(|r| r.kind() == DefKind::Type && r.is_named(name))
            .filter(|r| r.is_top_level() || self.type_in_scope(skel, r, offset))
            .collect();
        if let Some(record) = pick(&local, NamePosition::Bare) {
            return Lookup::Unique(record);
        }
        match self.resolve_cross_file(name, file, &skel.uses, offset, NamePosition::Bare) {
            Lookup::Unique(r) if r.kind() != DefKind::Type => Lookup::NotFound,
            other => other,
        }
    }

    /// A nested or local type is in scope inside its owner: the owning
    /// type's body, the owning routine, or methods of the owning type.
    fn type_in_scope(&self, skel: &FileSkeleton, record: &DefinitionRecord, offset: TextSize) -> bool {
        let Some(owner) = record.owner.as_deref() else {
            return false;
        };
        let in_owner_type = skel
            .records
            .iter()
            .filter(|r| r.kind() == DefKind::Type && names_eq(&r.member_owner_path(), owner))
            .any(|r| r.contains(offset));
        let routines = enclosing_routines(skel, offset);
        let in_owner_routine = routines.iter().any(|r| names_eq(&routine_path(r), owner));
        let in_method = routines
            .last()
            .and_then(|outer| outer.owner.as_deref())
            .is_some_and(|method_owner| names_eq(method_owner, owner));
        in_owner_type || in_owner_routine || in_method
    }

    /// `Unit.TType`, `TOuter.TInner` or `System.SysUtils.TType`.
    fn lookup_dotted_type(&self, name: &str, last_dot: usize, file: FileId, offset: TextSize) -> Lookup<'a> {
        let (qualifier, member) = (&name[..last_dot], &name[last_dot + 1..]);

        if let Some(target) = self.visible_unit_file(file, qualifier, offset) {
            let found: Vec<&DefinitionRecord> = self
                .unit_exports(target, file)
                .filter(|r| r.kind() == DefKind::Type && r.is_named(member))
                .collect();
            return pick(&found, NamePosition::Bare).map_or(Lookup::NotFound, Lookup::Unique);
        }

        let Some(outer) = self.lookup_type(qualifier, file, offset).unique() else {
            return Lookup::NotFound;
        };
        let path = outer.member_owner_path();
        self.index
            .records_in_file(outer.file)
            .iter()
            .find(|r| {
                r.kind() == DefKind::Type
                    && r.is_named(member)
                    && r.owner.as_deref().is_some_and(|o| names_eq(o, &path))
            })
            .map_or(Lookup::NotFound, Lookup::Unique)
    }

    /// Top-level records of `target` that `from` may see by qualifying
    /// with the unit name.
    pub(super) fn unit_exports(&self, target: FileId, from: FileId) -> impl Iterator<Item = &'a DefinitionRecord> {
        self.index
            .records_in_file(target)
            .iter()
            .filter(move |r| r.is_top_level() && (target == from || r.section == Section::Interface))
    }

    /// The file of unit `name` if the unit is `file` itself or is visible
    /// at `offset` in `file`.
    pub(super) fn visible_unit_file(&self, file: FileId, name: &str, offset: TextSize) -> Option<FileId> {
        let skel = self.index.skeleton(file)?;
        if names_eq(&skel.unit, name) {
            return Some(file);
        }
        if !self.is_implicit(name) && !skel.uses.is_visible(name, offset) {
            let via_alias = skel
                .uses
                .visible_at(offset)
                .any(|entry| self.units.resolve(&entry.name).is_some_and(|f| self.units.names_file(name, f)));
            if !via_alias {
                return None;
            }
        }
        self.units.resolve(name).filter(|f| self.index.contains_file(*f))
    }

    fn is_implicit(&self, unit: &str) -> bool {
        self.implicit_units.iter().any(|u| names_eq(u, unit))
    }

    // ------------------------------------------------------------------------
    // Layer 1: lexical scopes
    // ------------------------------------------------------------------------

    fn resolve_lexical(
        &self,
        skel: &'a FileSkeleton,
        name: &str,
        offset: TextSize,
        position: NamePosition,
    ) -> Option<&'a DefinitionRecord> {
        // inline variables, innermost block first
        let mut inline: Vec<&DefinitionRecord> = skel
            .records
            .iter()
            .filter(|r| r.is_named(name) && r.range.start() <= offset)
            .filter(|r| {
                r.as_variable().is_some_and(|v| {
                    v.is_inline && v.scope_range.is_some_and(|s| s.contains_inclusive(offset))
                })
            })
            .collect();
        inline.sort_by_key(|r| r.as_variable().and_then(|v| v.scope_range).map(|s| s.len()));
        if let Some(first) = inline.first() {
            return Some(first);
        }

        let routines = enclosing_routines(skel, offset);
        if let Some(innermost) = routines.first() {
            let own = routine_scope(skel, innermost, name, offset);
            if let Some(record) = pick(&own, position) {
                return Some(record);
            }
        }

        // the method's type, then every type body around the offset
        let method_type = self.method_type_at(skel, offset);
        let mut enclosing: Vec<&'a DefinitionRecord> = method_type.into_iter().collect();
        let bodies = enclosing_type_bodies(skel, offset);
        enclosing.extend(bodies.filter(|t| method_type.is_none_or(|m| !std::ptr::eq(m, *t))));
        for ty in enclosing {
            let context = AccessContext::new(ty.file, Some(ty));
            if let Some(record) = self.find_member(ty, name, &context, position) {
                return Some(record);
            }
        }

        routines.iter().skip(1).find_map(|routine| {
            let scope = routine_scope(skel, routine, name, offset);
            pick(&scope, position)
        })
    }

    /// The type whose method body contains `offset`, or the innermost type
    /// body containing it.
    pub(super) fn method_type_at(&self, skel: &'a FileSkeleton, offset: TextSize) -> Option<&'a DefinitionRecord> {
        let routines = enclosing_routines(skel, offset);
        if let Some(owner) = routines.last().and_then(|r| r.owner.as_deref()) {
            let found = skel
                .records
                .iter()
                .filter(|r| r.kind() == DefKind::Type && names_eq(&r.member_owner_path(), owner))
                .find(|r| r.as_type().is_some_and(|t| !t.is_forward));
            if found.is_some() {
                return found;
            }
        }
        enclosing_type_bodies(skel, offset).next()
    }

    // ------------------------------------------------------------------------
    // Layer 3: other files
    // ------------------------------------------------------------------------

    fn resolve_cross_file(
        &self,
        name: &str,
        file: FileId,
        uses: &UsesInfo,
        offset: TextSize,
        position: NamePosition,
    ) -> Lookup<'a> {
        let candidates: Vec<&'a DefinitionRecord> = self
            .index
            .find_by_name(name)
            .into_iter()
            .filter(|r| r.file != file && r.is_top_level() && r.section == Section::Interface)
            .collect();
        if candidates.is_empty() {
            tracing::trace!("[RESOLVE] '{}' not found from {}", name, file);
            return Lookup::NotFound;
        }

        let (visible, hidden): (Vec<&DefinitionRecord>, Vec<&DefinitionRecord>) = candidates
            .into_iter()
            .partition(|r| self.unit_visible(uses, r, offset));

        let mut units: Vec<SmolStr> = Vec::new();
        for record in &visible {
            if !units.iter().any(|u| names_eq(u, &record.unit)) {
                units.push(record.unit.clone());
            }
        }

        match units.len() {
            0 => {
                let section = match uses.section_at(offset) {
                    Section::Implementation => UsesSection::Implementation,
                    Section::Interface | Section::Program => UsesSection::Interface,
                };
                let unit = hidden[0].unit.clone();
                tracing::debug!("[RESOLVE] '{}' in {} needs uses {} ({:?})", name, file, unit, section);
                Lookup::MissingUses {
                    unit,
                    section,
                    candidates: hidden,
                }
            }
            1 => pick(&visible, position).map_or(Lookup::NotFound, Lookup::Unique),
            _ => {
                tracing::debug!("[RESOLVE] '{}' in {} is ambiguous: {:?}", name, file, units);
                Lookup::Ambiguous(units)
            }
        }
    }

    /// Whether the unit declaring `record` is reachable through `uses` at `offset`.
    fn unit_visible(&self, uses: &UsesInfo, record: &DefinitionRecord, offset: TextSize) -> bool {
        if self.is_implicit(&record.unit) {
            return true;
        }
        uses.visible_at(offset).any(|entry| {
            names_eq(&entry.name, &record.unit) || self.units.names_file(&entry.name, record.file)
        })
    }
}

/// Implementation routines whose extent contains `offset`, innermost first.
pub(super) fn enclosing_routines(skel: &FileSkeleton, offset: TextSize) -> Vec<&DefinitionRecord> {
    let mut routines: Vec<&DefinitionRecord> = skel
        .records
        .iter()
        .filter(|r| r.is_implementation() && r.contains(offset))
        .collect();
    routines.sort_by_key(|r| r.extent.len());
    routines
}

/// Type records with members whose body contains `offset`, innermost first.
fn enclosing_type_bodies(skel: &FileSkeleton, offset: TextSize) -> impl Iterator<Item = &DefinitionRecord> {
    let mut types: Vec<&DefinitionRecord> = skel
        .records
        .iter()
        .filter(|r| r.as_type().is_some_and(|t| t.kind.has_members() && !t.is_forward) && r.contains(offset))
        .collect();
    types.sort_by_key(|r| r.extent.len());
    types.into_iter()
}

/// Records scoped to `routine`: parameters anywhere in its extent, other
/// declarations only once declared.
fn routine_scope<'s>(
    skel: &'s FileSkeleton,
    routine: &DefinitionRecord,
    name: &str,
    offset: TextSize,
) -> Vec<&'s DefinitionRecord> {
    let path = routine_path(routine);
    skel.records
        .iter()
        .filter(|r| r.is_named(name))
        .filter(|r| r.owner.as_deref().is_some_and(|o| names_eq(o, &path)))
        .filter(|r| match r.as_variable() {
            Some(v) if v.is_inline => false,
            Some(v) if v.kind == VariableKind::Parameter => true,
            _ => r.range.start() <= offset,
        })
        .collect()
}

/// Owner path of the records declared inside `routine`.
pub(super) fn routine_path(routine: &DefinitionRecord) -> SmolStr {
    match &routine.owner {
        Some(owner) => SmolStr::new(format!("{}.{}", owner, routine.name)),
        None => routine.name.clone(),
    }
}

/// Choose one record from a layer's candidates.
///
/// A bare identifier prefers a variable, a call argument prefers a
/// routine. Among the rest a complete type beats its forward declaration
/// and a declaration beats its implementation.
pub(super) fn pick<'r>(candidates: &[&'r DefinitionRecord], position: NamePosition) -> Option<&'r DefinitionRecord> {
    let mut narrowed: Vec<&DefinitionRecord> =
        candidates.iter().copied().filter(|r| r.kind() != DefKind::Attribute).collect();
    let preferred = match position {
        NamePosition::Bare => DefKind::Variable,
        NamePosition::CallArgument => DefKind::Routine,
    };
    if narrowed.iter().any(|r| r.kind() == preferred) {
        narrowed.retain(|r| r.kind() == preferred);
    }
    if narrowed.iter().any(|r| r.as_type().is_some_and(|t| !t.is_forward)) {
        narrowed.retain(|r| !r.as_type().is_some_and(|t| t.is_forward));
    }
    let first = narrowed.first().copied()?;
    Some(narrowed.iter().copied().find(|r| !r.is_implementation()).unwrap_or(first))
}
