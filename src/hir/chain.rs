//! Member-access chains: `Shape.Bounds.Width`, `Self.FItems`, `SysUtils.Format`.
//!
//! The leftmost segment goes through the scope layers; every further
//! segment is a member of the previous segment's static type or one of its
//! ancestors, subject to member visibility.

use rustc_hash::FxHashSet;
use text_size::TextSize;

use crate::base::{FileId, names_eq};

use super::records::{DefKind, DefinitionRecord, RoutineKind, TypeKind, Visibility};
use super::resolve::{NamePosition, Resolver, enclosing_routines, pick};

/// Upper bound on alias and ancestor hops.
const MAX_TYPE_HOPS: usize = 32;

/// Result of resolving a member chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainResult {
    Resolved(DefinitionRecord),
    /// Some prefix had no determinable type, or a member was not found.
    Unresolved,
}

impl ChainResult {
    pub fn record(&self) -> Option<&DefinitionRecord> {
        match self {
            ChainResult::Resolved(r) => Some(r),
            ChainResult::Unresolved => None,
        }
    }
}

/// Where a member access happens, for visibility checks.
#[derive(Clone, Copy, Debug)]
pub(super) struct AccessContext<'a> {
    file: FileId,
    /// Type whose method (or body) contains the access.
    caller_type: Option<&'a DefinitionRecord>,
}

impl<'a> AccessContext<'a> {
    pub(super) fn new(file: FileId, caller_type: Option<&'a DefinitionRecord>) -> Self {
        Self { file, caller_type }
    }
}

type TypeId = (FileId, TextSize);

fn type_id(record: &DefinitionRecord) -> TypeId {
    (record.file, record.range.start())
}

impl<'a> Resolver<'a> {
    /// Resolve a dotted chain written at `offset` in `file`.
    pub fn resolve_chain<S: AsRef<str>>(&self, segments: &[S], file: FileId, offset: TextSize) -> ChainResult {
        let segments: Vec<&str> = segments.iter().map(|s| s.as_ref().trim()).collect();
        if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return ChainResult::Unresolved;
        }
        let Some(skel) = self.index.skeleton(file) else {
            return ChainResult::Unresolved;
        };
        let context = AccessContext::new(file, self.method_type_at(skel, offset));

        let Some((mut current, rest)) = self.resolve_head(&segments, file, offset, &context) else {
            tracing::trace!("[CHAIN] head of {:?} unresolved in {}", segments, file);
            return ChainResult::Unresolved;
        };

        for segment in rest {
            let Some(ty) = self.static_type(current) else {
                tracing::trace!("[CHAIN] no static type for '{}' before '{}'", current.name, segment);
                return ChainResult::Unresolved;
            };
            let Some(member) = self.find_member(ty, segment, &context, NamePosition::Bare) else {
                tracing::trace!("[CHAIN] '{}' is not a visible member of {}", segment, ty.name);
                return ChainResult::Unresolved;
            };
            current = member;
        }
        ChainResult::Resolved(current.clone())
    }

    /// Resolve the leading segment(s) of a chain. Returns the bound record
    /// and the segments still to walk.
    fn resolve_head<'s>(
        &self,
        segments: &'s [&'s str],
        file: FileId,
        offset: TextSize,
        context: &AccessContext<'a>,
    ) -> Option<(&'a DefinitionRecord, &'s [&'s str])> {
        let (first, rest) = segments.split_first()?;
        let skel = self.index.skeleton(file)?;

        if names_eq(first, "Self") {
            return context.caller_type.map(|ty| (ty, rest));
        }
        if names_eq(first, "Result") {
            let function = enclosing_routines(skel, offset)
                .into_iter()
                .find(|r| r.as_routine().is_some_and(|d| d.return_type.is_some()));
            if let Some(function) = function {
                // the function record stands in for its result: its static
                // type is the return type
                return Some((function, rest));
            }
        }

        let head = if rest.is_empty() {
            self.lookup(first, file, offset)
        } else {
            self.lookup_at(first, file, offset, NamePosition::Bare)
        };
        if let Some(record) = head.unique() {
            return Some((record, rest));
        }

        // a leading unit name, possibly dotted, qualifies the next segment
        for split in (1..segments.len()).rev() {
            let unit = segments[..split].join(".");
            let Some(target) = self.visible_unit_file(file, &unit, offset) else {
                continue;
            };
            let (member, tail) = segments[split..].split_first()?;
            let exports: Vec<&DefinitionRecord> =
                self.unit_exports(target, file).filter(|r| r.is_named(member)).collect();
            return pick(&exports, NamePosition::Bare).map(|r| (r, tail));
        }
        None
    }

    /// Static type of a record, as a type record with members.
    fn static_type(&self, record: &'a DefinitionRecord) -> Option<&'a DefinitionRecord> {
        let declared = match record.kind() {
            DefKind::Type => return self.follow_aliases(record),
            DefKind::Routine if record.as_routine().is_some_and(|r| r.kind == RoutineKind::Constructor) => {
                return self.owner_type(record).and_then(|ty| self.follow_aliases(ty));
            }
            DefKind::Attribute => return None,
            _ => record.value_type_name()?,
        };
        let ty = self.lookup_type(declared, record.file, record.range.start()).unique()?;
        self.follow_aliases(ty)
    }

    /// Follow alias and metaclass targets to a concrete type.
    fn follow_aliases(&self, mut ty: &'a DefinitionRecord) -> Option<&'a DefinitionRecord> {
        let mut seen = FxHashSet::default();
        for _ in 0..MAX_TYPE_HOPS {
            if !seen.insert(type_id(ty)) {
                tracing::trace!("[CHAIN] alias cycle at {}", ty.name);
                return None;
            }
            let def = ty.as_type()?;
            if def.kind != TypeKind::Alias {
                return Some(ty);
            }
            let target = def.alias_target.as_deref()?;
            ty = self.lookup_type(target, ty.file, ty.range.start()).unique()?;
        }
        None
    }

    /// The type record a method or member belongs to.
    fn owner_type(&self, member: &DefinitionRecord) -> Option<&'a DefinitionRecord> {
        let owner = member.owner.as_deref()?;
        self.index
            .records_in_file(member.file)
            .iter()
            .filter(|r| r.kind() == DefKind::Type && names_eq(&r.member_owner_path(), owner))
            .find(|r| r.as_type().is_some_and(|t| !t.is_forward))
    }

    /// The resolved parent type of `ty`.
    fn parent_type(&self, ty: &'a DefinitionRecord) -> Option<&'a DefinitionRecord> {
        let def = ty.as_type()?;
        let parent = def.parent.as_deref().or(def.helper_for.as_deref())?;
        let found = self.lookup_type(parent, ty.file, ty.range.start()).unique()?;
        if type_id(found) == type_id(ty) {
            return None;
        }
        self.follow_aliases(found)
    }

    /// Members of `ty` itself named `name`, implementations excluded.
    pub(super) fn own_members(&self, ty: &'a DefinitionRecord, name: &str) -> Vec<&'a DefinitionRecord> {
        let path = ty.member_owner_path();
        self.index
            .records_in_file(ty.file)
            .iter()
            .filter(|r| r.is_named(name) && !r.is_implementation() && r.kind() != DefKind::Attribute)
            .filter(|r| r.owner.as_deref().is_some_and(|o| names_eq(o, &path)))
            .collect()
    }

    /// First visible member named `name` in `ty` or its ancestors.
    pub(super) fn find_member(
        &self,
        ty: &'a DefinitionRecord,
        name: &str,
        context: &AccessContext<'a>,
        position: NamePosition,
    ) -> Option<&'a DefinitionRecord> {
        let mut seen = FxHashSet::default();
        let mut current = Some(ty);
        while let Some(ty) = current {
            if !seen.insert(type_id(ty)) || seen.len() > MAX_TYPE_HOPS {
                tracing::trace!("[CHAIN] ancestor cycle at {}", ty.name);
                return None;
            }
            let visible: Vec<&DefinitionRecord> = self
                .own_members(ty, name)
                .into_iter()
                .filter(|m| self.is_accessible(m, ty, context))
                .collect();
            if let Some(member) = pick(&visible, position) {
                return Some(member);
            }
            current = self.parent_type(ty);
        }
        None
    }

    fn is_accessible(&self, member: &DefinitionRecord, declaring: &'a DefinitionRecord, context: &AccessContext<'a>) -> bool {
        let same_file = context.file == member.file;
        let caller = context.caller_type;
        let is_declaring = caller.is_some_and(|c| type_id(c) == type_id(declaring));
        match member.visibility {
            Visibility::Public | Visibility::Published => true,
            Visibility::Private => same_file,
            Visibility::StrictPrivate => is_declaring,
            Visibility::Protected => same_file || caller.is_some_and(|c| self.descends_from(c, declaring)),
            Visibility::StrictProtected => caller.is_some_and(|c| self.descends_from(c, declaring)),
        }
    }

    /// Whether `ty` is `base` or inherits from it.
    fn descends_from(&self, ty: &'a DefinitionRecord, base: &DefinitionRecord) -> bool {
        let target = type_id(base);
        let mut seen = FxHashSet::default();
        let mut current = Some(ty);
        while let Some(ty) = current {
            if type_id(ty) == target {
                return true;
            }
            if !seen.insert(type_id(ty)) || seen.len() > MAX_TYPE_HOPS {
                return false;
            }
            current = self.parent_type(ty);
        }
        false
    }
}
