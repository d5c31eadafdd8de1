//! Definition records — serializable summaries of declarations.
//!
//! A record holds the semantic facts of one declaration and nothing else:
//! no syntax nodes, no token references. Records are produced per file by
//! the skeleton extractor and stored in the [`DefinitionIndex`].
//!
//! [`DefinitionIndex`]: super::DefinitionIndex

use std::fmt;

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::base::{FileId, fold_name, names_eq};

/// Version of the record layout. Bumped whenever a persisted snapshot
/// written by an older build would no longer deserialize into the same
/// meaning.
pub const SCHEMA_VERSION: u32 = 1;

// ============================================================================
// DISCRIMINANTS
// ============================================================================

/// Discriminant of [`DefinitionData`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum DefKind {
    Type,
    Routine,
    Property,
    Variable,
    Attribute,
}

impl DefKind {
    /// Lower-case tag used in composite keys.
    pub fn as_str(self) -> &'static str {
        match self {
            DefKind::Type => "type",
            DefKind::Routine => "routine",
            DefKind::Property => "property",
            DefKind::Variable => "variable",
            DefKind::Attribute => "attribute",
        }
    }
}

impl fmt::Display for DefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Section of a unit a declaration lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum Section {
    /// Exported part of a unit.
    Interface,
    /// Private part of a unit.
    Implementation,
    /// Program, library or package file without an interface split.
    Program,
}

/// Class-member visibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum Visibility {
    /// Visible to the declaring file only.
    Private,
    /// Visible inside the declaring type only.
    StrictPrivate,
    /// Visible to the declaring file and descendants.
    Protected,
    /// Visible to the declaring type and descendants.
    StrictProtected,
    #[default]
    Public,
    Published,
}

// ============================================================================
// PAYLOADS
// ============================================================================

/// Kind of a type declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeKind {
    Class,
    Record,
    Interface,
    Procedural,
    Enum,
    Alias,
}

impl TypeKind {
    /// Types that own members and may be the target of member access.
    pub fn has_members(self) -> bool {
        matches!(self, TypeKind::Class | TypeKind::Record | TypeKind::Interface)
    }
}

/// One generic type parameter, e.g. `T: class, constructor`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct GenericParam {
    pub name: SmolStr,
    pub constraints: Vec<SmolStr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeDef {
    pub kind: TypeKind,
    pub generics: Vec<GenericParam>,
    /// First name in the heritage list of a class or interface, as written.
    pub parent: Option<SmolStr>,
    /// Remaining heritage names (implemented interfaces).
    pub interfaces: Vec<SmolStr>,
    pub guid: Option<SmolStr>,
    /// Names of attributes attached to the declaration.
    pub attributes: Vec<SmolStr>,
    /// `TFoo = class;` style forward declaration.
    pub is_forward: bool,
    /// Right-hand type name of an alias or metaclass (`class of X`).
    pub alias_target: Option<SmolStr>,
    /// Extended type of a `class helper for X` / `record helper for X`.
    pub helper_for: Option<SmolStr>,
}

impl TypeDef {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            generics: Vec::new(),
            parent: None,
            interfaces: Vec::new(),
            guid: None,
            attributes: Vec::new(),
            is_forward: false,
            alias_target: None,
            helper_for: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum RoutineKind {
    Procedure,
    Function,
    Constructor,
    Destructor,
    Operator,
}

/// Parameter passing modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamModifier {
    #[default]
    Value,
    Var,
    Const,
    Out,
    In,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    pub name: SmolStr,
    /// Range of the parameter name in the declaring heading.
    pub range: TextRange,
    /// `None` for untyped `var`/`const` parameters.
    pub type_name: Option<SmolStr>,
    pub modifier: ParamModifier,
    pub has_default: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct RoutineDef {
    pub kind: RoutineKind,
    /// True for a routine with a body (implementation section, program, or
    /// nested routine); false for a heading in an interface or type body.
    pub is_implementation: bool,
    pub is_class_method: bool,
    /// Method type parameters, `function Map<U>(...)`.
    pub generics: Vec<GenericParam>,
    pub return_type: Option<SmolStr>,
    pub params: Vec<Param>,
    pub is_forward: bool,
    pub is_external: bool,
}

impl RoutineDef {
    /// Positional signature used to pair implementations with declarations.
    pub fn signature(&self) -> Vec<(ParamModifier, Option<SmolStr>)> {
        self.params
            .iter()
            .map(|p| (p.modifier, p.type_name.as_deref().map(fold_name)))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyDef {
    /// `None` when a property is re-declared only to change its visibility.
    pub type_name: Option<SmolStr>,
    pub read: Option<SmolStr>,
    pub write: Option<SmolStr>,
    /// Array-property index parameters.
    pub index_params: Vec<Param>,
    pub is_default: bool,
    pub is_class_property: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum VariableKind {
    Global,
    Local,
    Parameter,
    Field,
    Constant,
    ThreadVar,
    LoopVar,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableDef {
    /// Declared type, as written. `None` for inferred inline variables and
    /// untyped constants.
    pub type_name: Option<SmolStr>,
    pub kind: VariableKind,
    /// Region in which a parameter, local or loop variable is in scope.
    pub scope_range: Option<TextRange>,
    pub is_class_var: bool,
    /// Declared inside a statement block (`var X := ...`, `for var I`).
    pub is_inline: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeTarget {
    Type,
    Routine,
    Property,
    Field,
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeDef {
    /// Text between the argument parentheses, verbatim.
    pub raw_args: Option<SmolStr>,
    /// Name of the element the attribute is attached to.
    pub target: Option<SmolStr>,
    pub target_kind: AttributeTarget,
}

/// Kind-specific payload of a record.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum DefinitionData {
    Type(TypeDef),
    Routine(RoutineDef),
    Property(PropertyDef),
    Variable(VariableDef),
    Attribute(AttributeDef),
}

// ============================================================================
// RECORD
// ============================================================================

/// A declaration summary.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct DefinitionRecord {
    pub name: SmolStr,
    pub file: FileId,
    /// Unit the declaring file belongs to.
    pub unit: SmolStr,
    /// Range of the declared name.
    pub range: TextRange,
    /// Range of the whole declaration (a routine's body included).
    pub extent: TextRange,
    pub section: Section,
    pub visibility: Visibility,
    /// Owner scope: the enclosing type for members and nested types
    /// (dotted for nested owners), the routine for parameters and locals.
    pub owner: Option<SmolStr>,
    pub data: DefinitionData,
}

impl DefinitionRecord {
    pub fn kind(&self) -> DefKind {
        match self.data {
            DefinitionData::Type(_) => DefKind::Type,
            DefinitionData::Routine(_) => DefKind::Routine,
            DefinitionData::Property(_) => DefKind::Property,
            DefinitionData::Variable(_) => DefKind::Variable,
            DefinitionData::Attribute(_) => DefKind::Attribute,
        }
    }

    pub fn as_type(&self) -> Option<&TypeDef> {
        match &self.data {
            DefinitionData::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_routine(&self) -> Option<&RoutineDef> {
        match &self.data {
            DefinitionData::Routine(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyDef> {
        match &self.data {
            DefinitionData::Property(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&VariableDef> {
        match &self.data {
            DefinitionData::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_attribute(&self) -> Option<&AttributeDef> {
        match &self.data {
            DefinitionData::Attribute(a) => Some(a),
            _ => None,
        }
    }

    /// Composite index key of this record.
    pub fn scoped_key(&self) -> ScopedKey {
        ScopedKey::new(&self.unit, self.owner.as_deref(), &self.name, self.kind())
    }

    /// Whether this record is a unit-level declaration: no owner scope,
    /// not an inline variable of a main block, not an attribute.
    pub fn is_top_level(&self) -> bool {
        if self.owner.is_some() {
            return false;
        }
        match &self.data {
            DefinitionData::Variable(v) => v.scope_range.is_none(),
            DefinitionData::Attribute(_) => false,
            _ => true,
        }
    }

    /// Whether this is a routine with a body.
    pub fn is_implementation(&self) -> bool {
        self.as_routine().is_some_and(|r| r.is_implementation)
    }

    /// Dotted path that members of this type record use as their owner:
    /// `TInner` nested in `TOuter` → `TOuter.TInner`.
    pub fn member_owner_path(&self) -> SmolStr {
        match &self.owner {
            Some(owner) if self.kind() == DefKind::Type => {
                SmolStr::new(format!("{}.{}", owner, self.name))
            }
            _ => self.name.clone(),
        }
    }

    /// Whether `offset` falls inside this declaration.
    pub fn contains(&self, offset: TextSize) -> bool {
        self.extent.contains_inclusive(offset)
    }

    /// Declared (static) type name of a value-like record.
    pub fn value_type_name(&self) -> Option<&SmolStr> {
        match &self.data {
            DefinitionData::Variable(v) => v.type_name.as_ref(),
            DefinitionData::Routine(r) => r.return_type.as_ref(),
            DefinitionData::Property(p) => p.type_name.as_ref(),
            _ => None,
        }
    }

    /// Whether the record's name matches, ignoring case.
    pub fn is_named(&self, name: &str) -> bool {
        names_eq(&self.name, name)
    }
}

// ============================================================================
// COMPOSITE KEY
// ============================================================================

/// Lower-cased `unit|owner|name|kind` key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopedKey(SmolStr);

impl ScopedKey {
    pub fn new(unit: &str, owner: Option<&str>, name: &str, kind: DefKind) -> Self {
        let owner = owner.unwrap_or("");
        let raw = format!("{}|{}|{}|{}", unit, owner, name, kind.as_str());
        Self(fold_name(&raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// PER-FILE SKELETON
// ============================================================================

/// A recovered parse failure: the tokens in `range` were skipped.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseSkip {
    pub range: TextRange,
    /// What was being parsed, e.g. `type body`.
    pub context: SmolStr,
}
