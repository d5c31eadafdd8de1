//! Skeleton extraction — declaration records from a token stream.
//!
//! Extraction is a single forward scan over the significant tokens of one
//! file. Only declarations are recognized; statement bodies are walked as
//! flat token runs. Unparseable runs are skipped up to the next statement
//! boundary and recorded as [`ParseSkip`]s, so a broken declaration never
//! costs the rest of the file.
//!
//! # Module structure
//!
//! - [`context`] — ExtractionContext: cursor, output buffers, attributes
//! - [`helpers`] — type text, generic and parameter lists, body-end search
//! - [`extract_type`] — type sections and structured type bodies
//! - [`extract_routine`] — routine headings, bodies, statement blocks
//! - [`extract_vars`] — var, field and const sections

mod context;
mod extract_routine;
mod extract_type;
mod extract_vars;
mod helpers;


use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::base::{FileId, names_eq};
use crate::parser::{SyntaxKind, significant_tokens};

use super::records::{
    DefinitionData, DefinitionRecord, ParseSkip, RoutineDef, Section, VariableDef, VariableKind,
    Visibility,
};
use super::uses::{HeaderKind, UsesInfo, parse_uses};

use context::{ExtractionContext, child_path};
use extract_routine::{RoutineSite, at_routine, parse_block, parse_routine};
use extract_type::parse_type_section;
use extract_vars::{VarScope, parse_const_section, parse_var_section};
use helpers::parse_attributes;

/// Everything extracted from one file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct FileSkeleton {
    /// Declared unit name, or the file stem.
    pub unit: SmolStr,
    pub file_kind: HeaderKind,
    pub records: Vec<DefinitionRecord>,
    pub uses: UsesInfo,
    /// Parenthesized argument lists following an identifier in statements.
    pub call_arg_ranges: Vec<TextRange>,
    pub skipped: Vec<ParseSkip>,
}

impl FileSkeleton {
    /// Whether `offset` is inside a recorded call-argument list.
    pub fn in_call_args(&self, offset: TextSize) -> bool {
        self.call_arg_ranges
            .iter()
            .any(|r| r.start() < offset && offset < r.end())
    }
}

/// Extract the skeleton of one file. `fallback_unit` names the unit when
/// the file has no header (normally the file stem).
pub fn extract(file: FileId, text: &str, fallback_unit: &str) -> FileSkeleton {
    let tokens = significant_tokens(text);
    let uses = parse_uses(&tokens, TextSize::of(text));
    let unit = uses
        .unit_name
        .clone()
        .unwrap_or_else(|| SmolStr::new(fallback_unit));
    let section = if uses.header.has_sections() {
        Section::Interface
    } else {
        Section::Program
    };

    let mut ctx = ExtractionContext::new(file, unit.clone(), text, &tokens, section);
    extract_file(&mut ctx);
    let mut records = ctx.records;
    pair_implementations(&mut records);

    tracing::trace!(
        "[EXTRACT] {} ({}): {} records, {} skipped",
        unit,
        file,
        records.len(),
        ctx.skipped.len()
    );

    FileSkeleton {
        unit,
        file_kind: uses.header,
        records,
        uses,
        call_arg_ranges: ctx.call_arg_ranges,
        skipped: ctx.skipped,
    }
}

fn extract_file(ctx: &mut ExtractionContext<'_, '_>) {
    let header = matches!(
        ctx.cursor.peek_kind(),
        SyntaxKind::UNIT_KW | SyntaxKind::PROGRAM_KW | SyntaxKind::LIBRARY_KW
    ) || ctx.cursor.at_word("package");
    if header {
        ctx.cursor.skip_past_semicolon();
    }

    while let Some(tok) = ctx.cursor.peek() {
        match tok.kind {
            SyntaxKind::INTERFACE_KW => {
                ctx.section = Section::Interface;
                ctx.cursor.bump();
            }
            SyntaxKind::IMPLEMENTATION_KW => {
                ctx.section = Section::Implementation;
                ctx.cursor.bump();
            }
            SyntaxKind::USES_KW | SyntaxKind::EXPORTS_KW | SyntaxKind::LABEL_KW => {
                ctx.cursor.skip_past_semicolon();
            }
            SyntaxKind::IDENT if tok.is_word("requires") || tok.is_word("contains") => {
                ctx.cursor.skip_past_semicolon();
            }
            SyntaxKind::TYPE_KW => {
                ctx.cursor.bump();
                parse_type_section(ctx, None, Visibility::Public);
            }
            SyntaxKind::CONST_KW | SyntaxKind::RESOURCESTRING_KW => {
                ctx.cursor.bump();
                let resource = tok.kind == SyntaxKind::RESOURCESTRING_KW;
                parse_const_section(ctx, None, Visibility::Public, resource);
            }
            SyntaxKind::VAR_KW | SyntaxKind::THREADVAR_KW => {
                ctx.cursor.bump();
                let kind = if tok.kind == SyntaxKind::THREADVAR_KW {
                    VariableKind::ThreadVar
                } else {
                    VariableKind::Global
                };
                let scope = VarScope {
                    owner: None,
                    visibility: Visibility::Public,
                    kind,
                    is_class_var: false,
                };
                parse_var_section(ctx, &scope);
            }
            SyntaxKind::L_BRACKET => parse_attributes(ctx),
            _ if at_routine(ctx) => parse_routine(ctx, &RoutineSite::Block { outer: None }),
            SyntaxKind::BEGIN_KW
            | SyntaxKind::ASM_KW
            | SyntaxKind::INITIALIZATION_KW
            | SyntaxKind::FINALIZATION_KW => parse_block(ctx, None),
            SyntaxKind::END_KW | SyntaxKind::DOT | SyntaxKind::SEMICOLON => {
                ctx.cursor.bump();
            }
            _ => ctx.recover("declaration"),
        }
    }
    ctx.discard_attributes();
}

/// The declaration an implementation routine belongs to: same name, same
/// owner, and the same positional signature. An implementation that omits
/// its parameter list matches the single same-named declaration.
pub fn declaration_of<'r>(
    candidates: impl IntoIterator<Item = &'r DefinitionRecord>,
    implementation: &DefinitionRecord,
) -> Option<&'r DefinitionRecord> {
    let imp = implementation.as_routine()?;
    if !imp.is_implementation {
        return None;
    }
    let same_owner = |a: Option<&str>, b: Option<&str>| match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => names_eq(a, b),
        _ => false,
    };
    let decls: Vec<&DefinitionRecord> = candidates
        .into_iter()
        .filter(|r| r.file == implementation.file && r.is_named(&implementation.name))
        .filter(|r| same_owner(r.owner.as_deref(), implementation.owner.as_deref()))
        .filter(|r| r.as_routine().is_some_and(|d| !d.is_implementation))
        .collect();
    let signature = imp.signature();
    let exact = decls
        .iter()
        .copied()
        .find(|r| r.as_routine().is_some_and(|d| d.signature() == signature));
    if exact.is_some() {
        return exact;
    }
    if imp.params.is_empty() && decls.len() == 1 {
        return decls.first().copied();
    }
    None
}

/// Give implementations that omit their parameter list the parameters (and
/// return type) of their declaration, so the body sees them in scope.
fn pair_implementations(records: &mut Vec<DefinitionRecord>) {
    let mut inherit: Vec<(usize, RoutineDef)> = Vec::new();
    for (idx, record) in records.iter().enumerate() {
        let Some(imp) = record.as_routine() else { continue };
        if !imp.is_implementation || !imp.params.is_empty() {
            continue;
        }
        let Some(decl) = declaration_of(records.iter(), record) else {
            continue;
        };
        if let Some(def) = decl.as_routine() {
            if !def.params.is_empty() || (imp.return_type.is_none() && def.return_type.is_some()) {
                inherit.push((idx, def.clone()));
            }
        }
    }
    for (idx, decl) in inherit {
        let record = &mut records[idx];
        let path = child_path(record.owner.as_deref(), &record.name);
        let extent = record.extent;
        let (file, unit, section) = (record.file, record.unit.clone(), record.section);
        if let DefinitionData::Routine(imp) = &mut record.data {
            imp.params = decl.params.clone();
            if imp.return_type.is_none() {
                imp.return_type = decl.return_type.clone();
            }
        }
        records.extend(decl.params.into_iter().map(|param| DefinitionRecord {
            name: param.name,
            file,
            unit: unit.clone(),
            range: param.range,
            extent: param.range,
            section,
            visibility: Visibility::Public,
            owner: Some(path.clone()),
            data: DefinitionData::Variable(VariableDef {
                type_name: param.type_name,
                kind: VariableKind::Parameter,
                scope_range: Some(extent),
                is_class_var: false,
                is_inline: false,
            }),
        }));
    }
}
