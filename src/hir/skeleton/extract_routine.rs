//! Routine headings, routine bodies and statement blocks.
//!
//! Statements are not parsed. A body is walked as a flat token run with a
//! block stack (`begin` / `try` / `case` / `asm` ... `end`) so that inline
//! variables get the range of their enclosing block, and every
//! parenthesized list that follows an identifier is recorded as a
//! call-argument range.

use smol_str::SmolStr;
use text_size::TextRange;

use crate::base::names_eq;
use crate::hir::records::{
    DefinitionData, DefinitionRecord, RoutineDef, RoutineKind, Section, VariableDef, VariableKind,
    Visibility,
};
use crate::parser::keywords::{ROUTINE_DIRECTIVES, is_one_of};
use crate::parser::SyntaxKind;

use super::context::{ExtractionContext, child_path};
use super::extract_type::parse_type_section;
use super::extract_vars::{VarScope, parse_const_section, parse_var_section};
use super::helpers::{parse_attributes, parse_generic_params, parse_params, read_dotted, read_type};

/// Where a routine heading appears.
pub(super) enum RoutineSite<'s> {
    /// Unit level, or nested inside the routine whose scope path is given.
    /// May carry a body.
    Block { outer: Option<&'s SmolStr> },
    /// Inside a type body; a heading only.
    Member {
        owner: &'s SmolStr,
        visibility: Visibility,
    },
}

fn routine_kind(ctx: &ExtractionContext<'_, '_>) -> Option<RoutineKind> {
    let tok = ctx.cursor.peek()?;
    Some(match tok.kind {
        SyntaxKind::PROCEDURE_KW => RoutineKind::Procedure,
        SyntaxKind::FUNCTION_KW => RoutineKind::Function,
        SyntaxKind::CONSTRUCTOR_KW => RoutineKind::Constructor,
        SyntaxKind::DESTRUCTOR_KW => RoutineKind::Destructor,
        SyntaxKind::IDENT if tok.is_word("operator") => RoutineKind::Operator,
        _ => return None,
    })
}

/// Whether the cursor is at a routine heading (optionally `class`-prefixed).
pub(super) fn at_routine(ctx: &ExtractionContext<'_, '_>) -> bool {
    let kind = ctx.cursor.peek_kind();
    if kind.is_routine_kw() {
        return true;
    }
    kind == SyntaxKind::CLASS_KW
        && (ctx.cursor.nth_kind(1).is_routine_kw() || ctx.cursor.nth_is_word(1, "operator"))
}

/// Parse a routine heading and, where the site allows it, its body.
pub(super) fn parse_routine(ctx: &mut ExtractionContext<'_, '_>, site: &RoutineSite<'_>) {
    let start = ctx.cursor.pos();
    let is_class_method = ctx.cursor.eat(SyntaxKind::CLASS_KW);
    let Some(kind) = routine_kind(ctx) else {
        ctx.recover("routine heading");
        return;
    };
    ctx.cursor.bump();

    let Some((segments, name_idx)) = read_dotted(ctx) else {
        // anonymous or malformed heading
        ctx.cursor.set_pos(start);
        ctx.recover("routine heading");
        return;
    };
    let Some(name_tok) = ctx.token(name_idx) else { return };
    let generics = if ctx.cursor.tokens().get(name_idx + 1).is_some_and(|t| t.kind == SyntaxKind::LT) {
        let resume = ctx.cursor.pos();
        ctx.cursor.set_pos(name_idx + 1);
        let generics = parse_generic_params(ctx);
        ctx.cursor.set_pos(resume);
        generics
    } else {
        Vec::new()
    };

    let params = if ctx.cursor.at(SyntaxKind::L_PAREN) {
        parse_params(ctx)
    } else {
        Vec::new()
    };
    let return_type = if ctx.cursor.eat(SyntaxKind::COLON) {
        read_type(ctx, |_| false)
    } else {
        None
    };
    // method resolution clause `procedure IFoo.Bar = Baz;` or the terminator
    ctx.cursor.skip_past_semicolon();

    let mut is_forward = false;
    let mut is_external = false;
    while let Some(tok) = ctx.cursor.peek() {
        let directive = (tok.kind == SyntaxKind::IDENT && is_one_of(tok.text, ROUTINE_DIRECTIVES))
            || tok.kind == SyntaxKind::INLINE_KW;
        // a field that happens to be named like a directive
        let directive = directive && !matches!(ctx.cursor.nth_kind(1), SyntaxKind::COLON | SyntaxKind::COMMA);
        if !directive {
            break;
        }
        is_forward |= tok.is_word("forward");
        is_external |= tok.is_word("external");
        ctx.cursor.skip_past_semicolon();
    }

    let header_owner = (segments.len() > 1).then(|| SmolStr::new(segments[..segments.len() - 1].join(".")));
    let (owner, visibility, may_have_body) = match site {
        RoutineSite::Member { owner, visibility } => (Some((*owner).clone()), *visibility, false),
        RoutineSite::Block { outer } => {
            let owner = header_owner.or_else(|| outer.cloned());
            (owner, Visibility::Public, ctx.section != Section::Interface)
        }
    };
    let has_body = may_have_body && !is_forward && !is_external;

    let def = RoutineDef {
        kind,
        is_implementation: has_body,
        is_class_method,
        generics,
        return_type,
        params,
        is_forward,
        is_external,
    };
    let heading_extent = ctx.extent_from(start);
    let path = child_path(owner.as_deref(), name_tok.ident_text());
    let params = def.params.clone();
    let idx = ctx.push(name_tok, heading_extent, visibility, owner, DefinitionData::Routine(def));
    if !has_body {
        return;
    }

    let first_local = ctx.records.len();
    for param in &params {
        ctx.records.push(DefinitionRecord {
            name: param.name.clone(),
            file: ctx.file,
            unit: ctx.unit.clone(),
            range: param.range,
            extent: param.range,
            section: ctx.section,
            visibility: Visibility::Public,
            owner: Some(path.clone()),
            data: DefinitionData::Variable(VariableDef {
                type_name: param.type_name.clone(),
                kind: VariableKind::Parameter,
                scope_range: None,
                is_class_var: false,
                is_inline: false,
            }),
        });
    }

    parse_local_declarations(ctx, &path);
    match ctx.cursor.peek_kind() {
        SyntaxKind::BEGIN_KW | SyntaxKind::ASM_KW => {
            parse_block(ctx, Some(&path));
            ctx.cursor.eat(SyntaxKind::SEMICOLON);
        }
        _ => ctx.skip_from(start, "routine body"),
    }

    let extent = ctx.extent_from(start);
    ctx.records[idx].extent = extent;
    for record in &mut ctx.records[first_local..] {
        let Some(owner) = record.owner.as_deref() else { continue };
        if !names_eq(owner, &path) {
            continue;
        }
        if let DefinitionData::Variable(v) = &mut record.data {
            if v.scope_range.is_none() {
                v.scope_range = Some(extent);
            }
        }
    }
}

/// Local `type` / `const` / `var` sections and nested routines.
fn parse_local_declarations(ctx: &mut ExtractionContext<'_, '_>, path: &SmolStr) {
    loop {
        match ctx.cursor.peek_kind() {
            SyntaxKind::TYPE_KW => {
                ctx.cursor.bump();
                parse_type_section(ctx, Some(path), Visibility::Public);
            }
            SyntaxKind::CONST_KW | SyntaxKind::RESOURCESTRING_KW => {
                let resource = ctx.cursor.at(SyntaxKind::RESOURCESTRING_KW);
                ctx.cursor.bump();
                parse_const_section(ctx, Some(path), Visibility::Public, resource);
            }
            SyntaxKind::VAR_KW | SyntaxKind::THREADVAR_KW => {
                ctx.cursor.bump();
                let scope = VarScope {
                    owner: Some(path),
                    visibility: Visibility::Public,
                    kind: VariableKind::Local,
                    is_class_var: false,
                };
                parse_var_section(ctx, &scope);
            }
            SyntaxKind::LABEL_KW => ctx.cursor.skip_past_semicolon(),
            SyntaxKind::L_BRACKET => parse_attributes(ctx),
            _ if at_routine(ctx) => parse_routine(ctx, &RoutineSite::Block { outer: Some(path) }),
            _ => break,
        }
    }
}

struct Frame {
    /// Records declared inline in this block; their scope ends with it.
    inline: Vec<usize>,
}

/// Walk a statement block starting at its opener (`begin`, `asm`,
/// `initialization`) up to and including the matching `end`.
pub(super) fn parse_block(ctx: &mut ExtractionContext<'_, '_>, routine: Option<&SmolStr>) {
    let block_start = ctx.cursor.pos();
    if ctx.cursor.bump().is_none() {
        return;
    }
    let mut stack = vec![Frame { inline: Vec::new() }];
    while let Some(tok) = ctx.cursor.peek() {
        match tok.kind {
            k if k.opens_block() => {
                stack.push(Frame { inline: Vec::new() });
                ctx.cursor.bump();
            }
            SyntaxKind::END_KW => {
                ctx.cursor.bump();
                let Some(frame) = stack.pop() else { break };
                let end = ctx.cursor.prev_end();
                for idx in frame.inline {
                    let record = &mut ctx.records[idx];
                    let from = record.extent.start();
                    if let DefinitionData::Variable(v) = &mut record.data {
                        v.scope_range = Some(TextRange::new(from, end.max(from)));
                    }
                }
                if stack.is_empty() {
                    return;
                }
            }
            SyntaxKind::VAR_KW | SyntaxKind::CONST_KW => {
                let found = parse_inline_decl(ctx, routine);
                if let Some(frame) = stack.last_mut() {
                    frame.inline.extend(found);
                }
            }
            SyntaxKind::FOR_KW if ctx.cursor.nth_kind(1) == SyntaxKind::VAR_KW => {
                ctx.cursor.bump();
                let found = parse_inline_decl(ctx, routine);
                if let Some(frame) = stack.last_mut() {
                    frame.inline.extend(found);
                }
            }
            SyntaxKind::IDENT if ctx.cursor.nth_kind(1) == SyntaxKind::L_PAREN => {
                let open = ctx.cursor.pos() + 1;
                if let Some(close) = ctx.cursor.matching_close(open) {
                    if let (Some(o), Some(c)) = (ctx.token(open), ctx.token(close)) {
                        ctx.call_arg_ranges.push(TextRange::new(o.offset, c.end()));
                    }
                }
                ctx.cursor.bump();
            }
            _ => {
                ctx.cursor.bump();
            }
        }
    }
    // ran out of tokens with blocks still open
    let end = ctx.cursor.prev_end();
    for frame in stack {
        for idx in frame.inline {
            let record = &mut ctx.records[idx];
            let from = record.extent.start();
            if let DefinitionData::Variable(v) = &mut record.data {
                v.scope_range = Some(TextRange::new(from, end.max(from)));
            }
        }
    }
    ctx.skip_from(block_start, "unterminated block");
}

/// `var A, B: T`, `var X := Init`, `const C = 1`, or the `var I` of a
/// `for var I := ...`. The initializer is left for the block walker.
fn parse_inline_decl(ctx: &mut ExtractionContext<'_, '_>, routine: Option<&SmolStr>) -> Vec<usize> {
    let start = ctx.cursor.pos();
    let is_const = ctx.cursor.at(SyntaxKind::CONST_KW);
    let is_loop = start > 0 && ctx.token(start - 1).is_some_and(|t| t.kind == SyntaxKind::FOR_KW);
    ctx.cursor.bump();
    let mut names = Vec::new();
    while let Some(tok) = ctx.cursor.peek() {
        match tok.kind {
            SyntaxKind::IDENT => names.push(tok),
            SyntaxKind::COMMA => {}
            _ => break,
        }
        ctx.cursor.bump();
    }
    if names.is_empty() {
        return Vec::new();
    }
    let mut type_name = if ctx.cursor.eat(SyntaxKind::COLON) {
        read_type(ctx, |t| {
            matches!(t.kind, SyntaxKind::ASSIGN | SyntaxKind::EQ | SyntaxKind::IN_KW | SyntaxKind::END_KW)
        })
    } else {
        None
    };
    // `var L := TList.Create;` infers the constructed type
    if type_name.is_none() && ctx.cursor.at(SyntaxKind::ASSIGN) {
        let ctor = ctx.cursor.nth(1).filter(|t| t.kind == SyntaxKind::IDENT);
        if let Some(ctor) = ctor {
            if ctx.cursor.nth_kind(2) == SyntaxKind::DOT && ctx.cursor.nth_is_word(3, "Create") {
                type_name = Some(SmolStr::new(ctor.ident_text()));
            }
        }
    }
    let kind = if is_const {
        VariableKind::Constant
    } else if is_loop {
        VariableKind::LoopVar
    } else {
        VariableKind::Local
    };
    let extent = ctx.extent_from(start);
    names
        .into_iter()
        .map(|name| {
            ctx.push(
                name,
                extent,
                Visibility::Public,
                routine.cloned(),
                DefinitionData::Variable(VariableDef {
                    type_name: type_name.clone(),
                    kind,
                    scope_range: Some(extent),
                    is_class_var: false,
                    is_inline: true,
                }),
            )
        })
        .collect()
}
