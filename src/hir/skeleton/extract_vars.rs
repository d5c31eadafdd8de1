//! Variable, field and constant sections.

use smol_str::SmolStr;

use crate::hir::records::{DefinitionData, VariableDef, VariableKind, Visibility};
use crate::parser::{SyntaxKind, Token};

use super::context::ExtractionContext;
use super::helpers::{parse_attributes, read_type};

/// Where a `var`-style section lives and what its entries are.
pub(super) struct VarScope<'s> {
    pub owner: Option<&'s SmolStr>,
    pub visibility: Visibility,
    pub kind: VariableKind,
    pub is_class_var: bool,
}

fn starts_var_decl(ctx: &ExtractionContext<'_, '_>) -> bool {
    ctx.cursor.at(SyntaxKind::IDENT)
        && matches!(ctx.cursor.nth_kind(1), SyntaxKind::COMMA | SyntaxKind::COLON)
}

fn at_attribute(ctx: &ExtractionContext<'_, '_>) -> bool {
    ctx.cursor.at(SyntaxKind::L_BRACKET) && ctx.cursor.nth_kind(1) != SyntaxKind::STRING
}

/// Parse `var` / `threadvar` / field entries after the section keyword,
/// until a token that cannot start an entry.
pub(super) fn parse_var_section(ctx: &mut ExtractionContext<'_, '_>, scope: &VarScope<'_>) {
    loop {
        if at_attribute(ctx) {
            parse_attributes(ctx);
            continue;
        }
        if !starts_var_decl(ctx) {
            break;
        }
        parse_var_decl(ctx, scope);
    }
}

/// `A, B: TType = Init;` / `X: Integer absolute Y;`
pub(super) fn parse_var_decl(ctx: &mut ExtractionContext<'_, '_>, scope: &VarScope<'_>) {
    let start = ctx.cursor.pos();
    let mut names: Vec<&Token<'_>> = Vec::new();
    while let Some(tok) = ctx.cursor.peek() {
        match tok.kind {
            SyntaxKind::IDENT => names.push(tok),
            SyntaxKind::COMMA => {}
            _ => break,
        }
        ctx.cursor.bump();
    }
    if !ctx.cursor.eat(SyntaxKind::COLON) {
        ctx.cursor.set_pos(start);
        ctx.recover("variable declaration");
        return;
    }
    let type_name = read_type(ctx, |t| t.kind == SyntaxKind::EQ || t.is_word("absolute"));
    ctx.cursor.skip_past_semicolon();
    let extent = ctx.extent_from(start);
    for name in names {
        ctx.push(
            name,
            extent,
            scope.visibility,
            scope.owner.cloned(),
            DefinitionData::Variable(VariableDef {
                type_name: type_name.clone(),
                kind: scope.kind,
                scope_range: None,
                is_class_var: scope.is_class_var,
                is_inline: false,
            }),
        );
    }
}

/// Parse `const` / `resourcestring` entries after the section keyword.
pub(super) fn parse_const_section(
    ctx: &mut ExtractionContext<'_, '_>,
    owner: Option<&SmolStr>,
    visibility: Visibility,
    resource: bool,
) {
    loop {
        if at_attribute(ctx) {
            parse_attributes(ctx);
            continue;
        }
        if !(ctx.cursor.at(SyntaxKind::IDENT)
            && matches!(ctx.cursor.nth_kind(1), SyntaxKind::EQ | SyntaxKind::COLON))
        {
            break;
        }
        let start = ctx.cursor.pos();
        let Some(name) = ctx.cursor.bump() else { break };
        let declared = if ctx.cursor.eat(SyntaxKind::COLON) {
            read_type(ctx, |t| t.kind == SyntaxKind::EQ)
        } else {
            None
        };
        if !ctx.cursor.at_eq() {
            ctx.cursor.set_pos(start);
            ctx.recover("constant declaration");
            continue;
        }
        ctx.cursor.skip_past_semicolon();
        let type_name = declared.or_else(|| resource.then_some(SmolStr::new_static("string")));
        let extent = ctx.extent_from(start);
        ctx.push(
            name,
            extent,
            visibility,
            owner.cloned(),
            DefinitionData::Variable(VariableDef {
                type_name,
                kind: VariableKind::Constant,
                scope_range: None,
                is_class_var: false,
                is_inline: false,
            }),
        );
    }
}
