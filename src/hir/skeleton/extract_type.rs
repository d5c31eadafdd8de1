//! Type sections — class, record and interface bodies, enums, procedural
//! types and aliases.

use smol_str::SmolStr;
use text_size::TextRange;

use crate::hir::records::{
    DefinitionData, GenericParam, PropertyDef, TypeDef, TypeKind, VariableDef, VariableKind, Visibility,
};
use crate::parser::keywords::{PROPERTY_SPECIFIERS, TYPE_DIRECTIVES, VISIBILITY_WORDS, is_one_of};
use crate::parser::{SyntaxKind, Token};

use super::context::{ExtractionContext, child_path};
use super::extract_routine::{RoutineSite, parse_routine};
use super::extract_vars::{VarScope, parse_const_section, parse_var_decl, parse_var_section};
use super::helpers::{
    find_body_end, is_plain_type_name, join_tokens, parse_attributes, parse_generic_params, parse_guid,
    parse_heritage, parse_params, read_specifier, read_type,
};

fn starts_type_decl(ctx: &ExtractionContext<'_, '_>) -> bool {
    ctx.cursor.at(SyntaxKind::IDENT)
        && matches!(ctx.cursor.nth_kind(1), SyntaxKind::EQ | SyntaxKind::LT)
}

/// Parse entries of a `type` section after the keyword.
pub(super) fn parse_type_section(ctx: &mut ExtractionContext<'_, '_>, owner: Option<&SmolStr>, visibility: Visibility) {
    loop {
        if ctx.cursor.at(SyntaxKind::L_BRACKET) {
            parse_attributes(ctx);
            continue;
        }
        if !starts_type_decl(ctx) {
            break;
        }
        parse_type_decl(ctx, owner, visibility);
    }
}

fn parse_type_decl(ctx: &mut ExtractionContext<'_, '_>, owner: Option<&SmolStr>, visibility: Visibility) {
    let start = ctx.cursor.pos();
    let Some(name) = ctx.cursor.bump() else { return };
    let generics = if ctx.cursor.at(SyntaxKind::LT) {
        parse_generic_params(ctx)
    } else {
        Vec::new()
    };
    if !ctx.cursor.eat_eq() {
        ctx.cursor.set_pos(start);
        ctx.recover("type declaration");
        return;
    }
    // `TFoo = type Integer;` and `packed record`
    ctx.cursor.eat(SyntaxKind::TYPE_KW);
    ctx.cursor.eat(SyntaxKind::PACKED_KW);

    let decl = TypeDecl {
        start,
        name,
        owner,
        visibility,
    };
    match ctx.cursor.peek_kind() {
        SyntaxKind::CLASS_KW | SyntaxKind::OBJECT_KW => parse_structured(ctx, decl, TypeKind::Class, generics),
        SyntaxKind::RECORD_KW => parse_structured(ctx, decl, TypeKind::Record, generics),
        SyntaxKind::INTERFACE_KW | SyntaxKind::DISPINTERFACE_KW => {
            parse_structured(ctx, decl, TypeKind::Interface, generics)
        }
        SyntaxKind::L_PAREN => parse_enum(ctx, decl),
        SyntaxKind::PROCEDURE_KW | SyntaxKind::FUNCTION_KW => parse_procedural(ctx, decl, generics),
        SyntaxKind::IDENT if ctx.cursor.at_word("reference") => parse_procedural(ctx, decl, generics),
        _ => parse_alias(ctx, decl, generics),
    }
}

struct TypeDecl<'s, 't, 'a> {
    start: usize,
    name: &'t Token<'a>,
    owner: Option<&'s SmolStr>,
    visibility: Visibility,
}

impl TypeDecl<'_, '_, '_> {
    fn push(&self, ctx: &mut ExtractionContext<'_, '_>, def: TypeDef) -> usize {
        let extent = ctx.extent_from(self.start);
        ctx.push(
            self.name,
            extent,
            self.visibility,
            self.owner.cloned(),
            DefinitionData::Type(def),
        )
    }

    fn path(&self) -> SmolStr {
        child_path(self.owner.map(|s| s.as_str()), self.name.ident_text())
    }
}

/// Class, object, record and interface types.
fn parse_structured(
    ctx: &mut ExtractionContext<'_, '_>,
    decl: TypeDecl<'_, '_, '_>,
    kind: TypeKind,
    generics: Vec<GenericParam>,
) {
    let keyword = ctx.cursor.pos();
    ctx.cursor.bump();
    let mut def = TypeDef::new(kind);
    def.generics = generics;

    if kind == TypeKind::Class && ctx.cursor.at(SyntaxKind::OF_KW) {
        // Metaclass: `TFooClass = class of TFoo;`
        ctx.cursor.bump();
        def.kind = TypeKind::Alias;
        def.alias_target = read_type(ctx, |_| false);
        ctx.cursor.skip_past_semicolon();
        decl.push(ctx, def);
        return;
    }

    let mut complete = false;
    if ctx.cursor.at_word("helper") {
        ctx.cursor.bump();
        if ctx.cursor.at(SyntaxKind::L_PAREN) {
            def.parent = parse_heritage(ctx).into_iter().next();
        }
        if ctx.cursor.eat(SyntaxKind::FOR_KW) {
            def.helper_for = if ctx.cursor.eat(SyntaxKind::STRING_KW) {
                Some(SmolStr::new_static("string"))
            } else {
                read_specifier(ctx)
            };
        }
        complete = true;
    }
    while ctx.cursor.at_word("abstract") || ctx.cursor.at_word("sealed") {
        ctx.cursor.bump();
    }
    if ctx.cursor.at(SyntaxKind::L_PAREN) {
        let mut heritage = parse_heritage(ctx).into_iter();
        if def.parent.is_none() {
            def.parent = heritage.next();
        }
        def.interfaces = heritage.collect();
        complete = true;
    }
    if kind == TypeKind::Interface {
        if let Some(guid) = parse_guid(ctx) {
            def.guid = Some(guid);
            complete = true;
        }
    }

    if ctx.cursor.at(SyntaxKind::SEMICOLON) {
        // `TFoo = class;` declares ahead; `TFoo = class(TBase);` is a whole
        // class with an empty body.
        def.is_forward = !complete && kind != TypeKind::Record;
        ctx.cursor.bump();
        decl.push(ctx, def);
        return;
    }

    let body = ctx.cursor.pos();
    let limit = ctx.cursor.limit();
    let end = find_body_end(ctx.cursor.tokens(), body, limit);
    let path = decl.path();
    let idx = decl.push(ctx, def);

    let body_end = match end {
        Some(end) => end,
        None => {
            ctx.skip_from(keyword, "unterminated type body");
            limit
        }
    };
    let old_limit = ctx.cursor.set_limit(body_end);
    parse_members(ctx, &path);
    ctx.cursor.set_limit(old_limit);
    ctx.cursor.set_pos(body_end);
    if end.is_some() {
        ctx.cursor.bump();
        // hint directives before the terminator
        ctx.cursor.skip_past_semicolon();
    }
    ctx.records[idx].extent = ctx.extent_from(decl.start);
    ctx.discard_attributes();
}

/// Members of a structured type, with the cursor limited to its body.
pub(super) fn parse_members(ctx: &mut ExtractionContext<'_, '_>, owner: &SmolStr) {
    let mut visibility = Visibility::Public;
    while !ctx.cursor.is_eof() {
        let Some(tok) = ctx.cursor.peek() else { break };
        match tok.kind {
            SyntaxKind::IDENT if tok.is_word("strict") => {
                let next = ctx.cursor.nth(1);
                visibility = match next {
                    Some(n) if n.is_word("private") => Visibility::StrictPrivate,
                    Some(n) if n.is_word("protected") => Visibility::StrictProtected,
                    _ => visibility,
                };
                ctx.cursor.bump();
                ctx.cursor.bump();
            }
            SyntaxKind::IDENT
                if is_one_of(tok.text, VISIBILITY_WORDS)
                    && !matches!(ctx.cursor.nth_kind(1), SyntaxKind::COLON | SyntaxKind::COMMA) =>
            {
                visibility = match tok.text.to_ascii_lowercase().as_str() {
                    "private" => Visibility::Private,
                    "protected" => Visibility::Protected,
                    "published" => Visibility::Published,
                    _ => Visibility::Public,
                };
                ctx.cursor.bump();
            }
            SyntaxKind::L_BRACKET if ctx.cursor.nth_kind(1) == SyntaxKind::STRING => {
                ctx.cursor.skip_group();
            }
            SyntaxKind::L_BRACKET => parse_attributes(ctx),
            SyntaxKind::CLASS_KW => match ctx.cursor.nth_kind(1) {
                SyntaxKind::VAR_KW => {
                    ctx.cursor.bump();
                    ctx.cursor.bump();
                    let scope = field_scope(owner, visibility, true);
                    parse_var_section(ctx, &scope);
                }
                SyntaxKind::PROPERTY_KW => {
                    ctx.cursor.bump();
                    parse_property(ctx, owner, visibility, true);
                }
                k if k.is_routine_kw() || ctx.cursor.nth_is_word(1, "operator") => {
                    parse_routine(ctx, &RoutineSite::Member { owner, visibility });
                }
                _ => ctx.recover("class member"),
            },
            k if k.is_routine_kw() => parse_routine(ctx, &RoutineSite::Member { owner, visibility }),
            SyntaxKind::PROPERTY_KW => parse_property(ctx, owner, visibility, false),
            SyntaxKind::VAR_KW | SyntaxKind::THREADVAR_KW => {
                ctx.cursor.bump();
                let scope = field_scope(owner, visibility, false);
                parse_var_section(ctx, &scope);
            }
            SyntaxKind::CONST_KW => {
                ctx.cursor.bump();
                parse_const_section(ctx, Some(owner), visibility, false);
            }
            SyntaxKind::TYPE_KW => {
                ctx.cursor.bump();
                parse_type_section(ctx, Some(owner), visibility);
            }
            SyntaxKind::CASE_KW => parse_variant_part(ctx, owner, visibility),
            SyntaxKind::IDENT if matches!(ctx.cursor.nth_kind(1), SyntaxKind::COLON | SyntaxKind::COMMA) => {
                let scope = field_scope(owner, visibility, false);
                parse_var_decl(ctx, &scope);
            }
            SyntaxKind::SEMICOLON => {
                ctx.cursor.bump();
            }
            _ => ctx.recover("type body"),
        }
    }
    ctx.discard_attributes();
}

fn field_scope(owner: &SmolStr, visibility: Visibility, is_class_var: bool) -> VarScope<'_> {
    VarScope {
        owner: Some(owner),
        visibility,
        kind: VariableKind::Field,
        is_class_var,
    }
}

/// `case Tag: TKind of 0: (A: Integer); 1: (B: Double);`
fn parse_variant_part(ctx: &mut ExtractionContext<'_, '_>, owner: &SmolStr, visibility: Visibility) {
    ctx.cursor.bump();
    if ctx.cursor.at(SyntaxKind::IDENT) && ctx.cursor.nth_kind(1) == SyntaxKind::COLON {
        let start = ctx.cursor.pos();
        if let Some(tag) = ctx.cursor.bump() {
            ctx.cursor.bump();
            let type_name = read_type(ctx, |t| t.kind == SyntaxKind::OF_KW);
            let extent = ctx.extent_from(start);
            ctx.push(
                tag,
                extent,
                visibility,
                Some(owner.clone()),
                DefinitionData::Variable(VariableDef {
                    type_name,
                    kind: VariableKind::Field,
                    scope_range: None,
                    is_class_var: false,
                    is_inline: false,
                }),
            );
        }
    } else {
        read_type(ctx, |t| t.kind == SyntaxKind::OF_KW);
    }
    if !ctx.cursor.eat(SyntaxKind::OF_KW) {
        ctx.recover("variant part");
        return;
    }
    while !ctx.cursor.is_eof() {
        // case labels
        while !ctx.cursor.is_eof() && !ctx.cursor.at(SyntaxKind::COLON) {
            ctx.cursor.bump();
        }
        if !ctx.cursor.eat(SyntaxKind::COLON) {
            break;
        }
        let open = ctx.cursor.pos();
        let Some(close) = ctx.cursor.matching_close(open) else {
            ctx.recover("variant part");
            break;
        };
        let old_limit = ctx.cursor.set_limit(close);
        ctx.cursor.bump();
        parse_members(ctx, owner);
        ctx.cursor.set_limit(old_limit);
        ctx.cursor.set_pos(close + 1);
        ctx.cursor.eat(SyntaxKind::SEMICOLON);
    }
}

/// `property Items[Index: Integer]: TItem read GetItem write SetItem; default;`
fn parse_property(ctx: &mut ExtractionContext<'_, '_>, owner: &SmolStr, visibility: Visibility, is_class: bool) {
    let start = ctx.cursor.pos();
    ctx.cursor.bump();
    let Some(name) = ctx.cursor.peek().filter(|t| t.kind == SyntaxKind::IDENT) else {
        ctx.recover("property");
        return;
    };
    ctx.cursor.bump();
    let mut def = PropertyDef {
        type_name: None,
        read: None,
        write: None,
        index_params: Vec::new(),
        is_default: false,
        is_class_property: is_class,
    };
    if ctx.cursor.at(SyntaxKind::L_BRACKET) {
        def.index_params = parse_params(ctx);
    }
    if ctx.cursor.eat(SyntaxKind::COLON) {
        def.type_name = read_type(ctx, |t| t.kind == SyntaxKind::IDENT && is_one_of(t.text, PROPERTY_SPECIFIERS));
    }
    while let Some(tok) = ctx.cursor.peek() {
        if tok.kind == SyntaxKind::SEMICOLON {
            ctx.cursor.bump();
            break;
        }
        ctx.cursor.bump();
        if tok.is_word("read") {
            def.read = read_specifier(ctx);
        } else if tok.is_word("write") {
            def.write = read_specifier(ctx);
        }
    }
    if ctx.cursor.at_word("default") && ctx.cursor.nth_kind(1) == SyntaxKind::SEMICOLON {
        def.is_default = true;
        ctx.cursor.bump();
        ctx.cursor.bump();
    }
    let extent = ctx.extent_from(start);
    ctx.push(name, extent, visibility, Some(owner.clone()), DefinitionData::Property(def));
}

/// `TColor = (clRed, clGreen = 5, clBlue);` — the values become constants.
fn parse_enum(ctx: &mut ExtractionContext<'_, '_>, decl: TypeDecl<'_, '_, '_>) {
    let open = ctx.cursor.pos();
    let Some(close) = ctx.cursor.matching_close(open) else {
        ctx.recover("enumeration");
        return;
    };
    let mut values: Vec<(&Token<'_>, TextRange)> = Vec::new();
    let old_limit = ctx.cursor.set_limit(close);
    ctx.cursor.bump();
    while !ctx.cursor.is_eof() {
        let value_start = ctx.cursor.pos();
        match ctx.cursor.peek() {
            Some(tok) if tok.kind == SyntaxKind::IDENT => {
                ctx.cursor.bump();
                while !ctx.cursor.is_eof() && !ctx.cursor.at(SyntaxKind::COMMA) {
                    if !ctx.cursor.skip_group() {
                        ctx.cursor.bump();
                    }
                }
                values.push((tok, ctx.extent_from(value_start)));
            }
            _ => {
                ctx.cursor.bump();
            }
        }
        ctx.cursor.eat(SyntaxKind::COMMA);
    }
    ctx.cursor.set_limit(old_limit);
    ctx.cursor.set_pos(close + 1);
    ctx.cursor.skip_past_semicolon();

    decl.push(ctx, TypeDef::new(TypeKind::Enum));
    let enum_name = SmolStr::new(decl.name.ident_text());
    for (tok, extent) in values {
        ctx.push(
            tok,
            extent,
            decl.visibility,
            decl.owner.cloned(),
            DefinitionData::Variable(VariableDef {
                type_name: Some(enum_name.clone()),
                kind: VariableKind::Constant,
                scope_range: None,
                is_class_var: false,
                is_inline: false,
            }),
        );
    }
}

/// `TProc = procedure(A: Integer) of object;`, `reference to function: T;`
fn parse_procedural(
    ctx: &mut ExtractionContext<'_, '_>,
    decl: TypeDecl<'_, '_, '_>,
    generics: Vec<GenericParam>,
) {
    ctx.cursor.skip_past_semicolon();
    while ctx
        .cursor
        .peek()
        .is_some_and(|t| t.kind == SyntaxKind::IDENT && is_one_of(t.text, TYPE_DIRECTIVES))
    {
        ctx.cursor.skip_past_semicolon();
    }
    let mut def = TypeDef::new(TypeKind::Procedural);
    def.generics = generics;
    decl.push(ctx, def);
}

/// Everything else: aliases, subranges, sets, arrays, pointers.
fn parse_alias(
    ctx: &mut ExtractionContext<'_, '_>,
    decl: TypeDecl<'_, '_, '_>,
    generics: Vec<GenericParam>,
) {
    let rhs = ctx.cursor.pos();
    read_type(ctx, |_| false);
    let rhs_end = ctx.cursor.pos();
    let mut def = TypeDef::new(TypeKind::Alias);
    def.generics = generics;
    let run = &ctx.cursor.tokens()[rhs..rhs_end];
    if is_plain_type_name(run) {
        def.alias_target = Some(join_tokens(run));
    }
    ctx.cursor.skip_past_semicolon();
    decl.push(ctx, def);
}
