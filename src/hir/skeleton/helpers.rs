//! Token-level helpers shared by the extractors.
//!
//! Type expressions are not parsed; they are captured as normalized text
//! (tokens joined, a space only between adjacent words) and the resolvers
//! work from that text.

use smol_str::SmolStr;
use text_size::TextRange;

use crate::hir::records::{GenericParam, Param, ParamModifier};
use crate::hir::uses::unquote;
use crate::parser::{SyntaxKind, Token, TokenCursor};

use super::context::{ExtractionContext, PendingAttribute};

/// Whether the reserved word at `idx` opens a type body closed by `end`.
///
/// `class` / `object` / `interface` are body openers unless the next token
/// shows a method-kind use (`class function`, `class var`, `class of`), a
/// forward declaration (`class;`), or a heritage-only declaration
/// (`class(TBase);`). `record` always opens a body.
pub(super) fn opens_type_body(tokens: &[Token<'_>], idx: usize, limit: usize) -> bool {
    let Some(tok) = tokens.get(idx) else {
        return false;
    };
    match tok.kind {
        SyntaxKind::RECORD_KW => return true,
        SyntaxKind::CLASS_KW
        | SyntaxKind::OBJECT_KW
        | SyntaxKind::INTERFACE_KW
        | SyntaxKind::DISPINTERFACE_KW => {}
        _ => return false,
    }
    // `procedure of object`
    if idx > 0 && tokens[idx - 1].kind == SyntaxKind::OF_KW {
        return false;
    }
    let next = if idx + 1 < limit { tokens.get(idx + 1) } else { None };
    let Some(next) = next else {
        return false;
    };
    match next.kind {
        SyntaxKind::PROCEDURE_KW
        | SyntaxKind::FUNCTION_KW
        | SyntaxKind::CONSTRUCTOR_KW
        | SyntaxKind::DESTRUCTOR_KW
        | SyntaxKind::PROPERTY_KW
        | SyntaxKind::VAR_KW
        | SyntaxKind::THREADVAR_KW
        | SyntaxKind::CONST_KW
        | SyntaxKind::OF_KW
        | SyntaxKind::SEMICOLON => false,
        SyntaxKind::IDENT => !next.is_word("operator"),
        SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET => {
            let mut cursor = TokenCursor::new(tokens);
            cursor.set_limit(limit);
            match cursor.matching_close(idx + 1) {
                Some(close) => tokens
                    .get(close + 1)
                    .is_some_and(|after| after.kind != SyntaxKind::SEMICOLON),
                None => false,
            }
        }
        _ => true,
    }
}

/// Index of the `end` closing a type body whose first token is at `start`.
pub(super) fn find_body_end(tokens: &[Token<'_>], start: usize, limit: usize) -> Option<usize> {
    let mut depth = 1usize;
    for idx in start..limit.min(tokens.len()) {
        match tokens[idx].kind {
            SyntaxKind::END_KW => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ if opens_type_body(tokens, idx, limit) => depth += 1,
            _ => {}
        }
    }
    None
}

/// Join token texts: a space between adjacent words, nothing elsewhere.
pub(super) fn join_tokens(tokens: &[Token<'_>]) -> SmolStr {
    let mut out = String::new();
    let mut prev_word = false;
    for tok in tokens {
        let word = tok.kind == SyntaxKind::IDENT || tok.kind.is_keyword() || tok.kind == SyntaxKind::NUMBER;
        if word && prev_word {
            out.push(' ');
        }
        out.push_str(tok.ident_text());
        prev_word = word;
    }
    SmolStr::new(out)
}

/// Whether a token run is a plain (possibly dotted, possibly generic) type
/// name such as `TFoo`, `System.TObject`, `string` or `TList<Integer>`.
pub(super) fn is_plain_type_name(tokens: &[Token<'_>]) -> bool {
    let mut expect_name = true;
    let mut depth = 0usize;
    for tok in tokens {
        if depth > 0 {
            match tok.kind {
                SyntaxKind::LT => depth += 1,
                SyntaxKind::GT => depth -= 1,
                _ => {}
            }
            continue;
        }
        match tok.kind {
            SyntaxKind::IDENT | SyntaxKind::STRING_KW if expect_name => expect_name = false,
            SyntaxKind::DOT if !expect_name => expect_name = true,
            SyntaxKind::LT if !expect_name => depth = 1,
            _ => return false,
        }
    }
    !tokens.is_empty() && !expect_name && depth == 0
}

/// Read a type expression up to a stop token at bracket depth 0.
///
/// Inline `record ... end` bodies are consumed whole. Returns `None` when
/// no token was consumed.
pub(super) fn read_type(ctx: &mut ExtractionContext<'_, '_>, stop: impl Fn(&Token<'_>) -> bool) -> Option<SmolStr> {
    let start = ctx.cursor.pos();
    let mut depth = 0usize;
    while let Some(tok) = ctx.cursor.peek() {
        if depth == 0 && stop(tok) {
            break;
        }
        match tok.kind {
            SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET | SyntaxKind::LT => depth += 1,
            SyntaxKind::R_PAREN | SyntaxKind::R_BRACKET | SyntaxKind::GT => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            SyntaxKind::GT_EQ if depth == 1 => {
                // `TList<Integer>= nil`: the type ends inside the token
                let mut text = join_tokens(&ctx.cursor.tokens()[start..ctx.cursor.pos()]).to_string();
                text.push('>');
                return Some(SmolStr::new(text));
            }
            SyntaxKind::SEMICOLON if depth == 0 => break,
            SyntaxKind::RECORD_KW => {
                let body = ctx.cursor.pos() + 1;
                if let Some(end) = find_body_end(ctx.cursor.tokens(), body, ctx.cursor.limit()) {
                    ctx.cursor.set_pos(end + 1);
                    continue;
                }
            }
            _ => {}
        }
        ctx.cursor.bump();
    }
    let end = ctx.cursor.pos();
    if end == start {
        return None;
    }
    Some(join_tokens(&ctx.cursor.tokens()[start..end]))
}

/// Read a dotted name `A.B.C`, skipping generic argument groups after
/// segments. Returns the segments with the index of the last name token.
pub(super) fn read_dotted(ctx: &mut ExtractionContext<'_, '_>) -> Option<(Vec<SmolStr>, usize)> {
    if !ctx.cursor.at(SyntaxKind::IDENT) {
        return None;
    }
    let mut segments = Vec::new();
    let mut last = ctx.cursor.pos();
    loop {
        let Some(tok) = ctx.cursor.peek() else { break };
        if tok.kind != SyntaxKind::IDENT {
            break;
        }
        last = ctx.cursor.pos();
        segments.push(SmolStr::new(tok.ident_text()));
        ctx.cursor.bump();
        if ctx.cursor.at(SyntaxKind::LT) {
            ctx.cursor.skip_group();
        }
        if ctx.cursor.at(SyntaxKind::DOT) && ctx.cursor.nth_kind(1) == SyntaxKind::IDENT {
            ctx.cursor.bump();
        } else {
            break;
        }
    }
    Some((segments, last))
}

fn dotted_text(ctx: &mut ExtractionContext<'_, '_>) -> Option<SmolStr> {
    let start = ctx.cursor.pos();
    read_dotted(ctx)?;
    Some(join_tokens(&ctx.cursor.tokens()[start..ctx.cursor.pos()]))
}

/// Parse a generic parameter list `<K, V: class; T: IFoo, constructor>`
/// starting at the `<`. A constraint applies to every name in its group.
pub(super) fn parse_generic_params(ctx: &mut ExtractionContext<'_, '_>) -> Vec<GenericParam> {
    let open = ctx.cursor.pos();
    let Some(close) = ctx.cursor.matching_close(open) else {
        return Vec::new();
    };
    let old_limit = ctx.cursor.set_limit(close);
    ctx.cursor.bump();
    let mut params = Vec::new();
    while !ctx.cursor.is_eof() {
        let mut names = Vec::new();
        while let Some(tok) = ctx.cursor.peek() {
            match tok.kind {
                SyntaxKind::IDENT => names.push(SmolStr::new(tok.ident_text())),
                SyntaxKind::COMMA => {}
                _ => break,
            }
            ctx.cursor.bump();
        }
        let mut constraints = Vec::new();
        if ctx.cursor.eat(SyntaxKind::COLON) {
            loop {
                let found = read_type(ctx, |t| matches!(t.kind, SyntaxKind::COMMA | SyntaxKind::SEMICOLON));
                if let Some(c) = found {
                    constraints.push(c);
                }
                if !ctx.cursor.eat(SyntaxKind::COMMA) {
                    break;
                }
            }
        }
        params.extend(names.into_iter().map(|name| GenericParam {
            name,
            constraints: constraints.clone(),
        }));
        if !ctx.cursor.eat(SyntaxKind::SEMICOLON) && !ctx.cursor.is_eof() {
            ctx.cursor.bump();
        }
    }
    ctx.cursor.set_limit(old_limit);
    let fused = ctx.cursor.tokens()[close].kind == SyntaxKind::GT_EQ;
    ctx.cursor.set_pos(if fused { close } else { close + 1 });
    params
}

/// Parse a parameter list in `(...)` or `[...]` starting at the opener.
pub(super) fn parse_params(ctx: &mut ExtractionContext<'_, '_>) -> Vec<Param> {
    let open = ctx.cursor.pos();
    let Some(close) = ctx.cursor.matching_close(open) else {
        ctx.recover("parameter list");
        return Vec::new();
    };
    let old_limit = ctx.cursor.set_limit(close);
    ctx.cursor.bump();
    let mut params = Vec::new();
    while !ctx.cursor.is_eof() {
        let group_start = ctx.cursor.pos();
        if ctx.cursor.at(SyntaxKind::L_BRACKET) {
            ctx.cursor.skip_group();
        }
        let modifier = match ctx.cursor.peek() {
            Some(t) if t.kind == SyntaxKind::VAR_KW => ParamModifier::Var,
            Some(t) if t.kind == SyntaxKind::CONST_KW || t.is_word("constref") => ParamModifier::Const,
            Some(t) if t.kind == SyntaxKind::IN_KW => ParamModifier::In,
            Some(t) if t.is_word("out") && ctx.cursor.nth_kind(1) == SyntaxKind::IDENT => ParamModifier::Out,
            _ => ParamModifier::Value,
        };
        if modifier != ParamModifier::Value {
            ctx.cursor.bump();
        }
        let mut names: Vec<(SmolStr, TextRange)> = Vec::new();
        while let Some(tok) = ctx.cursor.peek() {
            match tok.kind {
                SyntaxKind::IDENT => names.push((SmolStr::new(tok.ident_text()), tok.range())),
                SyntaxKind::COMMA => {}
                _ => break,
            }
            ctx.cursor.bump();
        }
        let type_name = if ctx.cursor.eat(SyntaxKind::COLON) {
            read_type(ctx, |t| t.kind == SyntaxKind::EQ)
        } else {
            None
        };
        let has_default = ctx.cursor.at_eq();
        if has_default {
            ctx.cursor.skip_past_semicolon();
        } else {
            ctx.cursor.eat(SyntaxKind::SEMICOLON);
        }
        if names.is_empty() || ctx.cursor.pos() == group_start {
            ctx.cursor.set_pos(group_start);
            ctx.recover("parameter");
            continue;
        }
        params.extend(names.into_iter().map(|(name, range)| Param {
            name,
            range,
            type_name: type_name.clone(),
            modifier,
            has_default,
        }));
    }
    ctx.cursor.set_limit(old_limit);
    ctx.cursor.set_pos(close + 1);
    params
}

/// Parse the names of a heritage list `(TBase, IFoo)` starting at `(`.
pub(super) fn parse_heritage(ctx: &mut ExtractionContext<'_, '_>) -> Vec<SmolStr> {
    let open = ctx.cursor.pos();
    let Some(close) = ctx.cursor.matching_close(open) else {
        return Vec::new();
    };
    let old_limit = ctx.cursor.set_limit(close);
    ctx.cursor.bump();
    let mut names = Vec::new();
    while !ctx.cursor.is_eof() {
        match read_type(ctx, |t| t.kind == SyntaxKind::COMMA) {
            Some(name) => names.push(name),
            None => {
                ctx.cursor.bump();
            }
        }
        ctx.cursor.eat(SyntaxKind::COMMA);
    }
    ctx.cursor.set_limit(old_limit);
    ctx.cursor.set_pos(close + 1);
    names
}

/// Parse a bracketed attribute group `[Name(args), Other]` into the
/// pending list.
pub(super) fn parse_attributes(ctx: &mut ExtractionContext<'_, '_>) {
    let open = ctx.cursor.pos();
    let Some(close) = ctx.cursor.matching_close(open) else {
        ctx.recover("attribute");
        return;
    };
    let group_start = ctx.token(open).map(|t| t.offset).unwrap_or_default();
    let group_end = ctx.token(close).map(|t| t.end()).unwrap_or_default();
    let old_limit = ctx.cursor.set_limit(close);
    ctx.cursor.bump();
    while !ctx.cursor.is_eof() {
        let name_tok = ctx.cursor.peek();
        match dotted_text(ctx) {
            Some(name) => {
                let range = name_tok.map(|t| TextRange::new(t.offset, ctx.cursor.prev_end())).unwrap_or_default();
                let mut raw_args = None;
                if ctx.cursor.at(SyntaxKind::L_PAREN) {
                    let args_open = ctx.cursor.pos();
                    if let Some(args_close) = ctx.cursor.matching_close(args_open) {
                        let from = ctx.token(args_open).map(|t| t.end()).unwrap_or_default();
                        let to = ctx.token(args_close).map(|t| t.offset).unwrap_or(from);
                        let text = ctx.text.get(usize::from(from)..usize::from(to)).unwrap_or("");
                        raw_args = Some(SmolStr::new(text.trim()));
                        ctx.cursor.set_pos(args_close + 1);
                    }
                }
                ctx.pending_attributes.push(PendingAttribute {
                    name,
                    range,
                    extent: TextRange::new(group_start, group_end),
                    raw_args,
                });
            }
            None => {
                ctx.cursor.bump();
            }
        }
        ctx.cursor.eat(SyntaxKind::COMMA);
    }
    ctx.cursor.set_limit(old_limit);
    ctx.cursor.set_pos(close + 1);
}

/// Read a GUID group `['{...}']` at the cursor.
pub(super) fn parse_guid(ctx: &mut ExtractionContext<'_, '_>) -> Option<SmolStr> {
    if !ctx.cursor.at(SyntaxKind::L_BRACKET) || ctx.cursor.nth_kind(1) != SyntaxKind::STRING {
        return None;
    }
    let guid = ctx.cursor.nth(1).map(|t| unquote(t.text));
    ctx.cursor.skip_group();
    guid
}

/// Read a property specifier value: `FValue`, `FRec.X`, `GetItem`.
pub(super) fn read_specifier(ctx: &mut ExtractionContext<'_, '_>) -> Option<SmolStr> {
    dotted_text(ctx)
}
