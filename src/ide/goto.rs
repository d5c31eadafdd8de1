//! Go-to-definition implementation.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::base::FileId;
use crate::hir::{ChainResult, DefKind, DefinitionRecord, ResolveResult, Resolver};
use crate::parser::{SyntaxKind, Token, significant_tokens};

/// Result of a go-to-definition request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GotoResult {
    pub targets: Vec<GotoTarget>,
}

impl GotoResult {
    /// Create an empty result (no targets found).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(target: GotoTarget) -> Self {
        Self { targets: vec![target] }
    }

    pub fn multiple(targets: Vec<GotoTarget>) -> Self {
        Self { targets }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// A target location for go-to-definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GotoTarget {
    pub file: FileId,
    /// Range of the target's name.
    pub range: TextRange,
    pub kind: DefKind,
    pub name: SmolStr,
    pub unit: SmolStr,
}

impl From<&DefinitionRecord> for GotoTarget {
    fn from(record: &DefinitionRecord) -> Self {
        Self {
            file: record.file,
            range: record.range,
            kind: record.kind(),
            name: record.name.clone(),
            unit: record.unit.clone(),
        }
    }
}

/// Find the declaration of the identifier at `offset` in `text`.
///
/// A dotted qualifier to the left of the identifier (`Shape.Bounds.Width`)
/// is resolved as a member chain. An ambiguous name yields every candidate;
/// a name only declared in units missing from the uses clauses yields none.
pub fn goto_definition(resolver: &Resolver<'_>, file: FileId, text: &str, offset: TextSize) -> GotoResult {
    let tokens = significant_tokens(text);
    let Some(idx) = tokens
        .iter()
        .position(|t| t.kind == SyntaxKind::IDENT && t.range().contains_inclusive(offset))
    else {
        return GotoResult::empty();
    };
    let start = chain_start(&tokens, idx);
    let segments: Vec<&str> = tokens[start..=idx].iter().step_by(2).map(Token::ident_text).collect();
    let head = tokens[start].offset;

    if segments.len() > 1 {
        return match resolver.resolve_chain(&segments, file, head) {
            ChainResult::Resolved(record) => GotoResult::single(GotoTarget::from(&record)),
            ChainResult::Unresolved => GotoResult::empty(),
        };
    }
    match resolver.resolve(segments[0], file, head) {
        ResolveResult::Unique(record) => GotoResult::single(GotoTarget::from(&record)),
        ResolveResult::Ambiguous(units) => GotoResult::multiple(
            resolver
                .declarations_in_units(segments[0], &units)
                .iter()
                .map(GotoTarget::from)
                .collect(),
        ),
        ResolveResult::MissingUses { .. } | ResolveResult::NotFound => GotoResult::empty(),
    }
}

/// Index of the first identifier of the `A.B.C` run ending at `idx`.
fn chain_start(tokens: &[Token<'_>], idx: usize) -> usize {
    let mut start = idx;
    while start >= 2 && tokens[start - 1].kind == SyntaxKind::DOT && tokens[start - 2].kind == SyntaxKind::IDENT {
        start -= 2;
    }
    start
}
