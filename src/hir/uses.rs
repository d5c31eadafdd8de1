//! Uses-clause analysis.
//!
//! A unit has two dependency lists with different reach: names in the
//! interface `uses` are visible in the whole file, names in the
//! implementation `uses` only after the `implementation` keyword. Program,
//! library and package files have a single list visible everywhere.
//!
//! The same scanner serves two callers. The skeleton extractor runs it over
//! the full token stream; the activation closure runs it lazily over the
//! lexer with [`scan_uses`], which stops at the first declaration that
//! follows the last place a uses clause may appear.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::base::constants::USES_SCAN_TOKEN_LIMIT;
use crate::base::names_eq;
use crate::parser::{Lexer, SyntaxKind, Token};

use super::records::Section;

/// What kind of compilation file this is, from its header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum HeaderKind {
    Unit,
    Program,
    Library,
    Package,
    /// No header (include files, fragments).
    #[default]
    None,
}

impl HeaderKind {
    /// Whether the file splits into interface and implementation sections.
    pub fn has_sections(self) -> bool {
        self == HeaderKind::Unit
    }
}

/// One name in a uses (or `requires` / `contains`) list.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct UsesEntry {
    /// Dotted unit name as written.
    pub name: SmolStr,
    /// Path from a `Name in 'path'` clause.
    pub in_path: Option<SmolStr>,
    pub range: TextRange,
}

/// The uses analysis of one file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct UsesInfo {
    pub header: HeaderKind,
    /// Name from the header clause, dotted.
    pub unit_name: Option<SmolStr>,
    pub interface_uses: Vec<UsesEntry>,
    pub implementation_uses: Vec<UsesEntry>,
    pub interface_start: TextSize,
    pub implementation_start: TextSize,
}

impl UsesInfo {
    /// All entries, interface first.
    pub fn all_uses(&self) -> impl Iterator<Item = &UsesEntry> {
        self.interface_uses.iter().chain(&self.implementation_uses)
    }

    /// Entries whose names are visible at `offset`.
    pub fn visible_at(&self, offset: TextSize) -> impl Iterator<Item = &UsesEntry> {
        let implementation = if offset >= self.implementation_start {
            &self.implementation_uses[..]
        } else {
            &[]
        };
        self.interface_uses.iter().chain(implementation)
    }

    /// Whether unit `name` is visible at `offset` through this file's uses.
    pub fn is_visible(&self, name: &str, offset: TextSize) -> bool {
        self.visible_at(offset).any(|e| names_eq(&e.name, name))
    }

    /// Section that `offset` falls in.
    pub fn section_at(&self, offset: TextSize) -> Section {
        if !self.header.has_sections() {
            Section::Program
        } else if offset >= self.implementation_start {
            Section::Implementation
        } else {
            Section::Interface
        }
    }
}

/// Analyze a file's uses clauses from its significant tokens.
pub fn parse_uses(tokens: &[Token<'_>], text_len: TextSize) -> UsesInfo {
    UsesScanner::new(tokens.iter().copied(), text_len).run()
}

/// Cheap uses scan over raw text, used before a file is activated.
///
/// Lexes lazily and stops once no further uses clause can follow, so a
/// large implementation section is never tokenized.
pub fn scan_uses(text: &str) -> UsesInfo {
    let tokens = Lexer::new(text)
        .filter(|t| !t.kind.is_trivia())
        .take(USES_SCAN_TOKEN_LIMIT);
    UsesScanner::new(tokens, TextSize::of(text)).run()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ListTarget {
    Interface,
    Implementation,
}

struct UsesScanner<I: Iterator> {
    tokens: std::iter::Peekable<I>,
    info: UsesInfo,
}

impl<'a, I> UsesScanner<I>
where
    I: Iterator<Item = Token<'a>>,
{
    fn new(tokens: I, text_len: TextSize) -> Self {
        Self {
            tokens: tokens.peekable(),
            info: UsesInfo {
                interface_start: TextSize::from(0),
                implementation_start: text_len,
                ..UsesInfo::default()
            },
        }
    }

    fn run(mut self) -> UsesInfo {
        self.header();
        if self.info.header.has_sections() {
            self.unit_sections();
        } else {
            self.single_list();
        }
        self.info
    }

    fn header(&mut self) {
        let Some(first) = self.tokens.peek().copied() else {
            return;
        };
        let kind = match first.kind {
            SyntaxKind::UNIT_KW => HeaderKind::Unit,
            SyntaxKind::PROGRAM_KW => HeaderKind::Program,
            SyntaxKind::LIBRARY_KW => HeaderKind::Library,
            SyntaxKind::IDENT if first.is_word("package") => HeaderKind::Package,
            _ => return,
        };
        self.tokens.next();
        self.info.header = kind;
        self.info.unit_name = self.dotted_name().map(|(name, _)| name);
        // `program Foo(Input, Output);` and hint directives before `;`
        for tok in self.tokens.by_ref() {
            if tok.kind == SyntaxKind::SEMICOLON {
                break;
            }
        }
    }

    fn unit_sections(&mut self) {
        let mut seen_interface = false;
        while let Some(tok) = self.tokens.peek().copied() {
            match tok.kind {
                SyntaxKind::INTERFACE_KW if !seen_interface => {
                    seen_interface = true;
                    self.info.interface_start = tok.offset;
                    self.tokens.next();
                    if self.peek_kind() == SyntaxKind::USES_KW {
                        self.tokens.next();
                        self.list(ListTarget::Interface);
                    }
                }
                SyntaxKind::IMPLEMENTATION_KW => {
                    self.info.implementation_start = tok.offset;
                    self.tokens.next();
                    if self.peek_kind() == SyntaxKind::USES_KW {
                        self.tokens.next();
                        self.list(ListTarget::Implementation);
                    }
                    return;
                }
                _ => {
                    self.tokens.next();
                }
            }
        }
    }

    fn single_list(&mut self) {
        self.info.implementation_start = TextSize::from(0);
        loop {
            match self.tokens.peek() {
                Some(t) if t.kind == SyntaxKind::USES_KW => {}
                Some(t) if t.is_word("requires") || t.is_word("contains") => {}
                _ => return,
            }
            self.tokens.next();
            self.list(ListTarget::Interface);
        }
    }

    /// `A, B.C in 'path\B.C.pas', D;`
    fn list(&mut self, target: ListTarget) {
        loop {
            let Some((name, range)) = self.dotted_name() else {
                self.skip_to_semicolon();
                return;
            };
            let mut in_path = None;
            if self.peek_kind() == SyntaxKind::IN_KW {
                self.tokens.next();
                if let Some(path) = self.tokens.next_if(|t| t.kind == SyntaxKind::STRING) {
                    in_path = Some(unquote(path.text));
                }
            }
            let entry = UsesEntry {
                name,
                in_path,
                range,
            };
            match target {
                ListTarget::Interface => self.info.interface_uses.push(entry),
                ListTarget::Implementation => self.info.implementation_uses.push(entry),
            }
            match self.tokens.next().map(|t| t.kind) {
                Some(SyntaxKind::COMMA) => continue,
                Some(SyntaxKind::SEMICOLON) | None => return,
                Some(_) => {
                    self.skip_to_semicolon();
                    return;
                }
            }
        }
    }

    fn dotted_name(&mut self) -> Option<(SmolStr, TextRange)> {
        let first = self.tokens.next_if(|t| t.kind == SyntaxKind::IDENT)?;
        let mut name = String::from(first.ident_text());
        let mut end = first.end();
        while self.peek_kind() == SyntaxKind::DOT {
            self.tokens.next();
            match self.tokens.next_if(|t| t.kind == SyntaxKind::IDENT) {
                Some(seg) => {
                    name.push('.');
                    name.push_str(seg.ident_text());
                    end = seg.end();
                }
                None => break,
            }
        }
        Some((SmolStr::new(name), TextRange::new(first.offset, end)))
    }

    fn skip_to_semicolon(&mut self) {
        for tok in self.tokens.by_ref() {
            if tok.kind == SyntaxKind::SEMICOLON {
                return;
            }
        }
    }

    fn peek_kind(&mut self) -> SyntaxKind {
        self.tokens.peek().map_or(SyntaxKind::EOF, |t| t.kind)
    }
}

/// Strip the quotes of a string literal and collapse `''` escapes.
pub(crate) fn unquote(text: &str) -> SmolStr {
    let inner = text
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(text);
    SmolStr::new(inner.replace("''", "'"))
}
