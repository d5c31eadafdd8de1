//! Logos-based lexer for Object Pascal
//!
//! Fast tokenization using the logos crate. The lexer never fails: bytes it
//! cannot classify become `ERROR` tokens so extraction can skip over them.

use super::keywords::classify_word;
use super::syntax_kind::SyntaxKind;
use logos::Logos;
use text_size::{TextRange, TextSize};

/// A token with its kind, text, and position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: TextSize,
}

impl<'a> Token<'a> {
    /// Byte range of this token in the source.
    pub fn range(&self) -> TextRange {
        TextRange::at(self.offset, TextSize::of(self.text))
    }

    /// End offset of this token.
    pub fn end(&self) -> TextSize {
        self.offset + TextSize::of(self.text)
    }

    /// Identifier text with the `&` escape prefix removed (`&begin` → `begin`).
    pub fn ident_text(&self) -> &'a str {
        self.text.strip_prefix('&').unwrap_or(self.text)
    }

    /// Case-insensitive comparison against a word.
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == SyntaxKind::IDENT && self.text.eq_ignore_ascii_case(word)
    }
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
    offset: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            offset: 0,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let offset = TextSize::new(self.offset);
        self.offset += text.len() as u32;

        let kind = match logos_token {
            Ok(LogosToken::Word) if text.starts_with('&') => SyntaxKind::IDENT,
            Ok(LogosToken::Word) => classify_word(text),
            Ok(t) => t.into(),
            Err(()) => SyntaxKind::ERROR,
        };

        Some(Token { kind, text, offset })
    }
}

/// Tokenize an entire string into a Vec, trivia included.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

/// Tokenize and drop trivia (whitespace, comments, compiler directives).
pub fn significant_tokens(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).filter(|t| !t.kind.is_trivia()).collect()
}

/// Logos token enum - maps to SyntaxKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"\{[^$}][^}]*\}")]
    #[token("{}")]
    BraceComment,

    #[regex(r"\(\*([^*]|\*+[^*)])*\*+\)")]
    ParenComment,

    #[regex(r"\{\$[^}]*\}")]
    Directive,

    // =========================================================================
    // LITERALS
    // =========================================================================
    /// Identifiers and reserved words; `&` escapes a reserved word.
    #[regex(r"&?[A-Za-z_][A-Za-z0-9_]*")]
    Word,

    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    #[regex(r"\$[0-9A-Fa-f]+")]
    #[regex(r"%[01]+")]
    #[regex(r"&[0-7]+")]
    Number,

    #[regex(r"'([^'\n]|'')*'")]
    String,

    #[regex(r"#[0-9]+")]
    #[regex(r"#\$[0-9A-Fa-f]+")]
    CharCode,

    // =========================================================================
    // MULTI-CHARACTER PUNCTUATION
    // =========================================================================
    #[token(":=")]
    Assign,
    #[token("..")]
    DotDot,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<>")]
    NotEq,

    // =========================================================================
    // SINGLE-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("^")]
    Caret,
    #[token("@")]
    At,
    #[token("&")]
    Amp,
}

impl From<LogosToken> for SyntaxKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Whitespace => SyntaxKind::WHITESPACE,
            LogosToken::LineComment => SyntaxKind::LINE_COMMENT,
            LogosToken::BraceComment | LogosToken::ParenComment => SyntaxKind::BLOCK_COMMENT,
            LogosToken::Directive => SyntaxKind::DIRECTIVE,
            LogosToken::Word => SyntaxKind::IDENT,
            LogosToken::Number => SyntaxKind::NUMBER,
            LogosToken::String => SyntaxKind::STRING,
            LogosToken::CharCode => SyntaxKind::CHAR_CODE,
            LogosToken::Assign => SyntaxKind::ASSIGN,
            LogosToken::DotDot => SyntaxKind::DOT_DOT,
            LogosToken::LtEq => SyntaxKind::LT_EQ,
            LogosToken::GtEq => SyntaxKind::GT_EQ,
            LogosToken::NotEq => SyntaxKind::NEQ,
            LogosToken::LParen => SyntaxKind::L_PAREN,
            LogosToken::RParen => SyntaxKind::R_PAREN,
            LogosToken::LBracket => SyntaxKind::L_BRACKET,
            LogosToken::RBracket => SyntaxKind::R_BRACKET,
            LogosToken::Semicolon => SyntaxKind::SEMICOLON,
            LogosToken::Colon => SyntaxKind::COLON,
            LogosToken::Comma => SyntaxKind::COMMA,
            LogosToken::Dot => SyntaxKind::DOT,
            LogosToken::Eq => SyntaxKind::EQ,
            LogosToken::Lt => SyntaxKind::LT,
            LogosToken::Gt => SyntaxKind::GT,
            LogosToken::Plus => SyntaxKind::PLUS,
            LogosToken::Minus => SyntaxKind::MINUS,
            LogosToken::Star => SyntaxKind::STAR,
            LogosToken::Slash => SyntaxKind::SLASH,
            LogosToken::Caret => SyntaxKind::CARET,
            LogosToken::At => SyntaxKind::AT,
            LogosToken::Amp => SyntaxKind::AMP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<SyntaxKind> {
        significant_tokens(input).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_unit_header() {
        assert_eq!(
            kinds("unit Foo.Bar;"),
            vec![
                SyntaxKind::UNIT_KW,
                SyntaxKind::IDENT,
                SyntaxKind::DOT,
                SyntaxKind::IDENT,
                SyntaxKind::SEMICOLON,
            ]
        );
    }

    #[test]
    fn test_lex_comments_and_directives_are_trivia() {
        let tokens = tokenize("{ c } (* c *) // c\n{$IFDEF X} begin");
        let significant: Vec<_> = tokens.iter().filter(|t| !t.kind.is_trivia()).collect();
        assert_eq!(significant.len(), 1);
        assert_eq!(significant[0].kind, SyntaxKind::BEGIN_KW);
        assert!(tokens.iter().any(|t| t.kind == SyntaxKind::DIRECTIVE));
    }

    #[test]
    fn test_lex_strings_with_escaped_quotes() {
        let tokens = significant_tokens("'it''s' #13#$0A");
        assert_eq!(tokens[0].kind, SyntaxKind::STRING);
        assert_eq!(tokens[0].text, "'it''s'");
        assert_eq!(tokens[1].kind, SyntaxKind::CHAR_CODE);
        assert_eq!(tokens[2].kind, SyntaxKind::CHAR_CODE);
    }

    #[test]
    fn test_lex_range_is_not_decimal() {
        assert_eq!(
            kinds("1..10"),
            vec![SyntaxKind::NUMBER, SyntaxKind::DOT_DOT, SyntaxKind::NUMBER]
        );
    }

    #[test]
    fn test_lex_escaped_identifier() {
        let tokens = significant_tokens("&begin");
        assert_eq!(tokens[0].kind, SyntaxKind::IDENT);
        assert_eq!(tokens[0].ident_text(), "begin");
    }

    #[test]
    fn test_lex_offsets_cover_input() {
        let input = "type\n  TFoo = class end;";
        let tokens = tokenize(input);
        let total: usize = tokens.iter().map(|t| t.text.len()).sum();
        assert_eq!(total, input.len());
        let foo = tokens.iter().find(|t| t.text == "TFoo").unwrap();
        assert_eq!(u32::from(foo.offset), 7);
    }
}
