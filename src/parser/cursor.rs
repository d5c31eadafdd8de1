//! Forward cursor over significant tokens.

use super::{SyntaxKind, Token};
use text_size::{TextRange, TextSize};

/// A forward cursor over a slice of significant tokens.
///
/// The cursor can be confined to a sub-range (`limit`), which is how a class
/// body whose extent was found by depth counting is parsed without any risk
/// of running past its `end`.
#[derive(Clone, Debug)]
pub struct TokenCursor<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    limit: usize,
}

impl<'t, 'a> TokenCursor<'t, 'a> {
    pub fn new(tokens: &'t [Token<'a>]) -> Self {
        Self {
            tokens,
            pos: 0,
            limit: tokens.len(),
        }
    }

    /// All tokens, regardless of the current limit.
    pub fn tokens(&self) -> &'t [Token<'a>] {
        self.tokens
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len());
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Confine the cursor to `[pos, limit)`, returning the previous limit.
    pub fn set_limit(&mut self, limit: usize) -> usize {
        std::mem::replace(&mut self.limit, limit.min(self.tokens.len()))
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.limit
    }

    pub fn peek(&self) -> Option<&'t Token<'a>> {
        self.nth(0)
    }

    pub fn nth(&self, n: usize) -> Option<&'t Token<'a>> {
        let idx = self.pos + n;
        if idx < self.limit { self.tokens.get(idx) } else { None }
    }

    pub fn peek_kind(&self) -> SyntaxKind {
        self.nth_kind(0)
    }

    pub fn nth_kind(&self, n: usize) -> SyntaxKind {
        self.nth(n).map_or(SyntaxKind::EOF, |t| t.kind)
    }

    pub fn at(&self, kind: SyntaxKind) -> bool {
        self.peek_kind() == kind
    }

    pub fn at_word(&self, word: &str) -> bool {
        self.nth_is_word(0, word)
    }

    pub fn nth_is_word(&self, n: usize, word: &str) -> bool {
        self.nth(n).is_some_and(|t| t.is_word(word))
    }

    /// Offset of the current token, or of the end of the last token at EOF.
    pub fn offset(&self) -> TextSize {
        match self.peek() {
            Some(t) => t.offset,
            None => self.prev_end(),
        }
    }

    /// End offset of the most recently consumed token.
    pub fn prev_end(&self) -> TextSize {
        if self.pos == 0 {
            return TextSize::from(0);
        }
        self.tokens
            .get(self.pos - 1)
            .map_or(TextSize::from(0), |t| t.end())
    }

    pub fn bump(&mut self) -> Option<&'t Token<'a>> {
        let tok = self.peek()?;
        self.pos += 1;
        Some(tok)
    }

    pub fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn eat_word(&mut self, word: &str) -> bool {
        if self.at_word(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// At `=`, or at a `>=` whose `>` closed the angle group before it.
    pub fn at_eq(&self) -> bool {
        matches!(self.peek_kind(), SyntaxKind::EQ | SyntaxKind::GT_EQ)
    }

    /// Consume an `=` as [`at_eq`](Self::at_eq) sees it.
    pub fn eat_eq(&mut self) -> bool {
        if self.at_eq() {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Index of the bracket that closes the one at `open` (paren, square or
    /// angle), or `None` if it is unbalanced before the limit. A `>=` closes
    /// an outermost angle group as `>` followed by `=`.
    pub fn matching_close(&self, open: usize) -> Option<usize> {
        let (open_kind, close_kind) = match self.tokens.get(open)?.kind {
            SyntaxKind::L_PAREN => (SyntaxKind::L_PAREN, SyntaxKind::R_PAREN),
            SyntaxKind::L_BRACKET => (SyntaxKind::L_BRACKET, SyntaxKind::R_BRACKET),
            SyntaxKind::LT => (SyntaxKind::LT, SyntaxKind::GT),
            _ => return None,
        };
        let mut depth = 0usize;
        for idx in open..self.limit {
            let kind = self.tokens[idx].kind;
            if kind == open_kind {
                depth += 1;
            } else if kind == close_kind {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            } else if open_kind == SyntaxKind::LT && kind == SyntaxKind::GT_EQ && depth == 1 {
                return Some(idx);
            } else if open_kind == SyntaxKind::LT
                && matches!(kind, SyntaxKind::ASSIGN | SyntaxKind::BEGIN_KW | SyntaxKind::END_KW)
            {
                return None;
            }
        }
        None
    }

    /// Skip a balanced bracket group starting at the current token.
    /// Returns false (without moving) if the group is not closed.
    pub fn skip_group(&mut self) -> bool {
        match self.matching_close(self.pos) {
            Some(close) => {
                // a fused `>=` leaves its `=` half for the caller
                self.pos = if self.tokens[close].kind == SyntaxKind::GT_EQ { close } else { close + 1 };
                true
            }
            None => false,
        }
    }

    /// Advance past the next `;` at bracket depth 0, or to the limit.
    pub fn skip_past_semicolon(&mut self) {
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            match tok.kind {
                SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET => depth += 1,
                SyntaxKind::R_PAREN | SyntaxKind::R_BRACKET => depth = depth.saturating_sub(1),
                SyntaxKind::SEMICOLON if depth == 0 => {
                    self.pos += 1;
                    return;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    /// Range spanning the tokens `[from, to)`.
    pub fn range_of(&self, from: usize, to: usize) -> TextRange {
        let start = self.tokens.get(from).map_or(TextSize::from(0), |t| t.offset);
        let end = if to > from {
            self.tokens.get(to - 1).map_or(start, |t| t.end())
        } else {
            start
        };
        TextRange::new(start, end.max(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::significant_tokens;

    #[test]
    fn test_matching_close_nested() {
        let tokens = significant_tokens("(a, (b), c) d");
        let cursor = TokenCursor::new(&tokens);
        assert_eq!(cursor.matching_close(0), Some(8));
    }

    #[test]
    fn test_angle_group_closed_by_fused_gt_eq() {
        let tokens = significant_tokens("<T>= class");
        let mut cursor = TokenCursor::new(&tokens);
        assert_eq!(cursor.matching_close(0), Some(2));
        assert!(cursor.skip_group());
        assert!(cursor.eat_eq());
        assert!(cursor.at(SyntaxKind::CLASS_KW));
        // nested groups only close on a plain `>`
        let tokens = significant_tokens("<A<B>= C>");
        assert_eq!(TokenCursor::new(&tokens).matching_close(0), None);
    }

    #[test]
    fn test_skip_past_semicolon_respects_parens() {
        let tokens = significant_tokens("x = (1; 2); y");
        let mut cursor = TokenCursor::new(&tokens);
        cursor.skip_past_semicolon();
        assert!(cursor.peek().unwrap().is_word("y"));
    }

    #[test]
    fn test_limit_hides_tokens() {
        let tokens = significant_tokens("a b c");
        let mut cursor = TokenCursor::new(&tokens);
        cursor.set_limit(2);
        cursor.bump();
        cursor.bump();
        assert!(cursor.is_eof());
        assert!(cursor.peek().is_none());
    }
}
