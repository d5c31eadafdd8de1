//! Source text positions and ranges.

use std::fmt;

pub use text_size::{TextRange, TextSize};

/// A 0-based line and byte column. Displays 1-based, as `line:col`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct LineCol {
    pub line: u32,
    /// UTF-8 bytes from the line start.
    pub col: u32,
}

impl LineCol {
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

/// Line start offsets of one text, for diagnostic positions.
#[derive(Clone, Debug)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let breaks = text
            .bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(i, _)| TextSize::from(i as u32 + 1));
        Self {
            line_starts: std::iter::once(TextSize::from(0)).chain(breaks).collect(),
        }
    }

    /// Position of `offset`; offsets past the text land on the last line.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let line = self.line_starts.partition_point(|&start| start <= offset).saturating_sub(1);
        let col = offset - self.line_starts[line];
        LineCol::new(line as u32, col.into())
    }
}
