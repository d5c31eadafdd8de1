//! Token layer for Object Pascal sources.
//!
//! The skeleton extractor never builds a syntax tree. It walks a flat
//! stream of significant tokens, so this module only provides:
//! - **logos** lexing into [`Token`]s tagged with a [`SyntaxKind`]
//! - case-insensitive reserved-word classification ([`keywords`])
//! - a [`TokenCursor`] with the lookahead helpers the extractor needs
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens with SyntaxKind (trivia included)
//!     ↓
//! significant_tokens → trivia dropped, keywords classified
//!     ↓
//! TokenCursor → skeleton extraction / uses scanning
//! ```

mod cursor;
pub mod keywords;
mod lexer;
mod syntax_kind;

pub use cursor::TokenCursor;
pub use lexer::{Lexer, Token, significant_tokens, tokenize};
pub use syntax_kind::SyntaxKind;

pub use text_size::{TextRange, TextSize};
