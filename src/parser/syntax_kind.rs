//! Token kinds produced by the lexer.

/// All token kinds in Object Pascal sources.
///
/// Reserved words get their own kind. Directives such as `read`, `private`
/// or `overload` are only reserved in context, so they stay `IDENT` and the
/// extractor checks their text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    WHITESPACE = 0,
    LINE_COMMENT,
    BLOCK_COMMENT,
    /// `{$IFDEF ...}` and friends
    DIRECTIVE,

    // =========================================================================
    // LITERALS
    // =========================================================================
    IDENT,
    NUMBER,
    /// `'text'` with `''` escapes
    STRING,
    /// `#13`, `#$0A`
    CHAR_CODE,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    L_PAREN,
    R_PAREN,
    L_BRACKET,
    R_BRACKET,
    SEMICOLON,
    COLON,
    COMMA,
    DOT,
    DOT_DOT,
    ASSIGN,
    EQ,
    NEQ,
    LT,
    GT,
    LT_EQ,
    GT_EQ,
    PLUS,
    MINUS,
    STAR,
    SLASH,
    CARET,
    AT,
    AMP,

    // =========================================================================
    // RESERVED WORDS
    // =========================================================================
    AND_KW,
    ARRAY_KW,
    AS_KW,
    ASM_KW,
    BEGIN_KW,
    CASE_KW,
    CLASS_KW,
    CONST_KW,
    CONSTRUCTOR_KW,
    DESTRUCTOR_KW,
    DISPINTERFACE_KW,
    DIV_KW,
    DO_KW,
    DOWNTO_KW,
    ELSE_KW,
    END_KW,
    EXCEPT_KW,
    EXPORTS_KW,
    FILE_KW,
    FINALIZATION_KW,
    FINALLY_KW,
    FOR_KW,
    FUNCTION_KW,
    GOTO_KW,
    IF_KW,
    IMPLEMENTATION_KW,
    IN_KW,
    INHERITED_KW,
    INITIALIZATION_KW,
    INLINE_KW,
    INTERFACE_KW,
    IS_KW,
    LABEL_KW,
    LIBRARY_KW,
    MOD_KW,
    NIL_KW,
    NOT_KW,
    OBJECT_KW,
    OF_KW,
    OR_KW,
    PACKED_KW,
    PROCEDURE_KW,
    PROGRAM_KW,
    PROPERTY_KW,
    RAISE_KW,
    RECORD_KW,
    REPEAT_KW,
    RESOURCESTRING_KW,
    SET_KW,
    SHL_KW,
    SHR_KW,
    STRING_KW,
    THEN_KW,
    THREADVAR_KW,
    TO_KW,
    TRY_KW,
    TYPE_KW,
    UNIT_KW,
    UNTIL_KW,
    USES_KW,
    VAR_KW,
    WHILE_KW,
    WITH_KW,
    XOR_KW,

    // =========================================================================
    // SPECIAL
    // =========================================================================
    ERROR,
    EOF,
}

impl SyntaxKind {
    /// Check if this is a trivia token (whitespace, comment, directive).
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::WHITESPACE
                | SyntaxKind::LINE_COMMENT
                | SyntaxKind::BLOCK_COMMENT
                | SyntaxKind::DIRECTIVE
        )
    }

    /// Check if this is a reserved word.
    pub fn is_keyword(self) -> bool {
        (self as u16) >= (SyntaxKind::AND_KW as u16) && (self as u16) <= (SyntaxKind::XOR_KW as u16)
    }

    /// Check if this is a literal.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::NUMBER | SyntaxKind::STRING | SyntaxKind::CHAR_CODE
        )
    }

    /// Tokens that start a routine heading.
    pub fn is_routine_kw(self) -> bool {
        matches!(
            self,
            SyntaxKind::PROCEDURE_KW
                | SyntaxKind::FUNCTION_KW
                | SyntaxKind::CONSTRUCTOR_KW
                | SyntaxKind::DESTRUCTOR_KW
        )
    }

    /// Tokens that open a statement block closed by `end`.
    pub fn opens_block(self) -> bool {
        matches!(
            self,
            SyntaxKind::BEGIN_KW | SyntaxKind::TRY_KW | SyntaxKind::CASE_KW | SyntaxKind::ASM_KW
        )
    }
}
