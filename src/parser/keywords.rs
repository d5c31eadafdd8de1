//! Reserved-word and directive tables.
//!
//! Object Pascal is case-insensitive, so classification lowers the token
//! text once and matches against the lowered spelling.

use super::SyntaxKind;

/// Classify an identifier-shaped word as a reserved word, or `IDENT`.
pub fn classify_word(text: &str) -> SyntaxKind {
    // Reserved words are at most 14 bytes ("implementation") and ASCII.
    if text.len() > 14 || !text.is_ascii() {
        return SyntaxKind::IDENT;
    }
    let mut buf = [0u8; 14];
    let lower = &mut buf[..text.len()];
    lower.copy_from_slice(text.as_bytes());
    lower.make_ascii_lowercase();
    match &*lower {
        b"and" => SyntaxKind::AND_KW,
        b"array" => SyntaxKind::ARRAY_KW,
        b"as" => SyntaxKind::AS_KW,
        b"asm" => SyntaxKind::ASM_KW,
        b"begin" => SyntaxKind::BEGIN_KW,
        b"case" => SyntaxKind::CASE_KW,
        b"class" => SyntaxKind::CLASS_KW,
        b"const" => SyntaxKind::CONST_KW,
        b"constructor" => SyntaxKind::CONSTRUCTOR_KW,
        b"destructor" => SyntaxKind::DESTRUCTOR_KW,
        b"dispinterface" => SyntaxKind::DISPINTERFACE_KW,
        b"div" => SyntaxKind::DIV_KW,
        b"do" => SyntaxKind::DO_KW,
        b"downto" => SyntaxKind::DOWNTO_KW,
        b"else" => SyntaxKind::ELSE_KW,
        b"end" => SyntaxKind::END_KW,
        b"except" => SyntaxKind::EXCEPT_KW,
        b"exports" => SyntaxKind::EXPORTS_KW,
        b"file" => SyntaxKind::FILE_KW,
        b"finalization" => SyntaxKind::FINALIZATION_KW,
        b"finally" => SyntaxKind::FINALLY_KW,
        b"for" => SyntaxKind::FOR_KW,
        b"function" => SyntaxKind::FUNCTION_KW,
        b"goto" => SyntaxKind::GOTO_KW,
        b"if" => SyntaxKind::IF_KW,
        b"implementation" => SyntaxKind::IMPLEMENTATION_KW,
        b"in" => SyntaxKind::IN_KW,
        b"inherited" => SyntaxKind::INHERITED_KW,
        b"initialization" => SyntaxKind::INITIALIZATION_KW,
        b"inline" => SyntaxKind::INLINE_KW,
        b"interface" => SyntaxKind::INTERFACE_KW,
        b"is" => SyntaxKind::IS_KW,
        b"label" => SyntaxKind::LABEL_KW,
        b"library" => SyntaxKind::LIBRARY_KW,
        b"mod" => SyntaxKind::MOD_KW,
        b"nil" => SyntaxKind::NIL_KW,
        b"not" => SyntaxKind::NOT_KW,
        b"object" => SyntaxKind::OBJECT_KW,
        b"of" => SyntaxKind::OF_KW,
        b"or" => SyntaxKind::OR_KW,
        b"packed" => SyntaxKind::PACKED_KW,
        b"procedure" => SyntaxKind::PROCEDURE_KW,
        b"program" => SyntaxKind::PROGRAM_KW,
        b"property" => SyntaxKind::PROPERTY_KW,
        b"raise" => SyntaxKind::RAISE_KW,
        b"record" => SyntaxKind::RECORD_KW,
        b"repeat" => SyntaxKind::REPEAT_KW,
        b"resourcestring" => SyntaxKind::RESOURCESTRING_KW,
        b"set" => SyntaxKind::SET_KW,
        b"shl" => SyntaxKind::SHL_KW,
        b"shr" => SyntaxKind::SHR_KW,
        b"string" => SyntaxKind::STRING_KW,
        b"then" => SyntaxKind::THEN_KW,
        b"threadvar" => SyntaxKind::THREADVAR_KW,
        b"to" => SyntaxKind::TO_KW,
        b"try" => SyntaxKind::TRY_KW,
        b"type" => SyntaxKind::TYPE_KW,
        b"unit" => SyntaxKind::UNIT_KW,
        b"until" => SyntaxKind::UNTIL_KW,
        b"uses" => SyntaxKind::USES_KW,
        b"var" => SyntaxKind::VAR_KW,
        b"while" => SyntaxKind::WHILE_KW,
        b"with" => SyntaxKind::WITH_KW,
        b"xor" => SyntaxKind::XOR_KW,
        _ => SyntaxKind::IDENT,
    }
}

/// Routine directives that may follow a heading, each terminated by `;`.
pub const ROUTINE_DIRECTIVES: &[&str] = &[
    "abstract",
    "assembler",
    "cdecl",
    "deprecated",
    "dispid",
    "dynamic",
    "experimental",
    "export",
    "external",
    "far",
    "final",
    "forward",
    "inline",
    "library",
    "local",
    "message",
    "near",
    "overload",
    "override",
    "pascal",
    "platform",
    "register",
    "reintroduce",
    "safecall",
    "static",
    "stdcall",
    "unsafe",
    "varargs",
    "virtual",
    "winapi",
];

/// Calling-convention and hint directives allowed after a procedural type.
pub const TYPE_DIRECTIVES: &[&str] = &[
    "cdecl",
    "deprecated",
    "experimental",
    "pascal",
    "platform",
    "register",
    "safecall",
    "stdcall",
    "winapi",
];

/// Member visibility words inside class and record bodies.
pub const VISIBILITY_WORDS: &[&str] = &["private", "protected", "public", "published", "automated"];

/// Property specifiers that are followed by a value.
pub const PROPERTY_SPECIFIERS: &[&str] = &[
    "read",
    "write",
    "stored",
    "default",
    "nodefault",
    "index",
    "implements",
    "dispid",
    "readonly",
    "writeonly",
];

/// Check `text` against a lowered word table.
pub fn is_one_of(text: &str, table: &[&str]) -> bool {
    table.iter().any(|w| w.eq_ignore_ascii_case(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_reserved_words_any_case() {
        assert_eq!(classify_word("begin"), SyntaxKind::BEGIN_KW);
        assert_eq!(classify_word("BEGIN"), SyntaxKind::BEGIN_KW);
        assert_eq!(classify_word("Implementation"), SyntaxKind::IMPLEMENTATION_KW);
    }

    #[test]
    fn test_directives_stay_identifiers() {
        assert_eq!(classify_word("read"), SyntaxKind::IDENT);
        assert_eq!(classify_word("private"), SyntaxKind::IDENT);
        assert_eq!(classify_word("overload"), SyntaxKind::IDENT);
        assert_eq!(classify_word("implementations"), SyntaxKind::IDENT);
    }

    #[test]
    fn test_is_one_of() {
        assert!(is_one_of("Override", ROUTINE_DIRECTIVES));
        assert!(!is_one_of("begin", ROUTINE_DIRECTIVES));
    }
}
