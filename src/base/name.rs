//! Case-insensitive identifier handling.
//!
//! Object Pascal identifiers compare without regard to case, so every key
//! stored in an index goes through [`fold_name`] first.

use smol_str::SmolStr;

/// Fold a name to its lookup key.
///
/// ASCII names (the overwhelming majority) are lowered without allocating a
/// second buffer for short names; other names fall back to Unicode lowering.
pub fn fold_name(name: &str) -> SmolStr {
    if name.is_ascii() {
        if !name.bytes().any(|b| b.is_ascii_uppercase()) {
            return SmolStr::new(name);
        }
        return SmolStr::new(name.to_ascii_lowercase());
    }
    SmolStr::new(name.to_lowercase())
}

/// Compare two names case-insensitively.
pub fn names_eq(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    a.to_lowercase() == b.to_lowercase()
}

/// Strip generic arguments from a type name: `TList<Integer>` → `TList`,
/// `TDictionary<string, TList<T>>.TPair` → `TDictionary.TPair`.
pub fn strip_generic_args(name: &str) -> SmolStr {
    if !name.contains('<') {
        return SmolStr::new(name.trim());
    }
    let mut out = String::with_capacity(name.len());
    let mut depth = 0usize;
    for c in name.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 && !c.is_whitespace() => out.push(c),
            _ => {}
        }
    }
    SmolStr::new(out)
}
