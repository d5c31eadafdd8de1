//! Domain constants shared across the crate.

/// Source file extensions that hold units, programs, libraries or packages.
pub const SOURCE_EXTENSIONS: &[&str] = &["pas", "pp", "dpr", "dpk", "lpr"];

/// Extensions of files that are compilation roots rather than units.
pub const ROOT_EXTENSIONS: &[&str] = &["dpr", "dpk", "lpr"];

/// Units that are visible from every file without a uses clause.
pub const DEFAULT_IMPLICIT_UNITS: &[&str] = &["System"];

/// Upper bound on the number of tokens the uses-clause prefix scan examines.
///
/// Uses clauses sit near the top of a file; the scan normally stops much
/// earlier, on the first declaration after the last possible uses clause.
pub const USES_SCAN_TOKEN_LIMIT: usize = 200_000;

/// Default debounce for background activation rescans, in milliseconds.
pub const DEFAULT_ACTIVATION_DEBOUNCE_MS: u64 = 150;

/// Whether a path's extension marks it as a Pascal source file.
pub fn is_source_extension(ext: &str) -> bool {
    SOURCE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

/// Whether a path's extension marks it as a compilation root.
pub fn is_root_extension(ext: &str) -> bool {
    ROOT_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}
