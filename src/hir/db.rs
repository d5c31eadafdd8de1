//! Salsa database definition and queries.

use std::sync::Arc;

use crate::base::FileId;

use super::skeleton::{FileSkeleton, extract};

// ============================================================================
// INPUTS
// ============================================================================

/// Input: The raw text content of a file.
///
/// Set this explicitly when a file is opened, changed or activated.
#[salsa::input]
pub struct FileText {
    pub file: FileId,
    /// Unit name used when the file has no header (the file stem).
    #[return_ref]
    pub stem: String,
    #[return_ref]
    pub text: String,
}

// ============================================================================
// DATABASE
// ============================================================================

/// The root Salsa database for extraction.
///
/// Skeletons are memoized per file and invalidated when the file's
/// `FileText` changes, so re-activating an unchanged file is free.
#[salsa::db]
#[derive(Default, Clone)]
pub struct RootDatabase {
    storage: salsa::Storage<Self>,
}

#[salsa::db]
impl salsa::Database for RootDatabase {
    fn salsa_event(&self, _event: &dyn Fn() -> salsa::Event) {}
}

impl RootDatabase {
    /// Create a new, empty database.
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// TRACKED QUERIES
// ============================================================================

/// Extract the declaration skeleton of a file.
#[salsa::tracked]
pub fn file_skeleton(db: &dyn salsa::Database, file_text: FileText) -> Arc<FileSkeleton> {
    let file = file_text.file(db);
    Arc::new(extract(file, file_text.text(db), file_text.stem(db)))
}
