//! Source file discovery on disk.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::error::ProjectError;
use crate::base::constants::{is_root_extension, is_source_extension};

/// How deep to look below a directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Depth {
    /// Only the directory's own files (compiler search paths).
    Shallow,
    Recursive,
}

/// Collect Object Pascal sources under `dir`, sorted.
///
/// Unreadable entries below `dir` are skipped; only a missing or unreadable
/// `dir` itself is an error.
pub fn collect_source_files(dir: &Path, depth: Depth) -> Result<Vec<PathBuf>, ProjectError> {
    std::fs::metadata(dir).map_err(|e| ProjectError::io(dir, e))?;
    let walker = match depth {
        Depth::Shallow => WalkDir::new(dir).max_depth(1),
        Depth::Recursive => WalkDir::new(dir),
    };
    let mut files: Vec<PathBuf> = walker
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!("[LOADER] skipping entry under {}: {}", dir.display(), err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_source_path(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    Ok(files)
}

/// Whether `path` has a source extension.
pub fn is_source_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(is_source_extension)
}

/// Whether `path` is a program, library or package root.
pub fn is_root_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(is_root_extension)
}
