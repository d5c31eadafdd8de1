//! Virtual file system: path interning plus an in-memory overlay.
//!
//! Every path the host hears about gets a [`FileId`] that stays valid for
//! the session. Reads prefer the overlay (unsaved editor buffers) and fall
//! back to the disk.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};

use super::error::ProjectError;
use crate::base::FileId;

#[derive(Clone, Debug, Default)]
pub struct Vfs {
    paths: IndexSet<PathBuf>,
    overlay: FxHashMap<FileId, Arc<str>>,
    /// Files removed by the host; reads fail until text is set again.
    removed: FxHashSet<FileId>,
}

impl Vfs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `path`, returning its id.
    pub fn intern(&mut self, path: &Path) -> FileId {
        let (idx, _) = self.paths.insert_full(normalize(path));
        FileId::new(idx as u32)
    }

    /// Id of an already interned path.
    pub fn lookup(&self, path: &Path) -> Option<FileId> {
        self.paths.get_index_of(&normalize(path)).map(|idx| FileId::new(idx as u32))
    }

    pub fn path(&self, file: FileId) -> Option<&Path> {
        self.paths.get_index(file.index() as usize).map(PathBuf::as_path)
    }

    /// Set the in-memory text of `file`.
    pub fn set_overlay(&mut self, file: FileId, text: impl Into<Arc<str>>) {
        self.removed.remove(&file);
        self.overlay.insert(file, text.into());
    }

    pub fn overlay(&self, file: FileId) -> Option<&Arc<str>> {
        self.overlay.get(&file)
    }

    /// Drop `file`'s overlay and hide it from reads.
    pub fn remove(&mut self, file: FileId) {
        self.overlay.remove(&file);
        self.removed.insert(file);
    }

    pub fn is_removed(&self, file: FileId) -> bool {
        self.removed.contains(&file)
    }

    /// Current text of `file`: the overlay, else the disk contents.
    ///
    /// Sources in legacy code pages are read lossily rather than rejected.
    pub fn read(&self, file: FileId) -> Result<Arc<str>, ProjectError> {
        if let Some(text) = self.overlay.get(&file) {
            return Ok(text.clone());
        }
        let path = self
            .path(file)
            .ok_or_else(|| ProjectError::io(format!("{file}"), std::io::ErrorKind::NotFound.into()))?;
        if self.removed.contains(&file) {
            return Err(ProjectError::io(path, std::io::ErrorKind::NotFound.into()));
        }
        let bytes = fs::read(path).map_err(|e| ProjectError::io(path, e))?;
        Ok(Arc::from(String::from_utf8_lossy(&bytes).as_ref()))
    }

    /// All interned files in id order.
    pub fn files(&self) -> impl Iterator<Item = (FileId, &Path)> {
        self.paths
            .iter()
            .enumerate()
            .map(|(idx, path)| (FileId::new(idx as u32), path.as_path()))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Lexically clean a path: drop `.` components and fold `..` where possible.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
