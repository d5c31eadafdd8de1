//! Warm-restart snapshots of the definition index.
//!
//! File ids are session-local, so a snapshot keys every skeleton by path
//! and by a hash of the text it was extracted from. Loading re-keys the
//! records to the ids of the new session; the host then reuses a skeleton
//! only for a file that is active and whose text still hashes the same.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::ProjectError;
use crate::base::FileId;
use crate::hir::{DefinitionIndex, FileSkeleton, SCHEMA_VERSION};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub schema_version: u32,
    pub files: Vec<SnapshotFile>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub path: PathBuf,
    pub text_hash: u64,
    pub skeleton: FileSkeleton,
}

/// Just the version tag, read before the full payload.
#[derive(Deserialize)]
struct VersionProbe {
    schema_version: u32,
}

impl IndexSnapshot {
    /// Capture every indexed file for which `entry_of` gives a path and
    /// text hash.
    pub fn capture<'p>(index: &DefinitionIndex, entry_of: impl Fn(FileId) -> Option<(&'p Path, u64)>) -> Self {
        let files = index
            .files()
            .into_iter()
            .filter_map(|file| {
                let (path, text_hash) = entry_of(file)?;
                let skeleton = index.skeleton(file)?;
                Some(SnapshotFile {
                    path: path.to_path_buf(),
                    text_hash,
                    skeleton: FileSkeleton::clone(skeleton),
                })
            })
            .collect();
        Self {
            schema_version: SCHEMA_VERSION,
            files,
        }
    }

    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a snapshot, rejecting other schema versions.
    pub fn from_json(text: &str) -> Result<Self, ProjectError> {
        let probe: VersionProbe = serde_json::from_str(text)?;
        if probe.schema_version != SCHEMA_VERSION {
            return Err(ProjectError::SchemaMismatch {
                found: probe.schema_version,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(serde_json::from_str(text)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|e| ProjectError::io(path, e))
    }

    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let text = fs::read_to_string(path).map_err(|e| ProjectError::io(path, e))?;
        Self::from_json(&text)
    }

    /// Files of the snapshot for which `file_of` returns an id, with their
    /// records re-keyed to that id.
    pub fn rekey(self, mut file_of: impl FnMut(&Path) -> Option<FileId>) -> Vec<(FileId, u64, FileSkeleton)> {
        self.files
            .into_iter()
            .filter_map(|entry| {
                let file = file_of(&entry.path)?;
                let mut skeleton = entry.skeleton;
                for record in &mut skeleton.records {
                    record.file = file;
                }
                Some((file, entry.text_hash, skeleton))
            })
            .collect()
    }
}
