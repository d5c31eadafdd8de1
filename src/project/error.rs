//! Error types for project loading and persistence.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from reading sources, descriptors and index snapshots.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// IO error while reading or writing `path`.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A project descriptor could not be read or is malformed.
    #[error("Invalid descriptor {}: {message}", path.display())]
    Descriptor { path: PathBuf, message: String },

    /// A snapshot written by a build with another record layout.
    #[error("Snapshot schema version {found} does not match {expected}")]
    SchemaMismatch { found: u32, expected: u32 },

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ProjectError {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn descriptor(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Descriptor {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}

#[cfg(feature = "persistence")]
impl From<serde_json::Error> for ProjectError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
