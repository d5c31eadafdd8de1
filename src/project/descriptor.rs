//! Project descriptors: the consumed shape of `.dproj`-style project files.
//!
//! Concrete readers live outside the crate. They hand over a
//! [`ProjectDescriptor`] per file through a [`DescriptorSource`];
//! [`flatten`] merges a root descriptor with every nested one it reaches.

use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};

use super::error::ProjectError;

/// What a project descriptor contributes to activation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectDescriptor {
    /// Descriptor file location; relative entries resolve against its directory.
    pub path: Option<PathBuf>,
    /// Source files the project names explicitly.
    pub explicit_file_references: Vec<PathBuf>,
    /// Directories searched (non-recursively) for units.
    pub search_paths: Vec<PathBuf>,
    /// Further descriptors whose contents are merged in.
    pub nested_descriptors: Vec<PathBuf>,
}

impl ProjectDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file_references.push(path.into());
        self
    }

    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    pub fn with_nested(mut self, path: impl Into<PathBuf>) -> Self {
        self.nested_descriptors.push(path.into());
        self
    }

    fn resolve(&self, entry: &Path) -> PathBuf {
        match self.path.as_deref().and_then(Path::parent) {
            Some(dir) if entry.is_relative() => dir.join(entry),
            _ => entry.to_path_buf(),
        }
    }
}

/// Reads nested descriptors on demand.
pub trait DescriptorSource {
    fn read_descriptor(&self, path: &Path) -> Result<ProjectDescriptor, ProjectError>;
}

/// Descriptors held in memory, keyed by path.
#[derive(Clone, Debug, Default)]
pub struct MemoryDescriptors {
    descriptors: FxHashMap<PathBuf, ProjectDescriptor>,
}

impl MemoryDescriptors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `descriptor`, stored under its own path.
    pub fn insert(&mut self, descriptor: ProjectDescriptor) {
        let key = descriptor.path.clone().unwrap_or_default();
        self.descriptors.insert(key, descriptor);
    }
}

impl DescriptorSource for MemoryDescriptors {
    fn read_descriptor(&self, path: &Path) -> Result<ProjectDescriptor, ProjectError> {
        self.descriptors
            .get(path)
            .cloned()
            .ok_or_else(|| ProjectError::descriptor(path, "unknown descriptor"))
    }
}

/// A source with no nested descriptors at all.
impl DescriptorSource for () {
    fn read_descriptor(&self, path: &Path) -> Result<ProjectDescriptor, ProjectError> {
        Err(ProjectError::descriptor(path, "nested descriptors are not supported"))
    }
}

/// A root descriptor merged with all reachable nested descriptors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlatProject {
    pub files: Vec<PathBuf>,
    pub search_paths: Vec<PathBuf>,
    /// Every descriptor file that contributed, for change tracking.
    pub descriptor_files: Vec<PathBuf>,
}

impl FlatProject {
    /// Whether a change to `path` affects the project structure.
    pub fn tracks(&self, path: &Path) -> bool {
        self.descriptor_files.iter().any(|p| p == path)
    }
}

/// Merge `root` and its nested descriptors, depth first.
///
/// A descriptor reached twice is merged once. Unreadable nested
/// descriptors are skipped with a warning.
pub fn flatten(root: &ProjectDescriptor, source: &dyn DescriptorSource) -> FlatProject {
    let mut flat = FlatProject::default();
    let mut seen_files = FxHashSet::default();
    let mut seen_search = FxHashSet::default();
    let mut visited: FxHashSet<PathBuf> = FxHashSet::default();
    if let Some(path) = &root.path {
        visited.insert(path.clone());
        flat.descriptor_files.push(path.clone());
    }

    let mut stack = vec![root.clone()];
    while let Some(descriptor) = stack.pop() {
        for file in &descriptor.explicit_file_references {
            let file = descriptor.resolve(file);
            if seen_files.insert(file.clone()) {
                flat.files.push(file);
            }
        }
        for dir in &descriptor.search_paths {
            let dir = descriptor.resolve(dir);
            if seen_search.insert(dir.clone()) {
                flat.search_paths.push(dir);
            }
        }
        // reversed so the first nested descriptor is merged first
        for nested in descriptor.nested_descriptors.iter().rev() {
            let nested = descriptor.resolve(nested);
            if !visited.insert(nested.clone()) {
                tracing::trace!("[DESCRIPTOR] {} already merged", nested.display());
                continue;
            }
            match source.read_descriptor(&nested) {
                Ok(mut child) => {
                    child.path.get_or_insert_with(|| nested.clone());
                    flat.descriptor_files.push(nested);
                    stack.push(child);
                }
                Err(err) => tracing::warn!("[DESCRIPTOR] skipping {}: {}", nested.display(), err),
            }
        }
    }
    flat
}
