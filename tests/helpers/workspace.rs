//! On-disk workspaces and hosts seeded from them.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use unitscope::TextSize;
use unitscope::base::FileId;
use unitscope::ide::AnalysisHost;
use unitscope::project::WorkspaceConfig;

/// A temporary directory populated with source files.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Write `files` (relative path, text) into a fresh directory.
    pub fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let ws = Self { dir };
        for (name, text) in files {
            ws.write(name, text);
        }
        ws
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, text: &str) {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(path, text).expect("write source");
    }

    /// A manual-mode host with `seeds` marked as open, already refreshed.
    pub fn host(&self, seeds: &[&str]) -> AnalysisHost {
        self.host_with(WorkspaceConfig::default(), seeds)
    }

    pub fn host_with(&self, config: WorkspaceConfig, seeds: &[&str]) -> AnalysisHost {
        let mut host = AnalysisHost::with_config(config);
        for seed in seeds {
            host.mark_seed(self.path(seed));
        }
        host.refresh();
        host
    }

    /// Id of `name` in `host`; panics if the host never saw the file.
    pub fn file(&self, host: &AnalysisHost, name: &str) -> FileId {
        host.file_id(self.path(name))
            .unwrap_or_else(|| panic!("{name} is not known to the host"))
    }
}

/// Offset of the `nth` occurrence (0-based) of `needle` in `text`.
pub fn offset_of(text: &str, needle: &str, nth: usize) -> TextSize {
    let pos = text
        .match_indices(needle)
        .nth(nth)
        .map(|(i, _)| i)
        .unwrap_or_else(|| panic!("{needle:?} #{nth} not found"));
    TextSize::from(pos as u32)
}
