//! AnalysisHost and Analysis: session state and query snapshots.
//!
//! The `AnalysisHost` owns all mutable state: the file overlay, the
//! extraction database, the definition index, the unit resolver and the
//! activation bookkeeping. `Analysis` is a borrowed snapshot for queries,
//! so every query in a batch sees the same index.
//!
//! ## Usage
//!
//! ```ignore
//! let mut host = AnalysisHost::new();
//! host.add_root("/proj/App.dpr");
//! host.mark_seed("/proj/Unit2.pas");
//!
//! let analysis = host.analysis();
//! let file = analysis.file_id("/proj/Unit2.pas").unwrap();
//! let result = analysis.resolve("TThing", file, offset);
//! ```

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexSet;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use salsa::Setter;
use smol_str::SmolStr;
use text_size::TextSize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::base::{FileId, fold_name, names_eq};
use crate::hir::{
    ChainResult, DefKind, DefinitionIndex, DefinitionRecord, Diagnostic, FileSkeleton, FileText, NamePosition,
    ResolveResult, Resolver, RootDatabase, UnitResolver, UsesInfo, check_file, extract, file_skeleton, scan_uses,
};
use crate::project::file_loader::Depth;
use crate::project::{
    ActivationScheduler, Closure, ClosureInput, DescriptorSource, FlatProject, ProjectDescriptor, Vfs,
    WorkspaceConfig, compute_closure, flatten,
};
#[cfg(feature = "persistence")]
use crate::project::{IndexSnapshot, ProjectError};

use super::goto::{GotoResult, goto_definition};

/// Owns all mutable state for one session.
///
/// Edits to active files are re-extracted and swapped into the index
/// immediately. Changes that can move the activation closure (project
/// structure, configuration, seeds, uses clauses) mark it stale; it is
/// recomputed by [`refresh`](Self::refresh), synchronously in manual mode or
/// on the background scheduler.
pub struct AnalysisHost {
    session: Uuid,
    vfs: Vfs,
    db: RootDatabase,
    inputs: FxHashMap<FileId, FileText>,
    index: DefinitionIndex,
    /// Hash of the text each indexed file was extracted from.
    hashes: FxHashMap<FileId, u64>,
    units: UnitResolver,
    config: WorkspaceConfig,
    descriptor: Option<ProjectDescriptor>,
    project: FlatProject,
    project_roots: IndexSet<FileId>,
    roots: IndexSet<FileId>,
    seeds: IndexSet<FileId>,
    active: FxHashSet<FileId>,
    inactive: FxHashSet<FileId>,
    /// Skeletons loaded from a snapshot, waiting for their file to activate.
    restored: FxHashMap<FileId, (u64, Arc<FileSkeleton>)>,
    scheduler: Option<ActivationScheduler>,
    candidates_dirty: bool,
    activation_dirty: bool,
}

impl Default for AnalysisHost {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisHost {
    /// A host whose activation closure runs synchronously in [`refresh`](Self::refresh).
    pub fn new() -> Self {
        Self::with_config(WorkspaceConfig::default())
    }

    pub fn with_config(config: WorkspaceConfig) -> Self {
        let mut units = UnitResolver::new();
        units.set_aliases(&config.scope_name_aliases);
        let session = Uuid::new_v4();
        tracing::debug!(session = %session, "[HOST] session started");
        Self {
            session,
            vfs: Vfs::new(),
            db: RootDatabase::new(),
            inputs: FxHashMap::default(),
            index: DefinitionIndex::new(),
            hashes: FxHashMap::default(),
            units,
            candidates_dirty: !config.extra_source_paths.is_empty(),
            config,
            descriptor: None,
            project: FlatProject::default(),
            project_roots: IndexSet::new(),
            roots: IndexSet::new(),
            seeds: IndexSet::new(),
            active: FxHashSet::default(),
            inactive: FxHashSet::default(),
            restored: FxHashMap::default(),
            scheduler: None,
            activation_dirty: false,
        }
    }

    /// A host that computes activation closures on a background worker,
    /// debounced by `config.debounce`.
    pub fn with_background_activation(config: WorkspaceConfig) -> Self {
        let mut host = Self::with_config(config);
        host.scheduler = Some(ActivationScheduler::new(host.config.debounce));
        host
    }

    pub fn session_id(&self) -> Uuid {
        self.session
    }

    // ------------------------------------------------------------------------
    // Changes
    // ------------------------------------------------------------------------

    /// Mark a file as open or edited. Seeds are always active and their
    /// directory is searched for units.
    pub fn mark_seed(&mut self, path: impl AsRef<Path>) -> FileId {
        let file = self.register(path.as_ref());
        if self.seeds.insert(file) {
            self.candidates_dirty = true;
            self.invalidate_activation();
        }
        file
    }

    /// Set the in-memory text of a file.
    pub fn set_file_text(&mut self, path: impl AsRef<Path>, text: impl Into<Arc<str>>) -> FileId {
        let path = path.as_ref();
        let known = self.vfs.lookup(path).is_some_and(|f| !self.vfs.is_removed(f));
        let file = self.register(path);
        let text: Arc<str> = text.into();
        self.vfs.set_overlay(file, text.clone());

        if !self.active.contains(&file) {
            if !known {
                self.invalidate_activation();
            }
            return file;
        }
        let old = self.index.skeleton(file).cloned();
        let new = self.reindex(file, &text);
        let structure_changed = old.is_none_or(|old| {
            !names_eq(&old.unit, &new.unit) || uses_names(&old.uses) != uses_names(&new.uses)
        });
        if structure_changed {
            tracing::debug!(session = %self.session, "[HOST] uses of {} changed", file);
            self.invalidate_activation();
        }
        file
    }

    /// Forget a file: its overlay, its records and its root or seed status.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) -> bool {
        let Some(file) = self.vfs.lookup(path.as_ref()) else {
            return false;
        };
        self.vfs.remove(file);
        self.index.remove_file(file);
        self.hashes.remove(&file);
        self.units.remove_file(file);
        self.seeds.shift_remove(&file);
        self.roots.shift_remove(&file);
        self.project_roots.shift_remove(&file);
        self.active.remove(&file);
        self.inactive.remove(&file);
        self.invalidate_activation();
        true
    }

    /// Replace the project descriptor. Its explicit file references become
    /// roots; its search paths are scanned for candidate units.
    pub fn set_project(&mut self, descriptor: ProjectDescriptor, source: &dyn DescriptorSource) {
        self.project = flatten(&descriptor, source);
        self.descriptor = Some(descriptor);
        self.project_roots.clear();
        for path in self.project.files.clone() {
            let file = self.register(&path);
            self.project_roots.insert(file);
        }
        tracing::debug!(
            session = %self.session,
            "[HOST] project: {} files, {} search paths",
            self.project.files.len(),
            self.project.search_paths.len()
        );
        self.candidates_dirty = true;
        self.invalidate_activation();
    }

    /// Re-read the current descriptor after one of its files changed.
    pub fn reload_project(&mut self, source: &dyn DescriptorSource) {
        if let Some(descriptor) = self.descriptor.clone() {
            self.set_project(descriptor, source);
        }
    }

    /// Whether `path` is a descriptor file the current project was built from.
    pub fn is_tracked_descriptor(&self, path: &Path) -> bool {
        self.project.tracks(path)
    }

    /// Add a compilation root; its directory becomes a search directory.
    pub fn add_root(&mut self, path: impl AsRef<Path>) -> FileId {
        let file = self.register(path.as_ref());
        if self.roots.insert(file) {
            self.candidates_dirty = true;
            self.invalidate_activation();
        }
        file
    }

    pub fn set_config(&mut self, config: WorkspaceConfig) {
        if config == self.config {
            return;
        }
        self.units.set_aliases(&config.scope_name_aliases);
        if config.extra_source_paths != self.config.extra_source_paths {
            self.candidates_dirty = true;
        }
        if config.debounce != self.config.debounce && self.scheduler.is_some() {
            self.scheduler = Some(ActivationScheduler::new(config.debounce));
        }
        self.config = config;
        self.invalidate_activation();
    }

    /// Bring activation up to date. In manual mode this computes the
    /// closure now; with a background scheduler it applies a finished run.
    pub fn refresh(&mut self) {
        if self.scheduler.is_some() {
            if self.activation_dirty {
                self.schedule();
            }
            let finished = self.scheduler.as_ref().and_then(ActivationScheduler::take_result);
            if let Some(closure) = finished {
                self.apply_closure(closure);
            }
            return;
        }
        if !self.activation_dirty && !self.candidates_dirty {
            return;
        }
        if let Some(closure) = compute_closure(self.closure_input(), &CancellationToken::new()) {
            self.apply_closure(closure);
        }
        self.activation_dirty = false;
    }

    /// Wait for background activation to go idle, then apply its result.
    /// Returns `false` on timeout.
    pub fn wait_for_activation(&mut self, timeout: Duration) -> bool {
        if self.scheduler.is_none() {
            self.refresh();
            return true;
        }
        if self.activation_dirty {
            self.schedule();
        }
        let idle = self.scheduler.as_ref().is_none_or(|s| s.wait_idle(timeout));
        self.refresh();
        idle
    }

    /// Get a consistent snapshot for querying, refreshing first.
    pub fn analysis(&mut self) -> Analysis<'_> {
        self.refresh();
        Analysis {
            index: &self.index,
            units: &self.units,
            vfs: &self.vfs,
            implicit_units: &self.config.implicit_units,
            active: &self.active,
            inactive: &self.inactive,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn file_id(&self, path: impl AsRef<Path>) -> Option<FileId> {
        self.vfs.lookup(path.as_ref())
    }

    pub fn file_path(&self, file: FileId) -> Option<&Path> {
        self.vfs.path(file)
    }

    pub fn is_active(&self, file: FileId) -> bool {
        self.active.contains(&file)
    }

    /// Active files in id order.
    pub fn active_files(&self) -> Vec<FileId> {
        let mut files: Vec<FileId> = self.active.iter().copied().collect();
        files.sort();
        files
    }

    pub fn index(&self) -> &DefinitionIndex {
        &self.index
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Number of background activation runs started.
    pub fn activation_runs(&self) -> usize {
        self.scheduler.as_ref().map_or(0, ActivationScheduler::runs)
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Write the index to `path` as a JSON snapshot.
    #[cfg(feature = "persistence")]
    pub fn save_index(&self, path: &Path) -> Result<(), ProjectError> {
        let snapshot = IndexSnapshot::capture(&self.index, |file| {
            Some((self.vfs.path(file)?, *self.hashes.get(&file)?))
        });
        snapshot.save(path)?;
        tracing::debug!(session = %self.session, "[HOST] saved {} files to {}", snapshot.files.len(), path.display());
        Ok(())
    }

    /// Load a snapshot written by [`save_index`](Self::save_index).
    ///
    /// A restored skeleton is used only once its file is active and its
    /// text is unchanged; the rest is dropped by the next activation.
    /// Returns the number of skeletons applied or kept for activation.
    #[cfg(feature = "persistence")]
    pub fn load_index(&mut self, path: &Path) -> Result<usize, ProjectError> {
        let snapshot = IndexSnapshot::load(path)?;
        let vfs = &mut self.vfs;
        let restored = snapshot.rekey(|p| Some(vfs.intern(p)));
        for (file, hash, skeleton) in restored {
            self.restored.insert(file, (hash, Arc::new(skeleton)));
        }

        let mut applied = 0;
        for file in self.active_files() {
            let Some((hash, skeleton)) = self.restored.remove(&file) else {
                continue;
            };
            let Ok(text) = self.vfs.read(file) else { continue };
            if hash_text(&text) == hash {
                self.install(file, hash, skeleton);
                applied += 1;
            }
        }
        if !self.activation_dirty && !self.active.is_empty() {
            self.restored.clear();
        }
        let kept = applied + self.restored.len();
        tracing::debug!(session = %self.session, "[HOST] restored {} files from {}", kept, path.display());
        Ok(kept)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn register(&mut self, path: &Path) -> FileId {
        let file = self.vfs.intern(path);
        self.units.add_candidate(file, path);
        file
    }

    fn invalidate_activation(&mut self) {
        self.activation_dirty = true;
        if self.scheduler.is_some() {
            self.schedule();
        }
    }

    /// Hand a closure request to the background scheduler.
    fn schedule(&mut self) {
        let input = self.closure_input();
        if let Some(scheduler) = &self.scheduler {
            tracing::trace!(session = %self.session, "[HOST] activation triggered");
            scheduler.trigger(input);
        }
        self.activation_dirty = false;
    }

    fn closure_input(&self) -> ClosureInput {
        let starts = self
            .project_roots
            .iter()
            .chain(&self.roots)
            .chain(&self.seeds)
            .copied()
            .filter(|f| !self.vfs.is_removed(*f))
            .collect::<IndexSet<FileId>>()
            .into_iter()
            .collect();
        // the directory walk happens inside the run, off this thread in
        // background mode
        let search = if self.candidates_dirty { self.search_dirs() } else { Vec::new() };
        ClosureInput {
            vfs: self.vfs.clone(),
            units: self.units.clone(),
            starts,
            search,
        }
    }

    /// Directories candidates are registered from: those of the roots and
    /// seeds, the project search paths, and the extra source paths.
    fn search_dirs(&self) -> Vec<(PathBuf, Depth)> {
        let mut dirs: IndexSet<(PathBuf, Depth)> = IndexSet::new();
        let root_dirs = self
            .project_roots
            .iter()
            .chain(&self.roots)
            .chain(&self.seeds)
            .filter_map(|f| self.vfs.path(*f).and_then(Path::parent).map(Path::to_path_buf))
            .collect::<Vec<_>>();
        dirs.extend(root_dirs.into_iter().map(|d| (d, Depth::Shallow)));
        dirs.extend(self.project.search_paths.iter().cloned().map(|d| (d, Depth::Shallow)));
        dirs.extend(self.config.extra_source_paths.iter().cloned().map(|d| (d, Depth::Recursive)));
        dirs.into_iter().collect()
    }

    /// Make `closure` the active set: index newly active or changed files,
    /// drop deactivated ones.
    fn apply_closure(&mut self, closure: Closure) {
        let mut next_active: FxHashSet<FileId> = FxHashSet::default();
        let mut to_extract: Vec<(FileId, Arc<str>, SmolStr)> = Vec::new();

        for active in closure.active {
            let file = self.register(&active.path);
            next_active.insert(file);
            // an edit may postdate the closure's read
            let text = self.vfs.overlay(file).cloned().unwrap_or(active.text);
            let hash = hash_text(&text);
            if self.index.contains_file(file) && self.hashes.get(&file) == Some(&hash) {
                continue;
            }
            if let Some((restored_hash, skeleton)) = self.restored.remove(&file) {
                if restored_hash == hash {
                    self.install(file, hash, skeleton);
                    continue;
                }
            }
            let memoized = self.inputs.get(&file).is_some_and(|input| **input.text(&self.db) == *text);
            if memoized {
                self.reindex(file, &text);
                continue;
            }
            to_extract.push((file, text, stem_of(&active.path)));
        }

        let extracted: Vec<(FileId, Arc<str>, FileSkeleton)> = to_extract
            .into_par_iter()
            .map(|(file, text, stem)| {
                let skeleton = extract(file, &text, &stem);
                (file, text, skeleton)
            })
            .collect();
        let extracted_count = extracted.len();
        for (file, text, skeleton) in extracted {
            self.text_input(file, &text);
            self.install(file, hash_text(&text), Arc::new(skeleton));
        }

        let deactivated: Vec<FileId> = self.active.difference(&next_active).copied().collect();
        for file in &deactivated {
            self.index.remove_file(*file);
            self.hashes.remove(file);
        }
        let inactive = closure.inactive.iter().map(|p| self.register(p)).collect();
        // a run scanned with directories that have since changed leaves
        // the candidates stale
        if self.candidates_dirty && closure.scanned == self.search_dirs() {
            self.candidates_dirty = false;
        }

        tracing::debug!(
            session = %self.session,
            "[HOST] activation applied: {} active ({} extracted), {} deactivated, {} inactive",
            next_active.len(),
            extracted_count,
            deactivated.len(),
            closure.inactive.len()
        );
        self.active = next_active;
        self.inactive = inactive;
        self.restored.clear();
    }

    /// Re-extract `file` through the database and swap it into the index.
    fn reindex(&mut self, file: FileId, text: &Arc<str>) -> Arc<FileSkeleton> {
        let input = self.text_input(file, text);
        let skeleton = file_skeleton(&self.db, input);
        self.install(file, hash_text(text), skeleton.clone());
        skeleton
    }

    fn install(&mut self, file: FileId, hash: u64, skeleton: Arc<FileSkeleton>) {
        self.units.set_declared(file, &skeleton.unit);
        self.index.replace_file(file, skeleton);
        self.hashes.insert(file, hash);
    }

    /// The database input for `file`, created or updated to `text`.
    fn text_input(&mut self, file: FileId, text: &str) -> FileText {
        if let Some(input) = self.inputs.get(&file).copied() {
            if input.text(&self.db) != text {
                input.set_text(&mut self.db).to(text.to_string());
            }
            return input;
        }
        let stem = self.vfs.path(file).map(stem_of).unwrap_or_default();
        let input = FileText::new(&self.db, file, stem.to_string(), text.to_string());
        self.inputs.insert(file, input);
        input
    }
}

fn hash_text(text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    text.hash(&mut hasher);
    hasher.finish()
}

fn stem_of(path: &Path) -> SmolStr {
    path.file_stem()
        .map(|s| SmolStr::new(s.to_string_lossy()))
        .unwrap_or_default()
}

fn uses_names(uses: &UsesInfo) -> Vec<SmolStr> {
    uses.all_uses().map(|e| fold_name(&e.name)).collect()
}

// ============================================================================
// ANALYSIS SNAPSHOT
// ============================================================================

/// A consistent snapshot for queries. Pure reads only.
#[derive(Clone, Copy)]
pub struct Analysis<'a> {
    index: &'a DefinitionIndex,
    units: &'a UnitResolver,
    vfs: &'a Vfs,
    implicit_units: &'a [SmolStr],
    active: &'a FxHashSet<FileId>,
    inactive: &'a FxHashSet<FileId>,
}

impl<'a> Analysis<'a> {
    pub fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.index, self.units, self.implicit_units)
    }

    pub fn resolve(&self, name: &str, file: FileId, offset: TextSize) -> ResolveResult {
        self.resolver().resolve(name, file, offset)
    }

    pub fn resolve_at(&self, name: &str, file: FileId, offset: TextSize, position: NamePosition) -> ResolveResult {
        self.resolver().resolve_at(name, file, offset, position)
    }

    pub fn resolve_chain<S: AsRef<str>>(&self, segments: &[S], file: FileId, offset: TextSize) -> ChainResult {
        self.resolver().resolve_chain(segments, file, offset)
    }

    /// Every indexed declaration named `name`, case-insensitively.
    pub fn find_all_by_name(&self, name: &str) -> Vec<&'a DefinitionRecord> {
        self.index.find_by_name(name)
    }

    /// Like [`find_all_by_name`](Self::find_all_by_name); when no active
    /// file declares `name`, the referenced-but-inactive files are
    /// extracted on the fly and searched instead.
    pub fn find_all_by_name_or_inactive(&self, name: &str) -> Vec<DefinitionRecord> {
        let found = self.index.find_by_name(name);
        if !found.is_empty() {
            return found.into_iter().cloned().collect();
        }
        let mut inactive: Vec<FileId> = self.inactive.iter().copied().collect();
        inactive.sort();
        inactive
            .par_iter()
            .flat_map_iter(|file| {
                let records = match (self.vfs.read(*file), self.vfs.path(*file)) {
                    (Ok(text), Some(path)) => extract(*file, &text, &stem_of(path)).records,
                    _ => Vec::new(),
                };
                records.into_iter().filter(move |r| r.is_named(name))
            })
            .collect()
    }

    pub fn find_scoped(&self, unit: &str, owner: Option<&str>, name: &str, kind: DefKind) -> Vec<&'a DefinitionRecord> {
        self.index.find_scoped(unit, owner, name, kind)
    }

    /// Uses analysis of `file`: from the index when active, else a fresh scan.
    pub fn parse_uses(&self, file: FileId) -> Option<UsesInfo> {
        if let Some(uses) = self.index.file_uses(file) {
            return Some(uses.clone());
        }
        self.vfs.read(file).ok().map(|text| scan_uses(&text))
    }

    pub fn is_active(&self, file: FileId) -> bool {
        self.active.contains(&file)
    }

    /// Whether `file` is a known source that activation did not reach.
    pub fn is_inactive(&self, file: FileId) -> bool {
        self.inactive.contains(&file)
    }

    pub fn goto_definition(&self, file: FileId, offset: TextSize) -> GotoResult {
        match self.vfs.read(file) {
            Ok(text) => goto_definition(&self.resolver(), file, &text, offset),
            Err(_) => GotoResult::empty(),
        }
    }

    /// Ambiguity, missing-uses and recovery diagnostics of an active file.
    pub fn file_diagnostics(&self, file: FileId) -> Vec<Diagnostic> {
        let Some(skeleton) = self.index.skeleton(file) else {
            return Vec::new();
        };
        match self.vfs.read(file) {
            Ok(text) => check_file(&self.resolver(), file, skeleton, &text),
            Err(err) => {
                tracing::debug!("[ANALYSIS] no text for diagnostics: {}", err);
                Vec::new()
            }
        }
    }

    pub fn file_id(&self, path: impl AsRef<Path>) -> Option<FileId> {
        self.vfs.lookup(path.as_ref())
    }

    pub fn file_path(&self, file: FileId) -> Option<&'a Path> {
        self.vfs.path(file)
    }

    pub fn index(&self) -> &'a DefinitionIndex {
        self.index
    }
}
