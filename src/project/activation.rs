//! Activation closure: which files are live for indexing.
//!
//! Starting from the roots and seeds, each file's uses clauses are scanned
//! (cheaply, see [`scan_uses`]) and every unit they name is resolved and
//! queued. Files never reached stay out of the index.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use tokio_util::sync::CancellationToken;

use super::file_loader::{self, Depth, is_source_path};
use super::vfs::Vfs;
use crate::base::FileId;
use crate::hir::{UnitResolver, UsesInfo, scan_uses};

/// Everything a closure run needs, owned so it can run off-thread.
#[derive(Clone, Debug, Default)]
pub struct ClosureInput {
    pub vfs: Vfs,
    /// Candidates registered, aliases configured.
    pub units: UnitResolver,
    /// Roots and seeds.
    pub starts: Vec<FileId>,
    /// Directories to register candidates from before the walk.
    pub search: Vec<(PathBuf, Depth)>,
}

/// One reached file, with the text it was scanned from.
#[derive(Clone, Debug)]
pub struct ActiveFile {
    pub path: PathBuf,
    pub text: Arc<str>,
    pub unit: SmolStr,
    pub uses: UsesInfo,
}

#[derive(Clone, Debug, Default)]
pub struct Closure {
    /// Reached files in breadth-first order.
    pub active: Vec<ActiveFile>,
    /// Known candidate sources that were not reached.
    pub inactive: Vec<PathBuf>,
    /// Uses edges that pointed back at an already processed file.
    pub revisits: usize,
    /// The search directories this run registered candidates from.
    pub scanned: Vec<(PathBuf, Depth)>,
}

impl Closure {
    pub fn is_active(&self, path: &Path) -> bool {
        self.active.iter().any(|f| f.path == path)
    }
}

/// Breadth-first closure from `input.starts`. Returns `None` when
/// `cancel` fires before the run completes.
pub fn compute_closure(input: ClosureInput, cancel: &CancellationToken) -> Option<Closure> {
    let ClosureInput {
        mut vfs,
        mut units,
        starts,
        search,
    } = input;
    register_candidates(&mut vfs, &mut units, &search, cancel)?;
    let mut processed: FxHashSet<FileId> = FxHashSet::default();
    let mut queue: VecDeque<FileId> = starts.into_iter().collect();
    let mut closure = Closure {
        scanned: search,
        ..Closure::default()
    };

    while let Some(file) = queue.pop_front() {
        if cancel.is_cancelled() {
            tracing::debug!("[ACTIVATION] cancelled after {} files", closure.active.len());
            return None;
        }
        if !processed.insert(file) {
            continue;
        }
        let Some(path) = vfs.path(file).map(Path::to_path_buf) else {
            continue;
        };
        let text = match vfs.read(file) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("[ACTIVATION] {}", err);
                continue;
            }
        };
        let uses = scan_uses(&text);
        let unit = uses.unit_name.clone().unwrap_or_else(|| stem(&path));
        units.set_declared(file, &unit);

        for entry in uses.all_uses() {
            let target = entry
                .in_path
                .as_deref()
                .and_then(|rel| resolve_in_path(&mut vfs, &mut units, &path, rel))
                .or_else(|| units.resolve(&entry.name));
            match target {
                Some(target) if processed.contains(&target) => {
                    closure.revisits += 1;
                    tracing::trace!("[ACTIVATION] {} -> {} already processed", unit, entry.name);
                }
                Some(target) => queue.push_back(target),
                None => tracing::trace!("[ACTIVATION] {} uses unknown unit {}", unit, entry.name),
            }
        }
        closure.active.push(ActiveFile { path, text, unit, uses });
    }

    closure.inactive = vfs
        .files()
        .filter(|(file, path)| !processed.contains(file) && !vfs.is_removed(*file) && is_source_path(path))
        .map(|(_, path)| path.to_path_buf())
        .collect();
    tracing::debug!(
        "[ACTIVATION] {} active, {} inactive, {} revisits",
        closure.active.len(),
        closure.inactive.len(),
        closure.revisits
    );
    Some(closure)
}

/// Register every source file under `dirs` as a unit candidate. `None`
/// when cancelled between directories.
fn register_candidates(
    vfs: &mut Vfs,
    units: &mut UnitResolver,
    dirs: &[(PathBuf, Depth)],
    cancel: &CancellationToken,
) -> Option<usize> {
    let mut found = 0usize;
    for (dir, depth) in dirs {
        if cancel.is_cancelled() {
            tracing::debug!("[ACTIVATION] cancelled while scanning {}", dir.display());
            return None;
        }
        match file_loader::collect_source_files(dir, *depth) {
            Ok(paths) => {
                for path in paths {
                    let file = vfs.intern(&path);
                    units.add_candidate(file, &path);
                    found += 1;
                }
            }
            Err(err) => tracing::warn!("[ACTIVATION] search path skipped: {}", err),
        }
    }
    if !dirs.is_empty() {
        tracing::debug!("[ACTIVATION] {} candidate files in {} directories", found, dirs.len());
    }
    Some(found)
}

/// `uses X in 'dir\X.pas'`: the quoted path, relative to the using file.
fn resolve_in_path(vfs: &mut Vfs, units: &mut UnitResolver, from: &Path, rel: &str) -> Option<FileId> {
    let rel = PathBuf::from(rel.replace('\\', "/"));
    let candidate = match from.parent() {
        Some(dir) if rel.is_relative() => dir.join(rel),
        _ => rel,
    };
    let known = vfs.lookup(&candidate).is_some_and(|f| vfs.overlay(f).is_some());
    if !known && !candidate.is_file() {
        return None;
    }
    let file = vfs.intern(&candidate);
    units.add_candidate(file, &candidate);
    Some(file)
}

fn stem(path: &Path) -> SmolStr {
    path.file_stem()
        .map(|s| SmolStr::new(s.to_string_lossy()))
        .unwrap_or_default()
}
