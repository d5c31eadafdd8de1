//! Unit name → file resolution.
//!
//! Names are matched first against the unit names declared by scanned
//! files, then against file stems of candidate files (so files that were
//! never scanned can still be found). Configured scope-name aliases widen
//! each lookup: with alias `System`, `SysUtils` also tries
//! `System.SysUtils`, and `System.SysUtils` also tries `SysUtils`.

use std::path::Path;

use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::{FileId, fold_name};

#[derive(Clone, Debug, Default)]
pub struct UnitResolver {
    /// Folded declared unit name → files declaring it, in scan order.
    declared: FxHashMap<SmolStr, IndexSet<FileId>>,
    declared_by_file: FxHashMap<FileId, SmolStr>,
    /// Folded file stem → candidate files with that stem.
    stems: FxHashMap<SmolStr, IndexSet<FileId>>,
    stem_by_file: FxHashMap<FileId, SmolStr>,
    aliases: Vec<SmolStr>,
}

impl UnitResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the scope-name aliases.
    pub fn set_aliases<I, S>(&mut self, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.aliases = aliases
            .into_iter()
            .map(|a| SmolStr::new(a.as_ref().trim_end_matches('.')))
            .filter(|a| !a.is_empty())
            .collect();
    }

    pub fn aliases(&self) -> &[SmolStr] {
        &self.aliases
    }

    /// Register a candidate file by its path's stem.
    pub fn add_candidate(&mut self, file: FileId, path: &Path) {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return;
        };
        let stem = fold_name(stem);
        if let Some(old) = self.stem_by_file.insert(file, stem.clone()) {
            remove_from(&mut self.stems, &old, file);
        }
        self.stems.entry(stem).or_default().insert(file);
    }

    /// Record the unit name a scanned file declares.
    pub fn set_declared(&mut self, file: FileId, unit: &str) {
        let unit = fold_name(unit);
        if self.declared_by_file.get(&file) == Some(&unit) {
            return;
        }
        if let Some(old) = self.declared_by_file.insert(file, unit.clone()) {
            remove_from(&mut self.declared, &old, file);
        }
        self.declared.entry(unit).or_default().insert(file);
    }

    pub fn remove_file(&mut self, file: FileId) {
        if let Some(old) = self.declared_by_file.remove(&file) {
            remove_from(&mut self.declared, &old, file);
        }
        if let Some(old) = self.stem_by_file.remove(&file) {
            remove_from(&mut self.stems, &old, file);
        }
    }

    /// Resolve a unit name as written in a uses clause.
    pub fn resolve(&self, unit_name: &str) -> Option<FileId> {
        let name = fold_name(unit_name.trim());
        if let Some(file) = self.lookup(&name) {
            return Some(file);
        }
        for alias in &self.aliases {
            let alias = fold_name(alias);
            let widened = SmolStr::new(format!("{}.{}", alias, name));
            if let Some(file) = self.lookup(&widened) {
                return Some(file);
            }
            let stripped = name
                .strip_prefix(alias.as_str())
                .and_then(|rest| rest.strip_prefix('.'));
            if let Some(file) = stripped.and_then(|rest| self.lookup(rest)) {
                return Some(file);
            }
        }
        None
    }

    /// Whether `unit_name` resolves to `file`, or is the name `file` declares.
    pub fn names_file(&self, unit_name: &str, file: FileId) -> bool {
        if self
            .declared_by_file
            .get(&file)
            .is_some_and(|declared| *declared == fold_name(unit_name))
        {
            return true;
        }
        self.resolve(unit_name) == Some(file)
    }

    fn lookup(&self, folded: &str) -> Option<FileId> {
        self.declared
            .get(folded)
            .and_then(|files| files.first())
            .or_else(|| self.stems.get(folded).and_then(|files| files.first()))
            .copied()
    }
}

fn remove_from(map: &mut FxHashMap<SmolStr, IndexSet<FileId>>, key: &SmolStr, file: FileId) {
    if let Some(files) = map.get_mut(key) {
        files.shift_remove(&file);
        if files.is_empty() {
            map.remove(key);
        }
    }
}
