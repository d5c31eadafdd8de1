//! Definition index — workspace-wide lookup over extracted skeletons.
//!
//! Each file's skeleton lives in one immutable `Arc` entry. Name postings
//! point at files rather than at record positions, so a replaced entry is
//! never reachable through a stale posting: a lookup re-filters the
//! records of every posted file. Replacement publishes postings
//! superset-first (new keys added, entry swapped, stale keys dropped).

use std::sync::Arc;

use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::base::{FileId, fold_name};

use super::records::{DefKind, DefinitionRecord, ScopedKey};
use super::skeleton::FileSkeleton;
use super::uses::UsesInfo;

type Postings<K> = FxHashMap<K, IndexSet<FileId>>;

/// Multi-key index of definition records.
#[derive(Clone, Debug, Default)]
pub struct DefinitionIndex {
    files: FxHashMap<FileId, Arc<FileSkeleton>>,
    /// Folded simple name → files declaring it.
    by_name: Postings<SmolStr>,
    /// Composite `unit|owner|name|kind` key → files declaring it.
    by_scoped: Postings<ScopedKey>,
    record_count: usize,
}

impl DefinitionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything known about `file` with `skeleton`.
    pub fn replace_file(&mut self, file: FileId, skeleton: impl Into<Arc<FileSkeleton>>) {
        let skeleton = skeleton.into();
        let (names, scoped) = keys_of(&skeleton);

        for name in &names {
            self.by_name.entry(name.clone()).or_default().insert(file);
        }
        for key in &scoped {
            self.by_scoped.entry(key.clone()).or_default().insert(file);
        }

        self.record_count += skeleton.records.len();
        let old = self.files.insert(file, skeleton);

        if let Some(old) = old {
            self.record_count -= old.records.len();
            let (old_names, old_scoped) = keys_of(&old);
            unpost(&mut self.by_name, old_names.difference(&names), file);
            unpost(&mut self.by_scoped, old_scoped.difference(&scoped), file);
        }

        tracing::debug!(
            "[INDEX] replaced {}: {} records, {} files indexed",
            file,
            self.files.get(&file).map_or(0, |s| s.records.len()),
            self.files.len()
        );
    }

    /// Drop a file and all its records. Returns whether it was indexed.
    pub fn remove_file(&mut self, file: FileId) -> bool {
        let Some(old) = self.files.remove(&file) else {
            return false;
        };
        self.record_count -= old.records.len();
        let (names, scoped) = keys_of(&old);
        unpost(&mut self.by_name, names.iter(), file);
        unpost(&mut self.by_scoped, scoped.iter(), file);
        tracing::debug!("[INDEX] removed {} ({} records)", file, old.records.len());
        true
    }

    /// Every record whose simple name matches, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Vec<&DefinitionRecord> {
        let Some(files) = self.by_name.get(&fold_name(name)) else {
            return Vec::new();
        };
        files
            .iter()
            .filter_map(|file| self.files.get(file))
            .flat_map(|skel| skel.records.iter().filter(|r| r.is_named(name)))
            .collect()
    }

    /// Records matching the composite `(unit, owner, name, kind)` key.
    pub fn find_scoped(
        &self,
        unit: &str,
        owner: Option<&str>,
        name: &str,
        kind: DefKind,
    ) -> Vec<&DefinitionRecord> {
        let key = ScopedKey::new(unit, owner, name, kind);
        let Some(files) = self.by_scoped.get(&key) else {
            return Vec::new();
        };
        files
            .iter()
            .filter_map(|file| self.files.get(file))
            .flat_map(|skel| skel.records.iter().filter(|r| r.scoped_key() == key))
            .collect()
    }

    pub fn skeleton(&self, file: FileId) -> Option<&Arc<FileSkeleton>> {
        self.files.get(&file)
    }

    pub fn records_in_file(&self, file: FileId) -> &[DefinitionRecord] {
        self.files.get(&file).map_or(&[], |s| s.records.as_slice())
    }

    pub fn file_uses(&self, file: FileId) -> Option<&UsesInfo> {
        self.files.get(&file).map(|s| &s.uses)
    }

    pub fn contains_file(&self, file: FileId) -> bool {
        self.files.contains_key(&file)
    }

    /// Indexed files in ascending id order.
    pub fn files(&self) -> Vec<FileId> {
        let mut files: Vec<_> = self.files.keys().copied().collect();
        files.sort_unstable();
        files
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.record_count
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}

fn keys_of(skeleton: &FileSkeleton) -> (FxHashSet<SmolStr>, FxHashSet<ScopedKey>) {
    let names = skeleton.records.iter().map(|r| fold_name(&r.name)).collect();
    let scoped = skeleton.records.iter().map(|r| r.scoped_key()).collect();
    (names, scoped)
}

fn unpost<'k, K>(postings: &mut Postings<K>, keys: impl Iterator<Item = &'k K>, file: FileId)
where
    K: std::hash::Hash + Eq + 'k,
{
    for key in keys {
        if let Some(files) = postings.get_mut(key) {
            files.shift_remove(&file);
            if files.is_empty() {
                postings.remove(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::skeleton::extract;

    fn skel(file: u32, text: &str) -> FileSkeleton {
        extract(FileId::new(file), text, "Fallback")
    }

    const SHAPES: &str = "unit Shapes; interface type\n\
        TShape = class\n\
          FWidth: Integer;\n\
          procedure Draw;\n\
        end;\n\
        implementation\n\
        procedure TShape.Draw; begin end;\n\
        end.";

    #[test]
    fn test_find_by_name_is_case_insensitive() {
        let mut index = DefinitionIndex::new();
        index.replace_file(FileId::new(1), skel(1, SHAPES));

        let found = index.find_by_name("tshape");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "TShape");
        // declaration and implementation
        assert_eq!(index.find_by_name("DRAW").len(), 2);
    }

    #[test]
    fn test_find_scoped() {
        let mut index = DefinitionIndex::new();
        index.replace_file(FileId::new(1), skel(1, SHAPES));

        let found = index.find_scoped("SHAPES", Some("tshape"), "fwidth", DefKind::Variable);
        assert_eq!(found.len(), 1);
        assert!(index
            .find_scoped("Shapes", Some("TShape"), "FWidth", DefKind::Routine)
            .is_empty());
    }

    #[test]
    fn test_replace_drops_stale_names() {
        let mut index = DefinitionIndex::new();
        let file = FileId::new(1);
        index.replace_file(file, skel(1, SHAPES));
        index.replace_file(
            file,
            skel(1, "unit Shapes; interface type TCircle = class end; implementation end."),
        );

        assert!(index.find_by_name("TShape").is_empty());
        assert!(index.find_by_name("FWidth").is_empty());
        assert_eq!(index.find_by_name("TCircle").len(), 1);
        assert_eq!(index.len(), index.records_in_file(file).len());
        assert_eq!(index.file_count(), 1);
    }

    #[test]
    fn test_remove_file() {
        let mut index = DefinitionIndex::new();
        index.replace_file(FileId::new(1), skel(1, SHAPES));
        index.replace_file(
            FileId::new(2),
            skel(2, "unit Other; interface type TShape = record end; implementation end."),
        );
        assert_eq!(index.find_by_name("TShape").len(), 2);

        assert!(index.remove_file(FileId::new(1)));
        assert!(!index.remove_file(FileId::new(1)));
        let left = index.find_by_name("TShape");
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].unit, "Other");
        assert!(index.find_by_name("FWidth").is_empty());
        assert_eq!(index.files(), vec![FileId::new(2)]);
    }

    #[test]
    fn test_file_uses() {
        let mut index = DefinitionIndex::new();
        index.replace_file(
            FileId::new(3),
            skel(3, "unit A; interface uses B; implementation uses C; end."),
        );
        let uses = index.file_uses(FileId::new(3)).unwrap();
        assert_eq!(uses.interface_uses[0].name, "B");
        assert_eq!(uses.implementation_uses[0].name, "C");
        assert!(index.file_uses(FileId::new(4)).is_none());
    }
}
