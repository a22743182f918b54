use crate::edit::Edit;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// An indivisible group of edits for one file.
///
/// During application either every edit in the change applies cleanly or
/// the whole change is rejected with the rest of its file. A change may
/// also carry whole-file `use` lines to insert, not tied to any existing
/// range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicChange {
    file: PathBuf,
    edits: Vec<Edit>,
    use_inserts: Vec<String>,
}

impl AtomicChange {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            edits: Vec::new(),
            use_inserts: Vec::new(),
        }
    }

    /// Target file of this change.
    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn push_edit(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Request a `use` declaration at the top of the file. Stored as the
    /// bare path (`std::fmt`); the applicator renders and deduplicates.
    pub fn push_use_insert(&mut self, path: impl Into<String>) {
        self.use_inserts.push(path.into());
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn use_inserts(&self) -> &[String] {
        &self.use_inserts
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty() && self.use_inserts.is_empty()
    }
}

/// Accumulates atomic changes across all matches and files.
///
/// Pure aggregation: no deduplication or conflict detection happens here.
/// Overlap can only be judged once all changes for a file are known, so
/// conflict detection belongs to the applicator.
#[derive(Debug, Default)]
pub struct ChangeCollector {
    changes: Vec<AtomicChange>,
}

impl ChangeCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, change: AtomicChange) {
        self.changes.push(change);
    }

    pub fn extend(&mut self, changes: impl IntoIterator<Item = AtomicChange>) {
        self.changes.extend(changes);
    }

    /// All accumulated changes, in collection order.
    pub fn all_changes(&self) -> &[AtomicChange] {
        &self.changes
    }

    /// The set of distinct files referenced by any collected change.
    ///
    /// BTreeSet so callers iterating the registry see a deterministic
    /// order even though application order must not matter.
    pub fn files_touched(&self) -> BTreeSet<PathBuf> {
        self.changes.iter().map(|c| c.file.clone()).collect()
    }

    /// All changes targeting one file, in collection order.
    pub fn changes_for(&self, file: &Path) -> Vec<&AtomicChange> {
        self.changes.iter().filter(|c| c.file == file).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(file: &str, start: usize, end: usize) -> AtomicChange {
        let mut c = AtomicChange::new(file);
        c.push_edit(Edit::new(start, end, "x", ""));
        c
    }

    #[test]
    fn files_touched_deduplicates() {
        let mut collector = ChangeCollector::new();
        collector.add(change("a.rs", 0, 1));
        collector.add(change("b.rs", 0, 1));
        collector.add(change("a.rs", 5, 6));

        let files = collector.files_touched();
        assert_eq!(files.len(), 2);
        assert!(files.contains(Path::new("a.rs")));
        assert!(files.contains(Path::new("b.rs")));
    }

    #[test]
    fn changes_for_filters_by_file() {
        let mut collector = ChangeCollector::new();
        collector.add(change("a.rs", 0, 1));
        collector.add(change("b.rs", 0, 1));
        collector.add(change("a.rs", 5, 6));

        assert_eq!(collector.changes_for(Path::new("a.rs")).len(), 2);
        assert_eq!(collector.changes_for(Path::new("b.rs")).len(), 1);
    }

    #[test]
    fn collector_preserves_order() {
        let mut collector = ChangeCollector::new();
        collector.add(change("a.rs", 5, 6));
        collector.add(change("a.rs", 0, 1));

        let changes = collector.all_changes();
        assert_eq!(changes[0].edits()[0].byte_start, 5);
        assert_eq!(changes[1].edits()[0].byte_start, 0);
    }

    #[test]
    fn empty_change_reports_empty() {
        let mut c = AtomicChange::new("a.rs");
        assert!(c.is_empty());
        c.push_use_insert("std::fmt");
        assert!(!c.is_empty());
    }
}
