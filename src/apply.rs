//! Applicator: merges a file's atomic changes into rewritten text and
//! persists it.
//!
//! Application is strictly two-phase: every change for every file is
//! collected before the first byte is written. That separation is what
//! makes per-file independence and conflict detection tractable, and it
//! makes dry-run a pure function of the same data.

use crate::change::{AtomicChange, ChangeCollector};
use crate::edit::{Edit, EditError};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApplyError {
    /// Two edits for the same file overlap. Unrecoverable for that file:
    /// the caller must split the offending rules and re-run.
    #[error(
        "conflicting edits: [{first_start}, {first_end}) overlaps [{second_start}, {second_end})"
    )]
    ConflictingEdits {
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },

    /// An edit failed range or before-text validation against the
    /// original text.
    #[error(transparent)]
    Edit(#[from] EditError),

    /// The file could not be read, or the rewrite could not be written.
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Whether to persist rewritten text or only compute outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    Write,
    DryRun,
}

/// Terminal state of one file after application.
///
/// A file starts pending and ends in exactly one of these; there are no
/// retries. Conflicted and IoFailed files keep their original content so
/// the caller can fix the cause and re-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Applied { file: PathBuf, edits_applied: usize },
    Conflicted { file: PathBuf, reason: String },
    IoFailed { file: PathBuf, reason: String },
}

impl FileOutcome {
    pub fn file(&self) -> &Path {
        match self {
            FileOutcome::Applied { file, .. }
            | FileOutcome::Conflicted { file, .. }
            | FileOutcome::IoFailed { file, .. } => file,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, FileOutcome::Applied { .. })
    }
}

/// Merge all changes for one file into its rewritten text.
///
/// Pure: consumes original text and changes, produces new text or the
/// reason the whole file is rejected. Edits are validated and sorted by
/// start offset, checked pairwise for overlap, then replayed in one
/// ascending pass: untouched spans copied verbatim, each replacement
/// spliced in place of its range. Replaced regions are never re-scanned.
pub fn apply(original: &str, changes: &[&AtomicChange]) -> Result<String, ApplyError> {
    let mut edits: Vec<&Edit> = changes
        .iter()
        .flat_map(|c| c.edits().iter())
        .filter(|e| !e.is_noop())
        .collect();

    // Whole-file use insertions become one zero-width edit at offset 0,
    // deduplicated across changes and dropped when already present.
    let insert_edit = use_insert_edit(original, changes);
    if let Some(edit) = &insert_edit {
        edits.push(edit);
    }

    for edit in &edits {
        edit.check(original)?;
    }

    edits.sort_by_key(|e| (e.byte_start, e.byte_end));

    for pair in edits.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.byte_end > b.byte_start {
            return Err(ApplyError::ConflictingEdits {
                first_start: a.byte_start,
                first_end: a.byte_end,
                second_start: b.byte_start,
                second_end: b.byte_end,
            });
        }
    }

    let grown: usize = edits.iter().map(|e| e.new_text.len()).sum();
    let mut out = String::with_capacity(original.len() + grown);
    let mut cursor = 0;
    for edit in &edits {
        out.push_str(&original[cursor..edit.byte_start]);
        out.push_str(&edit.new_text);
        cursor = edit.byte_end;
    }
    out.push_str(&original[cursor..]);

    Ok(out)
}

/// Collapse the use insertions of all changes into one edit at offset 0.
fn use_insert_edit(original: &str, changes: &[&AtomicChange]) -> Option<Edit> {
    let mut seen = BTreeSet::new();
    let mut lines = String::new();

    for change in changes {
        for path in change.use_inserts() {
            let line = format!("use {path};");
            if !seen.insert(line.clone()) || original.contains(&line) {
                continue;
            }
            lines.push_str(&line);
            lines.push('\n');
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(Edit::insert(0, lines))
    }
}

/// Apply all changes targeting one file and persist the result.
///
/// Never leaves a partial rewrite behind: the file either ends with the
/// full rewritten text or its original content.
pub fn apply_file(path: &Path, changes: &[&AtomicChange], mode: ApplyMode) -> FileOutcome {
    let original = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(source) => {
            return FileOutcome::IoFailed {
                file: path.to_path_buf(),
                reason: source.to_string(),
            }
        }
    };

    let new_text = match apply(&original, changes) {
        Ok(text) => text,
        Err(err @ ApplyError::Io { .. }) => {
            return FileOutcome::IoFailed {
                file: path.to_path_buf(),
                reason: err.to_string(),
            }
        }
        Err(err) => {
            return FileOutcome::Conflicted {
                file: path.to_path_buf(),
                reason: err.to_string(),
            }
        }
    };

    let edits_applied = changes.iter().map(|c| c.edits().len()).sum();

    if mode == ApplyMode::Write && new_text != original {
        if let Err(err) = persist(path, new_text.as_bytes()) {
            return FileOutcome::IoFailed {
                file: path.to_path_buf(),
                reason: err.to_string(),
            };
        }
    }

    FileOutcome::Applied {
        file: path.to_path_buf(),
        edits_applied,
    }
}

/// Apply every collected change, file by file.
///
/// Files are an unordered batch: one file's conflict or I/O failure is
/// recorded in its own outcome and the rest of the batch proceeds.
pub fn apply_all(collector: &ChangeCollector, mode: ApplyMode) -> Vec<FileOutcome> {
    collector
        .files_touched()
        .iter()
        .map(|path| apply_file(path, &collector.changes_for(path), mode))
        .collect()
}

/// Atomic file write: tempfile in the same directory + fsync + rename,
/// then an mtime bump so incremental builds notice the change.
fn persist(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent")
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    filetime::set_file_mtime(path, filetime::FileTime::now())?;
    Ok(())
}
