//! Per-run reporting: the sole observable contract exposed to a driver.

use crate::apply::FileOutcome;
use crate::engine::MatchStats;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Applied,
    Conflicted,
    IoFailed,
}

/// Outcome of one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: PathBuf,
    pub status: FileStatus,
    /// Edits applied (Applied); zero for a no-op file.
    pub edits: usize,
    /// Failure reason (Conflicted / IoFailed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<FileOutcome> for FileReport {
    fn from(outcome: FileOutcome) -> Self {
        match outcome {
            FileOutcome::Applied {
                file,
                edits_applied,
            } => FileReport {
                file,
                status: FileStatus::Applied,
                edits: edits_applied,
                reason: None,
            },
            FileOutcome::Conflicted { file, reason } => FileReport {
                file,
                status: FileStatus::Conflicted,
                edits: 0,
                reason: Some(reason),
            },
            FileOutcome::IoFailed { file, reason } => FileReport {
                file,
                status: FileStatus::IoFailed,
                edits: 0,
                reason: Some(reason),
            },
        }
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            FileStatus::Applied => {
                write!(f, "applied {} ({} edits)", self.file.display(), self.edits)
            }
            FileStatus::Conflicted => write!(
                f,
                "conflict in {}: {}",
                self.file.display(),
                self.reason.as_deref().unwrap_or("unknown")
            ),
            FileStatus::IoFailed => write!(
                f,
                "i/o failure on {}: {}",
                self.file.display(),
                self.reason.as_deref().unwrap_or("unknown")
            ),
        }
    }
}

/// Complete result of one run: every input file's outcome plus match
/// counters. Input files nothing targeted are reported as applied no-ops
/// so the caller always sees the full outcome set.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub files: Vec<FileReport>,
    pub matches_found: usize,
    pub matches_rewritten: usize,
    pub matches_skipped: usize,
    pub edits_emitted: usize,
}

impl RunReport {
    pub fn build(
        input_files: impl IntoIterator<Item = PathBuf>,
        outcomes: Vec<FileOutcome>,
        stats: MatchStats,
    ) -> Self {
        let mut files: Vec<FileReport> = outcomes.into_iter().map(FileReport::from).collect();

        for input in input_files {
            if !files.iter().any(|r| r.file == input) {
                files.push(FileReport {
                    file: input,
                    status: FileStatus::Applied,
                    edits: 0,
                    reason: None,
                });
            }
        }
        files.sort_by(|a, b| a.file.cmp(&b.file));

        RunReport {
            files,
            matches_found: stats.matches_found,
            matches_rewritten: stats.matches_rewritten,
            matches_skipped: stats.matches_skipped,
            edits_emitted: stats.edits_emitted,
        }
    }

    /// True when every file ended Applied.
    pub fn all_clean(&self) -> bool {
        self.files
            .iter()
            .all(|r| r.status == FileStatus::Applied)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            writeln!(f, "{file}")?;
        }
        write!(
            f,
            "{} matches, {} rewritten, {} skipped, {} edits",
            self.matches_found, self.matches_rewritten, self.matches_skipped, self.edits_emitted
        )
    }
}
