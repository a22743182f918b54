//! Match engine: traverses a source model and turns rule matches into
//! atomic changes.

use crate::change::AtomicChange;
use crate::model::SourceModel;
use crate::rule::Rule;

/// Counters for one run, reported alongside per-file outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Pattern matches found across all files.
    pub matches_found: usize,
    /// Matches that produced at least one edit.
    pub matches_rewritten: usize,
    /// Matches declined by their rule (no safe rewritten form).
    pub matches_skipped: usize,
    /// Total edits emitted.
    pub edits_emitted: usize,
}

impl MatchStats {
    pub fn merge(&mut self, other: MatchStats) {
        self.matches_found += other.matches_found;
        self.matches_rewritten += other.matches_rewritten;
        self.matches_skipped += other.matches_skipped;
        self.edits_emitted += other.edits_emitted;
    }
}

/// Evaluates rules against source models and accumulates statistics.
///
/// The engine only reads the model and only produces changes; nothing here
/// touches the file system.
pub struct MatchEngine<'a> {
    rules: &'a [Box<dyn Rule>],
    stats: MatchStats,
}

impl<'a> MatchEngine<'a> {
    pub fn new(rules: &'a [Box<dyn Rule>]) -> Self {
        Self {
            rules,
            stats: MatchStats::default(),
        }
    }

    /// Run every rule over every node of one model.
    ///
    /// Traversal is a full pre-order DFS; each productive match becomes
    /// its own [`AtomicChange`] scoped to the model's file. Unrelated
    /// matches in the same file are deliberately not merged; whether they
    /// interact is the applicator's question, answerable only with the
    /// whole file's change set.
    pub fn run(&mut self, model: &SourceModel) -> Vec<AtomicChange> {
        let mut changes = Vec::new();

        for node in model.nodes() {
            for rule in self.rules {
                let Some(binding) = rule.pattern().eval(model, &node) else {
                    continue;
                };
                self.stats.matches_found += 1;

                let edits = rule.generate_edits(model, &binding);
                if edits.is_empty() {
                    self.stats.matches_skipped += 1;
                    continue;
                }

                self.stats.matches_rewritten += 1;
                self.stats.edits_emitted += edits.len();

                let mut change = AtomicChange::new(model.file());
                for edit in edits {
                    change.push_edit(edit);
                }
                for insert in rule.use_inserts() {
                    change.push_use_insert(insert.clone());
                }
                changes.push(change);
            }
        }

        changes
    }

    pub fn stats(&self) -> MatchStats {
        self.stats
    }
}
