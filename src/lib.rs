//! ast-rewriter: structural source rewriting engine for Rust
//!
//! Scans parsed source files for syntactic patterns, computes the text
//! edits a rewrite rule implies, and applies the accumulated edits back
//! onto the original files without touching unrelated text.
//!
//! # Architecture
//!
//! The pipeline runs in two phases, strictly separated:
//!
//! 1. **Match**: every file is parsed into a read-only [`SourceModel`];
//!    the [`MatchEngine`] evaluates each rule's pattern at every node and
//!    collects the resulting [`AtomicChange`]s into a [`ChangeCollector`].
//! 2. **Apply**: per file, all changes are merged, checked for overlap,
//!    spliced into rewritten text in one pass, and persisted atomically.
//!
//! Nothing is written until matching completes everywhere, which is what
//! keeps files independent, makes conflicts detectable, and turns dry-run
//! into a pure function over the same data.
//!
//! # Safety
//!
//! - Edits carry their expected before-text and are verified pre-splice
//! - Overlapping edits reject the whole file, never a partial rewrite
//! - Atomic file writes (tempfile + fsync + rename)
//! - Rewrite-root boundary enforcement
//!
//! # Example
//!
//! ```no_run
//! use ast_rewriter::{
//!     apply_all, ApplyMode, ChangeCollector, DerefArgRule, MatchEngine, Rule, SourceModel,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rules: Vec<Box<dyn Rule>> = vec![Box::new(DerefArgRule::new("take", 0))];
//! let mut engine = MatchEngine::new(&rules);
//! let mut collector = ChangeCollector::new();
//!
//! let model = SourceModel::from_path("src/main.rs")?;
//! collector.extend(engine.run(&model));
//!
//! for outcome in apply_all(&collector, ApplyMode::Write) {
//!     println!("{outcome:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod apply;
pub mod cache;
pub mod change;
pub mod config;
pub mod edit;
pub mod engine;
pub mod model;
pub mod pattern;
pub mod report;
pub mod rule;
pub mod safety;
pub mod validate;

// Re-exports
pub use apply::{apply, apply_all, apply_file, ApplyError, ApplyMode, FileOutcome};
pub use change::{AtomicChange, ChangeCollector};
pub use config::{load_from_path, load_from_str, ConfigError, RuleSet, RuleSpec};
pub use edit::{Edit, EditError, EditVerification};
pub use engine::{MatchEngine, MatchStats};
pub use model::{ArgForm, ModelError, SourceModel};
pub use pattern::{BoundNode, MatchBinding, Pred};
pub use report::{FileReport, FileStatus, RunReport};
pub use rule::{DerefArgRule, RenameCallRule, Rule};
pub use safety::{RootGuard, SafetyError};
pub use validate::{SyntaxChecker, SyntaxError, ValidateError};
