//! Source model: the immutable parsed view of one input file.
//!
//! Wraps an ast-grep tree over the Rust grammar and exposes exactly what
//! the match engine and rules consume: node traversal, node-to-byte-range
//! mapping, and kind/field introspection. Parsing itself is delegated to
//! ast-grep/tree-sitter; nothing in the core mutates the tree.

pub mod form;

pub use form::ArgForm;

use ast_grep_core::tree_sitter::StrDoc;
use ast_grep_core::AstGrep;
use ast_grep_language::SupportLang;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A node in the parsed tree of one source file.
pub type SgNode<'r> = ast_grep_core::Node<'r, StrDoc<SupportLang>>;

/// The language every model in this crate parses.
pub fn rust() -> SupportLang {
    SupportLang::Rust
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// An immutable parsed representation of one file plus its original text.
pub struct SourceModel {
    file: PathBuf,
    source: String,
    sg: AstGrep<StrDoc<SupportLang>>,
}

impl SourceModel {
    /// Parse source text already in memory.
    pub fn parse(file: impl Into<PathBuf>, source: &str) -> Self {
        let sg = AstGrep::new(source, rust());
        Self {
            file: file.into(),
            source: source.to_string(),
            sg,
        }
    }

    /// Read and parse a file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(path, &source))
    }

    /// The file this model was parsed from.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// The original, unmodified text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Root node of the tree.
    pub fn root(&self) -> SgNode<'_> {
        self.sg.root()
    }

    /// Every node of the tree in pre-order depth-first order.
    ///
    /// Traversal order beyond "depth-first" is unspecified; rules must not
    /// rely on it.
    pub fn nodes(&self) -> impl Iterator<Item = SgNode<'_>> {
        self.sg.root().dfs().collect::<Vec<_>>().into_iter()
    }

    /// Original text covered by a node.
    pub fn text_of(&self, node: &SgNode<'_>) -> &str {
        let range = node.range();
        &self.source[range.start..range.end]
    }

    /// Original text covered by a byte range.
    pub fn text_at(&self, byte_start: usize, byte_end: usize) -> &str {
        &self.source[byte_start..byte_end]
    }

    /// Find the node whose range is exactly `[byte_start, byte_end)`.
    ///
    /// Used by rules to get back from an owned binding to tree structure.
    pub fn node_at(&self, byte_start: usize, byte_end: usize) -> Option<SgNode<'_>> {
        self.sg
            .root()
            .dfs()
            .find(|n| n.range().start == byte_start && n.range().end == byte_end)
    }
}
