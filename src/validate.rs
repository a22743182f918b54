//! Post-rewrite validation.
//!
//! The applicator never reformats or second-guesses rewritten text, but a
//! driver can ask whether a rewrite introduced syntax damage: re-parse
//! with tree-sitter and diff ERROR nodes against the original. Files that
//! were already broken stay reportable without blaming the rewrite.

use ast_grep_language::LanguageExt;
use thiserror::Error;
use tree_sitter::{Parser, Tree};

#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("failed to initialize the Rust grammar")]
    LanguageSet,

    #[error("parse returned no tree")]
    ParseFailed,
}

/// Location of an ERROR or MISSING node in a parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub byte_start: usize,
    pub byte_end: usize,
    pub line: usize,
    pub column: usize,
}

/// Re-parses rewritten text and reports introduced syntax errors.
pub struct SyntaxChecker {
    parser: Parser,
}

impl SyntaxChecker {
    pub fn new() -> Result<Self, ValidateError> {
        let mut parser = Parser::new();
        let language = ast_grep_language::SupportLang::Rust.get_ts_language();
        parser
            .set_language(&language)
            .map_err(|_| ValidateError::LanguageSet)?;
        Ok(Self { parser })
    }

    fn parse(&mut self, source: &str) -> Result<Tree, ValidateError> {
        self.parser
            .parse(source, None)
            .ok_or(ValidateError::ParseFailed)
    }

    /// All ERROR/MISSING nodes in `source`.
    pub fn syntax_errors(&mut self, source: &str) -> Result<Vec<SyntaxError>, ValidateError> {
        let tree = self.parse(source)?;
        let mut errors = Vec::new();
        collect_errors(tree.root_node(), &mut errors);
        Ok(errors)
    }

    /// Syntax errors present in `rewritten` but not in `original`.
    ///
    /// Compared by error count rather than position: every edit shifts
    /// byte offsets, so positions in the two trees do not line up.
    pub fn introduced_errors(
        &mut self,
        original: &str,
        rewritten: &str,
    ) -> Result<Vec<SyntaxError>, ValidateError> {
        let before = self.syntax_errors(original)?.len();
        let after = self.syntax_errors(rewritten)?;
        if after.len() > before {
            Ok(after)
        } else {
            Ok(Vec::new())
        }
    }
}

/// Check that a generated snippet parses as a Rust expression.
///
/// Rules call this before emitting an edit so a bad replacement becomes a
/// silent skip instead of a corrupted file.
pub fn expr_parses(snippet: &str) -> bool {
    syn::parse_str::<syn::Expr>(snippet).is_ok()
}

fn collect_errors(node: tree_sitter::Node<'_>, errors: &mut Vec<SyntaxError>) {
    if node.is_error() || node.is_missing() {
        let point = node.start_position();
        errors.push(SyntaxError {
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            line: point.row,
            column: point.column,
        });
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_errors(child, errors);
    }
}
