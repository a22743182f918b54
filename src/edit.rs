use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// A single range-based text replacement against original source text.
///
/// The range is a half-open byte interval `[byte_start, byte_end)` computed
/// against the *original* unmodified text of one file. Edits are pure data:
/// merging them into rewritten text is the applicator's job.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "an Edit does nothing until the applicator consumes it"]
pub struct Edit {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// Replacement text for [byte_start, byte_end)
    pub new_text: String,
    /// What we expect to find at the range before splicing
    pub expected_before: EditVerification,
}

/// Verification strategy for the before-text of an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large spans)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("invalid byte range: [{byte_start}, {byte_end}) in text of length {text_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        text_len: usize,
    },

    #[error("before-text mismatch at [{byte_start}, {byte_end}): found {found:?}")]
    BeforeTextMismatch {
        byte_start: usize,
        byte_end: usize,
        found: String,
    },
}

impl Edit {
    /// Create an edit, recording the replaced text for later verification.
    pub fn new(
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: &str,
    ) -> Self {
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(expected_before),
        }
    }

    /// Create an insertion: zero-width edit at `offset`.
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self {
            byte_start: offset,
            byte_end: offset,
            new_text: text.into(),
            expected_before: EditVerification::ExactMatch(String::new()),
        }
    }

    /// True if this edit replaces nothing and inserts nothing.
    pub fn is_noop(&self) -> bool {
        self.byte_start == self.byte_end && self.new_text.is_empty()
    }

    /// Check this edit against the original text it was computed from.
    ///
    /// Verifies range bounds, char-boundary alignment, and the expected
    /// before-text. Returns the current text at the range on success.
    pub fn check<'a>(&self, original: &'a str) -> Result<&'a str, EditError> {
        if self.byte_start > self.byte_end
            || self.byte_end > original.len()
            || !original.is_char_boundary(self.byte_start)
            || !original.is_char_boundary(self.byte_end)
        {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                text_len: original.len(),
            });
        }

        let current = &original[self.byte_start..self.byte_end];
        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                found: current.to_string(),
            });
        }

        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_exact_match() {
        let verify = EditVerification::ExactMatch("hello world".to_string());
        assert!(verify.matches("hello world"));
        assert!(!verify.matches("hello"));
    }

    #[test]
    fn verification_hash() {
        let verify = EditVerification::Hash(xxh3_64(b"hello world"));
        assert!(verify.matches("hello world"));
        assert!(!verify.matches("goodbye world"));
    }

    #[test]
    fn verification_from_text_picks_strategy() {
        assert!(matches!(
            EditVerification::from_text("small"),
            EditVerification::ExactMatch(_)
        ));
        assert!(matches!(
            EditVerification::from_text(&"x".repeat(2000)),
            EditVerification::Hash(_)
        ));
    }

    #[test]
    fn check_rejects_out_of_bounds() {
        let edit = Edit::new(5, 20, "replacement", "");
        assert!(matches!(
            edit.check("hello world"),
            Err(EditError::InvalidByteRange { .. })
        ));
    }

    #[test]
    fn check_rejects_inverted_range() {
        let edit = Edit::new(10, 5, "replacement", "");
        assert!(matches!(
            edit.check("hello world"),
            Err(EditError::InvalidByteRange { .. })
        ));
    }

    #[test]
    fn check_rejects_split_char_boundary() {
        // 'é' is two bytes; offset 1 lands inside it
        let edit = Edit::new(1, 2, "x", "");
        assert!(matches!(
            edit.check("été"),
            Err(EditError::InvalidByteRange { .. })
        ));
    }

    #[test]
    fn check_rejects_stale_before_text() {
        let edit = Edit::new(0, 5, "HELLO", "howdy");
        assert!(matches!(
            edit.check("hello world"),
            Err(EditError::BeforeTextMismatch { .. })
        ));
    }

    #[test]
    fn check_returns_current_text() {
        let edit = Edit::new(0, 5, "HELLO", "hello");
        assert_eq!(edit.check("hello world").unwrap(), "hello");
    }

    #[test]
    fn insert_is_zero_width() {
        let edit = Edit::insert(3, "use std::fmt;\n");
        assert_eq!(edit.byte_start, edit.byte_end);
        assert!(edit.check("abcdef").is_ok());
    }
}
