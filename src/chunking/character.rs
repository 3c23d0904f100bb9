//! Fixed-separator splitting.
//!
//! Splits strictly on one literal separator, then stitches with the same
//! greedy overlap as the recursive strategy. There is no fallback: a piece
//! between two separators that exceeds `max_size` is emitted whole.

use super::merge::{CharMeasure, Span, merge};
use super::{Chunker, DEFAULT_CHARACTER_SEPARATOR, validate};
use crate::error::ChunkingError;

/// Splits on a single literal separator (newline by default).
#[derive(Debug, Clone)]
pub struct CharacterChunker {
    max_size: usize,
    overlap: usize,
    separator: String,
}

impl CharacterChunker {
    /// Creates a chunker splitting on `"\n"`.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError`] if `max_size == 0` or `overlap >= max_size`.
    pub fn new(max_size: usize, overlap: usize) -> Result<Self, ChunkingError> {
        validate(max_size, overlap)?;
        Ok(Self {
            max_size,
            overlap,
            separator: DEFAULT_CHARACTER_SEPARATOR.to_string(),
        })
    }

    /// Sets the separator. The empty string splits into characters.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

impl Chunker for CharacterChunker {
    fn name(&self) -> &'static str {
        "character"
    }

    fn spans(&self, text: &str) -> Vec<Span> {
        if text.is_empty() {
            return Vec::new();
        }

        let fragments: Vec<&str> = if self.separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split_inclusive(self.separator.as_str()).collect()
        };

        merge(&fragments, self.max_size, self.overlap, &CharMeasure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newline_split_with_overlap() {
        let chunker = CharacterChunker::new(3, 1).unwrap_or_else(|e| panic!("new failed: {e}"));
        let pieces = chunker.split("a\nb\nc\nd");
        assert_eq!(pieces, vec!["a\n", "\nb\n", "\nc\n", "\nd"]);
        for pair in pieces.windows(2) {
            assert_eq!(pair[0].chars().last(), pair[1].chars().next());
        }
    }

    #[test]
    fn test_wider_overlap_carries_previous_line() {
        let chunker = CharacterChunker::new(12, 6).unwrap_or_else(|e| panic!("new failed: {e}"));
        let pieces = chunker.split("alpha\nbeta\ngamma");
        assert_eq!(pieces, vec!["alpha\nbeta\n", "\nbeta\ngamma"]);
    }

    #[test]
    fn test_long_line_not_split() {
        let chunker = CharacterChunker::new(6, 0).unwrap_or_else(|e| panic!("new failed: {e}"));
        let pieces = chunker.split("short\nthis line is long\nend");
        assert_eq!(pieces, vec!["short\n", "this line is long\n", "end"]);
    }

    #[test]
    fn test_custom_separator() {
        let chunker = CharacterChunker::new(8, 0)
            .unwrap_or_else(|e| panic!("new failed: {e}"))
            .with_separator("|");
        let pieces = chunker.split("one|two|three|four");
        assert_eq!(pieces, vec!["one|two|", "three|", "four"]);
    }

    #[test]
    fn test_separator_absent() {
        let chunker = CharacterChunker::new(100, 10).unwrap_or_else(|e| panic!("new failed: {e}"));
        assert_eq!(chunker.split("no newline at all"), vec!["no newline at all"]);
    }
}
