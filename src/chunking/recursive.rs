//! Recursive separator-fallback splitting.
//!
//! Tries the coarsest separator first and only descends to a finer one for
//! fragments that are still too large:
//!
//! ```text
//! ["\n\n", "\n", ". ", " ", ""]
//!   paragraphs → lines → sentences → words → characters
//! ```
//!
//! The empty separator splits into single characters, which always fit, so
//! the default hierarchy always terminates with every fragment within
//! `max_size`. A custom hierarchy without `""` may leave an oversized atomic
//! fragment (one very long word); it is emitted whole rather than truncated.
//!
//! Separators stay attached to the end of the fragment they terminate, so the
//! fragments concatenate back to the input byte for byte.

use super::merge::{CharMeasure, Span, merge};
use super::{Chunker, DEFAULT_SEPARATORS, validate};
use crate::error::ChunkingError;

/// Splits text on a hierarchy of separators, coarsest first.
///
/// ## Example
///
/// ```rust
/// use ragloop::chunking::{Chunker, RecursiveChunker};
///
/// let chunker = RecursiveChunker::new(40, 5)?;
/// let text = "Paragraph one.\n\nParagraph two is longer and will need splitting.";
/// for piece in chunker.split(text) {
///     assert!(piece.chars().count() <= 40);
/// }
/// # Ok::<(), ragloop::ChunkingError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    max_size: usize,
    overlap: usize,
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// Creates a chunker with the default prose separators.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError`] if `max_size == 0` or `overlap >= max_size`.
    pub fn new(max_size: usize, overlap: usize) -> Result<Self, ChunkingError> {
        validate(max_size, overlap)?;
        Ok(Self {
            max_size,
            overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|&s| s.to_string()).collect(),
        })
    }

    /// Replaces the separator hierarchy. An empty list means "no splitting
    /// below the whole text".
    #[must_use]
    pub fn with_separators<S: AsRef<str>>(mut self, separators: &[S]) -> Self {
        self.separators = separators.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    /// The active separator hierarchy.
    #[must_use]
    pub fn separators(&self) -> &[String] {
        &self.separators
    }

    fn fragments<'t>(&self, text: &'t str, separators: &[String], out: &mut Vec<&'t str>) {
        if text.chars().count() <= self.max_size {
            out.push(text);
            return;
        }

        let Some((separator, finer)) = separators.split_first() else {
            out.push(text);
            return;
        };

        if separator.is_empty() {
            out.extend(
                text.char_indices()
                    .map(|(i, c)| &text[i..i + c.len_utf8()]),
            );
            return;
        }

        for part in text.split_inclusive(separator.as_str()) {
            if part.chars().count() <= self.max_size {
                out.push(part);
            } else {
                self.fragments(part, finer, out);
            }
        }
    }
}

impl Chunker for RecursiveChunker {
    fn name(&self) -> &'static str {
        "recursive"
    }

    fn spans(&self, text: &str) -> Vec<Span> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut fragments = Vec::new();
        self.fragments(text, &self.separators, &mut fragments);
        merge(&fragments, self.max_size, self.overlap, &CharMeasure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(max_size: usize, overlap: usize) -> RecursiveChunker {
        RecursiveChunker::new(max_size, overlap).unwrap_or_else(|e| panic!("new failed: {e}"))
    }

    #[test]
    fn test_small_text_single_chunk() {
        let pieces = chunker(100, 10).split("Small text.");
        assert_eq!(pieces, vec!["Small text."]);
    }

    #[test]
    fn test_empty_text() {
        assert!(chunker(100, 10).split("").is_empty());
    }

    #[test]
    fn test_paragraphs_preferred() {
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let pieces = chunker(30, 0).split(text);
        assert_eq!(pieces, vec!["First paragraph here.\n\n", "Second paragraph here."]);
    }

    #[test]
    fn test_falls_back_to_words() {
        let text = "The quick brown fox jumps over the lazy dog";
        let pieces = chunker(12, 0).split(text);
        assert!(pieces.len() > 1);
        for piece in &pieces {
            assert!(piece.chars().count() <= 12, "too long: {piece:?}");
        }
        assert_eq!(pieces.concat(), text);
    }

    #[test]
    fn test_falls_back_to_characters() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let pieces = chunker(10, 2).split(text);
        assert_eq!(pieces, vec!["abcdefghij", "ijklmnopqr", "qrstuvwxyz"]);
    }

    #[test]
    fn test_oversized_word_kept_whole_without_char_fallback() {
        let chunker = chunker(5, 0).with_separators(&[" "]);
        let pieces = chunker.split("hi supercalifragilistic yo");
        assert!(pieces.contains(&"supercalifragilistic ".to_string()));
        assert_eq!(pieces.concat(), "hi supercalifragilistic yo");
    }

    #[test]
    fn test_spans_track_char_offsets() {
        let text = "ünïcödé wörds hère";
        let spans = chunker(8, 2).spans(text);
        let chars: Vec<char> = text.chars().collect();
        for span in &spans {
            let expected: String = chars[span.start..span.end].iter().collect();
            assert_eq!(span.text, expected);
        }
    }

    #[test]
    fn test_rejects_overlap_not_smaller() {
        assert!(RecursiveChunker::new(10, 10).is_err());
        assert!(RecursiveChunker::new(0, 0).is_err());
    }
}
