//! Token-budgeted splitting.
//!
//! Sizes are measured with a pluggable [`TokenEstimator`] instead of
//! character counts. Fragments are Unicode word-boundary units (UAX #29), so
//! a cut never lands inside a word, and the overlap carried between buffers
//! is made of whole trailing units.

use std::fmt;
use std::sync::Arc;

use unicode_segmentation::UnicodeSegmentation;

use super::merge::{Measure, Span, merge};
use super::{Chunker, validate};
use crate::error::ChunkingError;

/// Maps text to an estimated token count.
///
/// Any `Fn(&str) -> usize` closure is an estimator:
///
/// ```rust
/// use ragloop::chunking::TokenEstimator;
///
/// let words = |text: &str| text.split_whitespace().count();
/// assert_eq!(words.estimate("three little words"), 3);
/// ```
pub trait TokenEstimator: Send + Sync {
    /// Estimated token count of `text`.
    fn estimate(&self, text: &str) -> usize;
}

impl<F> TokenEstimator for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn estimate(&self, text: &str) -> usize {
        self(text)
    }
}

/// Characters-per-token heuristic (`ceil(chars / ratio)`).
///
/// Four characters per token is the usual rule of thumb for English text
/// with BPE tokenizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharRatioEstimator {
    chars_per_token: usize,
}

impl CharRatioEstimator {
    /// Creates an estimator; a ratio of zero is treated as one.
    #[must_use]
    pub const fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: if chars_per_token == 0 {
                1
            } else {
                chars_per_token
            },
        }
    }
}

impl Default for CharRatioEstimator {
    fn default() -> Self {
        Self::new(4)
    }
}

impl TokenEstimator for CharRatioEstimator {
    fn estimate(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token)
    }
}

struct TokenMeasure<'e>(&'e dyn TokenEstimator);

impl Measure for TokenMeasure<'_> {
    fn measure(&self, text: &str) -> usize {
        self.0.estimate(text)
    }

    fn tail_start(&self, buffer: &str, budget: usize) -> usize {
        let mut start = buffer.len();
        for (index, _) in buffer.split_word_bound_indices().rev() {
            if self.0.estimate(&buffer[index..]) > budget {
                break;
            }
            start = index;
        }
        // Start the carried tail on a word, not on the whitespace before it.
        let tail = &buffer[start..];
        start + (tail.len() - tail.trim_start().len())
    }
}

/// Splits text into pieces of at most `max_tokens` estimated tokens.
#[derive(Clone)]
pub struct TokenChunker {
    max_tokens: usize,
    overlap_tokens: usize,
    estimator: Arc<dyn TokenEstimator>,
}

impl TokenChunker {
    /// Creates a chunker using [`CharRatioEstimator::default`].
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError`] if `max_tokens == 0` or
    /// `overlap_tokens >= max_tokens`.
    pub fn new(max_tokens: usize, overlap_tokens: usize) -> Result<Self, ChunkingError> {
        validate(max_tokens, overlap_tokens)?;
        Ok(Self {
            max_tokens,
            overlap_tokens,
            estimator: Arc::new(CharRatioEstimator::default()),
        })
    }

    /// Replaces the token estimator.
    #[must_use]
    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }
}

impl fmt::Debug for TokenChunker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenChunker")
            .field("max_tokens", &self.max_tokens)
            .field("overlap_tokens", &self.overlap_tokens)
            .field("estimator", &"<dyn TokenEstimator>")
            .finish()
    }
}

impl Chunker for TokenChunker {
    fn name(&self) -> &'static str {
        "token"
    }

    fn spans(&self, text: &str) -> Vec<Span> {
        if text.is_empty() {
            return Vec::new();
        }

        let fragments: Vec<&str> = text.split_word_bounds().collect();
        let measure = TokenMeasure(self.estimator.as_ref());
        merge(&fragments, self.max_tokens, self.overlap_tokens, &measure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_count(text: &str) -> usize {
        text.unicode_words().count()
    }

    #[test]
    fn test_char_ratio_estimator() {
        let estimator = CharRatioEstimator::default();
        assert_eq!(estimator.estimate(""), 0);
        assert_eq!(estimator.estimate("abc"), 1);
        assert_eq!(estimator.estimate("abcd"), 1);
        assert_eq!(estimator.estimate("abcde"), 2);
        assert_eq!(CharRatioEstimator::new(0).estimate("abc"), 3);
    }

    #[test]
    fn test_word_budget_respected() {
        let chunker = TokenChunker::new(3, 1)
            .unwrap_or_else(|e| panic!("new failed: {e}"))
            .with_estimator(Arc::new(word_count));
        let text = "one two three four five six seven";
        let pieces = chunker.split(text);
        assert!(pieces.len() > 1);
        for piece in &pieces {
            assert!(word_count(piece) <= 3, "over budget: {piece:?}");
        }
    }

    #[test]
    fn test_overlap_is_whole_words() {
        let chunker = TokenChunker::new(3, 1)
            .unwrap_or_else(|e| panic!("new failed: {e}"))
            .with_estimator(Arc::new(word_count));
        let pieces = chunker.split("alpha beta gamma delta epsilon");
        assert_eq!(pieces[0], "alpha beta gamma ");
        assert!(pieces[1].starts_with("gamma "), "got {:?}", pieces[1]);
    }

    #[test]
    fn test_rejects_overlap_not_smaller() {
        assert!(matches!(
            TokenChunker::new(100, 100),
            Err(ChunkingError::OverlapTooLarge { size: 100, overlap: 100 })
        ));
    }
}
