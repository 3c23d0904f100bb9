//! Text segmentation for embedding and retrieval.
//!
//! Converts long documents into bounded, overlapping, order-preserving
//! pieces. Three strategies share one greedy stitching step:
//!
//! | Strategy | Fragments | Measured in |
//! |----------|-----------|-------------|
//! | [`RecursiveChunker`] | paragraph → line → sentence → word → char | characters |
//! | [`CharacterChunker`] | one literal separator | characters |
//! | [`TokenChunker`] | Unicode word boundaries | estimated tokens |
//!
//! Lengths are counted in Unicode scalar values, never bytes. Separators
//! stay attached to their fragment, so the pieces cover the source exactly:
//! dropping each piece's overlap with its predecessor and concatenating
//! reconstructs the input.
//!
//! Invalid parameters (`max_size == 0`, `overlap >= max_size`) are rejected
//! up front with [`ChunkingError`].

pub(crate) mod merge;

mod character;
mod recursive;
mod segment;
mod token;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

pub use character::CharacterChunker;
pub use merge::Span;
pub use recursive::RecursiveChunker;
pub use segment::{ChunkStats, Metadata, Segment};
pub use token::{CharRatioEstimator, TokenChunker, TokenEstimator};

use crate::error::ChunkingError;

/// Default maximum segment size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 2000;
/// Default overlap in characters.
pub const DEFAULT_OVERLAP: usize = 200;
/// Default maximum segment size in tokens.
pub const DEFAULT_TOKEN_CHUNK_SIZE: usize = 1500;
/// Default overlap in tokens.
pub const DEFAULT_TOKEN_OVERLAP: usize = 150;
/// Separator hierarchy for recursive splitting; `""` means single characters.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];
/// Separator for fixed-separator splitting.
pub const DEFAULT_CHARACTER_SEPARATOR: &str = "\n";

/// A text chunking strategy.
pub trait Chunker: Send + Sync {
    /// Strategy name for logging.
    fn name(&self) -> &'static str;

    /// Splits text into positioned pieces. Empty input yields no pieces.
    fn spans(&self, text: &str) -> Vec<Span>;

    /// Splits text into piece strings.
    fn split(&self, text: &str) -> Vec<String> {
        self.spans(text).into_iter().map(|s| s.text).collect()
    }
}

/// Which chunker [`chunk`] uses.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    /// Separator hierarchy with fallback.
    #[default]
    Recursive,
    /// Single literal separator.
    Character,
    /// Token budget over word-boundary units.
    Token,
}

impl ChunkStrategy {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recursive => "recursive",
            Self::Character => "character",
            Self::Token => "token",
        }
    }
}

impl std::fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for [`chunk`] and [`create_chunker`].
///
/// `max_size` and `overlap` are characters for the recursive and character
/// strategies and estimated tokens for the token strategy.
#[derive(Clone)]
pub struct ChunkOptions {
    /// Maximum piece size.
    pub max_size: usize,
    /// Overlap between adjacent pieces.
    pub overlap: usize,
    /// Separator hierarchy for [`ChunkStrategy::Recursive`].
    pub separators: Vec<String>,
    /// Separator for [`ChunkStrategy::Character`].
    pub separator: String,
    /// Estimator for [`ChunkStrategy::Token`].
    pub estimator: Arc<dyn TokenEstimator>,
    /// Metadata attached to every produced segment.
    pub metadata: Metadata,
}

impl ChunkOptions {
    /// Default options for a strategy (2000/200 characters, 1500/150 tokens).
    #[must_use]
    pub fn for_strategy(strategy: ChunkStrategy) -> Self {
        let (max_size, overlap) = match strategy {
            ChunkStrategy::Recursive | ChunkStrategy::Character => {
                (DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP)
            }
            ChunkStrategy::Token => (DEFAULT_TOKEN_CHUNK_SIZE, DEFAULT_TOKEN_OVERLAP),
        };
        Self {
            max_size,
            overlap,
            ..Self::default()
        }
    }

    /// Sets the maximum size and overlap.
    #[must_use]
    pub const fn with_size(mut self, max_size: usize, overlap: usize) -> Self {
        self.max_size = max_size;
        self.overlap = overlap;
        self
    }

    /// Sets the recursive separator hierarchy.
    #[must_use]
    pub fn with_separators<S: AsRef<str>>(mut self, separators: &[S]) -> Self {
        self.separators = separators.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    /// Sets the fixed separator.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Sets the token estimator.
    #[must_use]
    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Sets the segment metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(|&s| s.to_string()).collect(),
            separator: DEFAULT_CHARACTER_SEPARATOR.to_string(),
            estimator: Arc::new(CharRatioEstimator::default()),
            metadata: Metadata::new(),
        }
    }
}

impl std::fmt::Debug for ChunkOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkOptions")
            .field("max_size", &self.max_size)
            .field("overlap", &self.overlap)
            .field("separators", &self.separators)
            .field("separator", &self.separator)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Rejects sizes that would not make progress.
pub(crate) const fn validate(max_size: usize, overlap: usize) -> Result<(), ChunkingError> {
    if max_size == 0 {
        return Err(ChunkingError::InvalidChunkSize { size: max_size });
    }
    if overlap >= max_size {
        return Err(ChunkingError::OverlapTooLarge {
            size: max_size,
            overlap,
        });
    }
    Ok(())
}

/// Creates the chunker for `strategy`.
///
/// # Errors
///
/// Returns [`ChunkingError`] if the options' size and overlap are invalid.
pub fn create_chunker(
    strategy: ChunkStrategy,
    options: &ChunkOptions,
) -> Result<Box<dyn Chunker>, ChunkingError> {
    let chunker: Box<dyn Chunker> = match strategy {
        ChunkStrategy::Recursive => Box::new(
            RecursiveChunker::new(options.max_size, options.overlap)?
                .with_separators(options.separators.as_slice()),
        ),
        ChunkStrategy::Character => Box::new(
            CharacterChunker::new(options.max_size, options.overlap)?
                .with_separator(options.separator.clone()),
        ),
        ChunkStrategy::Token => Box::new(
            TokenChunker::new(options.max_size, options.overlap)?
                .with_estimator(Arc::clone(&options.estimator)),
        ),
    };
    Ok(chunker)
}

/// Chunks `text` with the given strategy into numbered segments.
///
/// # Errors
///
/// Returns [`ChunkingError`] if the options' size and overlap are invalid.
pub fn chunk(
    text: &str,
    strategy: ChunkStrategy,
    options: &ChunkOptions,
) -> Result<Vec<Segment>, ChunkingError> {
    let chunker = create_chunker(strategy, options)?;
    let segments = segment::from_spans(chunker.spans(text), options.metadata.clone());
    info!(
        strategy = chunker.name(),
        input_chars = text.chars().count(),
        segments = segments.len(),
        "chunked text"
    );
    Ok(segments)
}

/// Splits on paragraph, line, sentence, word, then character boundaries.
///
/// # Errors
///
/// Returns [`ChunkingError`] if `max_size == 0` or `overlap >= max_size`.
pub fn split_recursive<S: AsRef<str>>(
    text: &str,
    max_size: usize,
    overlap: usize,
    separators: &[S],
) -> Result<Vec<String>, ChunkingError> {
    Ok(RecursiveChunker::new(max_size, overlap)?
        .with_separators(separators)
        .split(text))
}

/// Splits by estimated token count.
///
/// # Errors
///
/// Returns [`ChunkingError`] if `max_tokens == 0` or
/// `overlap_tokens >= max_tokens`.
pub fn split_by_tokens(
    text: &str,
    max_tokens: usize,
    overlap_tokens: usize,
    estimator: Arc<dyn TokenEstimator>,
) -> Result<Vec<String>, ChunkingError> {
    Ok(TokenChunker::new(max_tokens, overlap_tokens)?
        .with_estimator(estimator)
        .split(text))
}

/// Splits strictly on `separator`, without fallback.
///
/// # Errors
///
/// Returns [`ChunkingError`] if `max_size == 0` or `overlap >= max_size`.
pub fn split_by_character(
    text: &str,
    max_size: usize,
    overlap: usize,
    separator: &str,
) -> Result<Vec<String>, ChunkingError> {
    Ok(CharacterChunker::new(max_size, overlap)?
        .with_separator(separator)
        .split(text))
}

/// Recursive split wrapped into numbered [`Segment`]s sharing `metadata`.
///
/// # Errors
///
/// Returns [`ChunkingError`] if `max_size == 0` or `overlap >= max_size`.
pub fn to_segments(
    text: &str,
    max_size: usize,
    overlap: usize,
    metadata: Metadata,
) -> Result<Vec<Segment>, ChunkingError> {
    let chunker = RecursiveChunker::new(max_size, overlap)?;
    Ok(segment::from_spans(chunker.spans(text), metadata))
}
