//! Positioned segments and chunk statistics.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::merge::Span;

/// Caller-supplied provenance attached to every segment of one document.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A bounded slice of a longer text with its position in the sequence.
///
/// `size` is the character length of `text`. `start`/`end` are character
/// offsets into the source document; adjacent segments overlap when
/// `next.start < prev.end`. All segments produced by one call share the
/// same [`Metadata`] allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment text.
    pub text: String,
    /// Zero-based position in the sequence.
    pub index: usize,
    /// Number of segments produced for the document.
    pub total: usize,
    /// Character length of `text`.
    pub size: usize,
    /// Character offset where the segment starts in the source.
    pub start: usize,
    /// Character offset where the segment ends (exclusive).
    pub end: usize,
    /// Shared document metadata.
    #[serde(default, skip_serializing_if = "metadata_is_empty")]
    pub metadata: Arc<Metadata>,
}

fn metadata_is_empty(metadata: &Arc<Metadata>) -> bool {
    metadata.is_empty()
}

impl Segment {
    /// Number of leading characters shared with the previous segment.
    #[must_use]
    pub fn overlap_with(&self, previous: &Self) -> usize {
        previous.end.saturating_sub(self.start)
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Segment {{ index: {}/{}, span: {}..{}, size: {} }}",
            self.index, self.total, self.start, self.end, self.size
        )
    }
}

/// Numbers segments and attaches shared metadata.
pub(crate) fn from_spans(spans: Vec<Span>, metadata: Metadata) -> Vec<Segment> {
    let total = spans.len();
    let metadata = Arc::new(metadata);
    spans
        .into_iter()
        .enumerate()
        .map(|(index, span)| Segment {
            size: span.end - span.start,
            text: span.text,
            index,
            total,
            start: span.start,
            end: span.end,
            metadata: Arc::clone(&metadata),
        })
        .collect()
}

/// Size statistics over a set of chunks, measured in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkStats {
    /// Number of chunks.
    pub total_chunks: usize,
    /// Sum of chunk sizes (overlap counted once per chunk).
    pub total_characters: usize,
    /// Integer mean chunk size.
    pub avg_chunk_size: usize,
    /// Smallest chunk size.
    pub min_chunk_size: usize,
    /// Largest chunk size.
    pub max_chunk_size: usize,
}

impl ChunkStats {
    /// Computes statistics for the given chunk texts. Empty input yields zeros.
    pub fn from_texts<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sizes: Vec<usize> = chunks
            .into_iter()
            .map(|c| c.as_ref().chars().count())
            .collect();

        let Some(&min_chunk_size) = sizes.iter().min() else {
            return Self::default();
        };
        let max_chunk_size = sizes.iter().copied().max().unwrap_or(min_chunk_size);
        let total_characters: usize = sizes.iter().sum();

        Self {
            total_chunks: sizes.len(),
            total_characters,
            avg_chunk_size: total_characters / sizes.len(),
            min_chunk_size,
            max_chunk_size,
        }
    }

    /// Computes statistics for segments.
    #[must_use]
    pub fn from_segments(segments: &[Segment]) -> Self {
        Self::from_texts(segments.iter().map(|s| s.text.as_str()))
    }
}
