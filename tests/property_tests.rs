//! Property-based tests for segmentation.
//!
//! These tests verify that every strategy maintains its invariants:
//! - Bounds: recursive segments never exceed `max_size`
//! - Coverage: offsets locate each segment exactly and leave no gaps
//! - Overlap: neighbours share at most `overlap` characters
//! - Ordering: indices run `0..total`, starts strictly increase
//! - Determinism: the same input always yields the same segments

use std::sync::Arc;

use proptest::prelude::*;
use ragloop::chunking::{
    ChunkOptions, ChunkStrategy, Metadata, Segment, TokenEstimator, chunk, split_by_character,
    split_by_tokens, split_recursive, to_segments,
};

// =============================================================================
// Test Generators
// =============================================================================

/// Prose-like text with paragraphs, lines, sentences and some non-ASCII.
fn prose() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            4 => "[a-zA-Z]{1,12}",
            1 => "[äöüéñ]{1,4}",
            1 => Just(". ".to_string()),
            1 => Just("\n".to_string()),
            1 => Just("\n\n".to_string()),
        ],
        0..120,
    )
    .prop_map(|parts| parts.join(" "))
}

/// `(max_size, overlap)` with `overlap < max_size`.
fn sizes() -> impl Strategy<Value = (usize, usize)> {
    (1usize..80).prop_flat_map(|max| (Just(max), 0..max))
}

// =============================================================================
// Invariant Helpers
// =============================================================================

fn assert_exact_cover(segments: &[Segment], text: &str, overlap: usize) {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        assert!(segments.is_empty());
        return;
    }

    assert_eq!(segments.first().map(|s| s.start), Some(0));
    assert_eq!(segments.last().map(|s| s.end), Some(chars.len()));

    for (i, segment) in segments.iter().enumerate() {
        assert_eq!(segment.index, i);
        assert_eq!(segment.total, segments.len());
        assert_eq!(segment.size, segment.text.chars().count());
        let located: String = chars[segment.start..segment.end].iter().collect();
        assert_eq!(segment.text, located);
    }

    for pair in segments.windows(2) {
        assert!(pair[1].start > pair[0].start, "starts must increase");
        assert!(pair[1].start <= pair[0].end, "gap between segments");
        assert!(pair[1].overlap_with(&pair[0]) <= overlap);
    }
}

/// Rebuilds the source by dropping each segment's overlapping prefix.
fn reconstruct(segments: &[Segment]) -> String {
    let mut out = String::new();
    let mut covered = 0;
    for segment in segments {
        let skip = covered - segment.start;
        out.extend(segment.text.chars().skip(skip));
        covered = segment.end;
    }
    out
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn recursive_respects_max_size(text in prose(), (max, overlap) in sizes()) {
        let pieces = split_recursive(&text, max, overlap, ragloop::chunking::DEFAULT_SEPARATORS)
            .unwrap_or_else(|e| panic!("split failed: {e}"));
        for piece in &pieces {
            prop_assert!(piece.chars().count() <= max, "{piece:?} exceeds {max}");
            prop_assert!(!piece.is_empty());
        }
    }

    #[test]
    fn segments_cover_source_exactly(text in prose(), (max, overlap) in sizes()) {
        let segments = to_segments(&text, max, overlap, Metadata::new())
            .unwrap_or_else(|e| panic!("segment failed: {e}"));
        assert_exact_cover(&segments, &text, overlap);
        prop_assert_eq!(reconstruct(&segments), text);
    }

    #[test]
    fn character_strategy_covers_source(text in prose(), (max, overlap) in sizes()) {
        let options = ChunkOptions::default().with_size(max, overlap);
        let segments = chunk(&text, ChunkStrategy::Character, &options)
            .unwrap_or_else(|e| panic!("chunk failed: {e}"));
        assert_exact_cover(&segments, &text, overlap);
        prop_assert_eq!(reconstruct(&segments), text);
    }

    #[test]
    fn token_strategy_covers_source(text in prose(), (max, overlap) in sizes()) {
        let options = ChunkOptions::default().with_size(max, overlap);
        let segments = chunk(&text, ChunkStrategy::Token, &options)
            .unwrap_or_else(|e| panic!("chunk failed: {e}"));
        prop_assert_eq!(reconstruct(&segments), text.clone());
        for pair in segments.windows(2) {
            prop_assert!(pair[1].start > pair[0].start);
            prop_assert!(pair[1].start <= pair[0].end);
        }
    }

    #[test]
    fn token_budget_holds_for_word_counts(text in prose(), (max, overlap) in sizes()) {
        let words = |t: &str| t.split_whitespace().count();
        let pieces = split_by_tokens(&text, max, overlap, Arc::new(words))
            .unwrap_or_else(|e| panic!("split failed: {e}"));
        for piece in &pieces {
            prop_assert!(words.estimate(piece) <= max);
        }
    }

    #[test]
    fn splitting_is_deterministic(text in prose(), (max, overlap) in sizes()) {
        let first = split_recursive(&text, max, overlap, ragloop::chunking::DEFAULT_SEPARATORS);
        let second = split_recursive(&text, max, overlap, ragloop::chunking::DEFAULT_SEPARATORS);
        prop_assert_eq!(first, second);

        let first = split_by_character(&text, max, overlap, "\n");
        let second = split_by_character(&text, max, overlap, "\n");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn invalid_overlap_always_rejected(text in prose(), max in 1usize..50, extra in 0usize..50) {
        prop_assert!(split_recursive(&text, max, max + extra, &["\n"]).is_err());
        prop_assert!(split_by_character(&text, max, max + extra, "\n").is_err());
        prop_assert!(to_segments(&text, max, max + extra, Metadata::new()).is_err());
    }
}
