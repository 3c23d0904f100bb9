//! Greedy fragment stitching with overlap.
//!
//! Every strategy reduces to the same step: take an ordered list of
//! fragments that exactly covers the source text, pack them into buffers no
//! larger than `max_size`, and seed each new buffer with the tail of the
//! previous one.
//!
//! ```text
//! fragments:  [a\n][b\n][c\n][d]      max_size = 3, overlap = 1
//! buffer 0:   a\n
//! buffer 1:    \nb\n                   <- "\n" carried from buffer 0
//! buffer 2:      \nc\n
//! buffer 3:        \nd
//! ```
//!
//! The carried tail is bounded by `min(overlap, len(previous))` and then
//! shrunk further so that `tail + fragment` still fits. An oversized
//! fragment gets no tail at all and is emitted whole.
//!
//! Fragments keep their trailing separator, so every emitted buffer ends on
//! one and the tail is counted back from it. An overlap no longer than the
//! separator carries only the separator, as above; larger overlaps reach
//! back into the preceding fragment.

/// A contiguous piece of the source text, located by character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// The piece text.
    pub text: String,
    /// Character offset where the piece starts in the source.
    pub start: usize,
    /// Character offset where the piece ends (exclusive).
    pub end: usize,
}

impl Span {
    pub(crate) fn new(text: String, start: usize) -> Self {
        let end = start + text.chars().count();
        Self { text, start, end }
    }
}

/// Unit in which buffer size and overlap are measured.
pub(crate) trait Measure {
    /// Size of `text` in this unit.
    fn measure(&self, text: &str) -> usize;

    /// Size of `buffer + fragment`, given the already known size of `buffer`.
    fn joined(&self, buffer: &str, _buffer_size: usize, fragment: &str) -> usize {
        let mut joined = String::with_capacity(buffer.len() + fragment.len());
        joined.push_str(buffer);
        joined.push_str(fragment);
        self.measure(&joined)
    }

    /// Byte index in `buffer` where a tail of at most `budget` units begins.
    fn tail_start(&self, buffer: &str, budget: usize) -> usize;
}

/// Measures in Unicode scalar values.
pub(crate) struct CharMeasure;

impl Measure for CharMeasure {
    fn measure(&self, text: &str) -> usize {
        text.chars().count()
    }

    fn joined(&self, _buffer: &str, buffer_size: usize, fragment: &str) -> usize {
        buffer_size + fragment.chars().count()
    }

    fn tail_start(&self, buffer: &str, budget: usize) -> usize {
        if budget == 0 {
            return buffer.len();
        }
        buffer
            .char_indices()
            .rev()
            .nth(budget - 1)
            .map_or(0, |(i, _)| i)
    }
}

/// Packs `fragments` into spans of at most `max_size` units.
///
/// `fragments` must be non-empty slices that concatenate to the source text.
pub(crate) fn merge<M: Measure + ?Sized>(
    fragments: &[&str],
    max_size: usize,
    overlap: usize,
    measure: &M,
) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut buffer = String::new();
    let mut buffer_size = 0;
    let mut buffer_start = 0;
    let mut position = 0;

    for &fragment in fragments {
        let fragment_chars = fragment.chars().count();

        if buffer.is_empty() {
            buffer.push_str(fragment);
            buffer_size = measure.measure(&buffer);
            buffer_start = position;
        } else if measure.joined(&buffer, buffer_size, fragment) <= max_size {
            buffer_size = measure.joined(&buffer, buffer_size, fragment);
            buffer.push_str(fragment);
        } else {
            let carry = carry_over(&buffer, fragment, max_size, overlap, measure);
            let carry_chars = carry.chars().count();

            let mut next = String::with_capacity(carry.len() + fragment.len());
            next.push_str(carry);
            next.push_str(fragment);

            spans.push(Span::new(std::mem::take(&mut buffer), buffer_start));
            buffer_size = measure.measure(&next);
            buffer = next;
            buffer_start = position - carry_chars;
        }

        position += fragment_chars;
    }

    if !buffer.is_empty() {
        spans.push(Span::new(buffer, buffer_start));
    }

    spans
}

/// Tail of `buffer` to prepend to the buffer that starts with `fragment`.
fn carry_over<'b, M: Measure + ?Sized>(
    buffer: &'b str,
    fragment: &str,
    max_size: usize,
    overlap: usize,
    measure: &M,
) -> &'b str {
    let room = max_size.saturating_sub(measure.measure(fragment));
    let budget = overlap.min(room);
    if budget == 0 {
        return "";
    }

    let tail = &buffer[measure.tail_start(buffer, budget)..];
    if measure.joined(tail, measure.measure(tail), fragment) > max_size {
        ""
    } else {
        tail
    }
}
