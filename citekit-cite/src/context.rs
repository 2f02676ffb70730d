//! Context capture around citation markers.

use citekit_core::{Span, ceil_char_boundary, floor_char_boundary};

const SENTENCE_ENDS: &[u8] = b".!?";

/// Capture the sentence enclosing `marker`, falling back to a window of
/// `radius` bytes on each side when no sentence boundary is found.
///
/// The returned span is absolute and points at the trimmed context, so
/// `span.slice(text)` reproduces the returned string.
pub(crate) fn sentence_context(text: &str, marker: Span, radius: usize) -> (Span, String) {
    let window_start = floor_char_boundary(text, marker.start.saturating_sub(radius));
    let window_end = ceil_char_boundary(text, marker.end.saturating_add(radius).min(text.len()));

    let start = last_sentence_end(text, window_start, marker.start)
        .map(|p| p + 1)
        .unwrap_or(window_start);
    let end = first_sentence_end(text, marker.end, window_end).map(|p| p + 1).unwrap_or(window_end);

    trim_to_span(text, start, end)
}

/// Rightmost sentence terminator in `[from, to)`, if any.
fn last_sentence_end(text: &str, from: usize, to: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    (from..to).rev().find(|&i| SENTENCE_ENDS.contains(&bytes[i]) || bytes[i] == b'\n')
}

/// Leftmost sentence terminator in `[from, to)`, if any.
fn first_sentence_end(text: &str, from: usize, to: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    (from..to).find(|&i| SENTENCE_ENDS.contains(&bytes[i]) || bytes[i] == b'\n')
}

/// Shrink `[start, end)` past surrounding whitespace and return the
/// span together with its text.
fn trim_to_span(text: &str, start: usize, end: usize) -> (Span, String) {
    let raw = &text[start..end];
    let trimmed = raw.trim();
    let lead = raw.len() - raw.trim_start().len();
    let span = Span::new(start + lead, start + lead + trimmed.len());
    (span, trimmed.to_string())
}
