//! Passage chunking.
//!
//! This module provides the [`Chunker`] trait and [`SectionChunker`],
//! which merges whole paragraphs up to a target size and falls back to
//! overlapping windows with sentence snapping for oversized sections.

use citekit_core::{
    CitekitError, Paper, Passage, Result, Span, ceil_char_boundary, floor_char_boundary,
};

/// How far back from a window end to look for a sentence boundary.
const SENTENCE_SNAP: usize = 100;

/// A strategy for splitting papers into passages.
///
/// Implementations must uphold the offset invariant: every returned
/// passage's `text` equals the spanned slice of the paper's text, and
/// chunking the same text twice produces identical passages.
pub trait Chunker: Send + Sync {
    /// Split a paper into passages.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::EmptyInput`] if the paper text is empty
    /// or whitespace-only.
    fn chunk(&self, paper: &Paper) -> Result<Vec<Passage>>;
}

/// Splits papers along paragraph boundaries, merging consecutive
/// paragraphs up to the target size.
///
/// A single paragraph larger than the target is cut into overlapping
/// windows; each window end snaps back to the nearest sentence end
/// within the final [`SENTENCE_SNAP`] bytes so mid-sentence cuts stay
/// rare. Trailing text is never dropped, however short.
#[derive(Debug, Clone)]
pub struct SectionChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SectionChunker {
    /// Create a new `SectionChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — target passage size in bytes
    /// * `chunk_overlap` — overlap between windows of an oversized paragraph
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Default for SectionChunker {
    fn default() -> Self {
        let config = crate::config::RetrievalConfig::default();
        Self::new(config.chunk_size, config.chunk_overlap)
    }
}

impl Chunker for SectionChunker {
    fn chunk(&self, paper: &Paper) -> Result<Vec<Passage>> {
        if paper.text.trim().is_empty() {
            return Err(CitekitError::EmptyInput);
        }

        let text = &paper.text;
        let paragraphs = paragraph_spans(text);
        let sections = merge_paragraphs(&paragraphs, self.chunk_size);

        let mut passages: Vec<Passage> = Vec::new();
        for section in sections {
            let spans = if section.len() <= self.chunk_size {
                vec![section]
            } else {
                split_windows(text, section, self.chunk_size, self.chunk_overlap)
            };
            for span in spans {
                if span.is_empty() {
                    continue;
                }
                passages.push(Passage {
                    paper_id: paper.id,
                    index: passages.len(),
                    span,
                    text: text[span.start..span.end].to_string(),
                });
            }
        }

        Ok(passages)
    }
}

/// Spans of non-blank paragraphs, trimmed to non-whitespace edges.
fn paragraph_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut cursor = 0;
    let mut current_start: Option<usize> = None;

    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            if let Some(start) = current_start.take() {
                spans.push(trim_span(text, start, cursor));
            }
        } else if current_start.is_none() {
            current_start = Some(cursor);
        }
        cursor += line.len();
    }
    if let Some(start) = current_start {
        spans.push(trim_span(text, start, text.len()));
    }

    spans.retain(|s| !s.is_empty());
    spans
}

/// Merge consecutive paragraphs while the combined span fits `target`.
/// The merged span keeps the separator bytes between paragraphs so that
/// spans stay contiguous slices of the original text.
fn merge_paragraphs(paragraphs: &[Span], target: usize) -> Vec<Span> {
    let mut sections = Vec::new();
    let mut current: Option<Span> = None;

    for &paragraph in paragraphs {
        match current {
            None => current = Some(paragraph),
            Some(section) => {
                let combined = Span::new(section.start, paragraph.end);
                if combined.len() <= target {
                    current = Some(combined);
                } else {
                    sections.push(section);
                    current = Some(paragraph);
                }
            }
        }
    }
    if let Some(section) = current {
        sections.push(section);
    }
    sections
}

/// Cut an oversized section into overlapping windows of at most `size`
/// bytes, snapping each cut back to a sentence end when one is close.
fn split_windows(text: &str, section: Span, size: usize, overlap: usize) -> Vec<Span> {
    let mut windows = Vec::new();
    let mut start = section.start;

    while start < section.end {
        let mut end = (start + size).min(section.end);
        if end < section.end {
            end = floor_char_boundary(text, end);
            let snap_from = end.saturating_sub(SENTENCE_SNAP).max(start + 1);
            if let Some(period) = rfind_sentence_end(text, snap_from, end) {
                end = period + 1;
            }
        }
        if end <= start {
            end = ceil_char_boundary(text, start + 1).min(section.end);
        }

        windows.push(trim_span(text, start, end));
        if end >= section.end {
            break;
        }

        let mut next = ceil_char_boundary(text, end.saturating_sub(overlap).max(start + 1));
        if next <= start {
            next = end;
        }
        start = next;
    }

    windows
}

/// Rightmost sentence terminator in `[from, to)`, if any.
fn rfind_sentence_end(text: &str, from: usize, to: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    (from..to.min(bytes.len())).rev().find(|&i| matches!(bytes[i], b'.' | b'!' | b'?'))
}

/// Shrink `[start, end)` past surrounding whitespace.
fn trim_span(text: &str, start: usize, end: usize) -> Span {
    let slice = &text[start..end];
    let lead = slice.len() - slice.trim_start().len();
    let trail = slice.len() - slice.trim_end().len();
    Span::new(start + lead, end - trail)
}
