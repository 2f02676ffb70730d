//! Papers, byte spans, and passages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a [`Paper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaperId(Uuid);

impl PaperId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PaperId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PaperId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for PaperId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A half-open byte range `[start, end)` into a paper's text.
///
/// Offsets always lie on UTF-8 character boundaries of the owning text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start offset in bytes.
    pub start: usize,
    /// Exclusive end offset in bytes.
    pub end: usize,
}

impl Span {
    /// Create a span covering `[start, end)`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True if the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True if the two spans share at least one byte.
    pub fn overlaps(&self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True if `offset` falls inside this span.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Borrow the spanned slice of `text`.
    ///
    /// Returns `None` if the span is out of bounds or does not land on
    /// character boundaries of `text`.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }
}

/// Largest offset `<= i` that lies on a character boundary of `text`.
pub fn floor_char_boundary(text: &str, mut i: usize) -> usize {
    if i >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest offset `>= i` that lies on a character boundary of `text`.
pub fn ceil_char_boundary(text: &str, mut i: usize) -> usize {
    if i >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// A research paper held by the library.
///
/// `text` is the full extracted plain text. All spans recorded for this
/// paper (passages, citation markers, contexts) index into it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paper {
    /// Unique identifier.
    pub id: PaperId,
    /// Paper title.
    pub title: String,
    /// Author list, in the order given at upload.
    pub authors: Vec<String>,
    /// Full extracted text.
    pub text: String,
    /// When the paper was added.
    pub uploaded_at: DateTime<Utc>,
}

impl Paper {
    /// Create a paper with a fresh id and the current timestamp.
    pub fn new(title: impl Into<String>, authors: Vec<String>, text: impl Into<String>) -> Self {
        Self {
            id: PaperId::new(),
            title: title.into(),
            authors,
            text: text.into(),
            uploaded_at: Utc::now(),
        }
    }
}

/// A contiguous segment of a paper's text produced by chunking.
///
/// `text` is byte-for-byte equal to the spanned slice of the owning
/// paper's text, so an offset computed within a passage maps back to
/// the paper by adding `span.start`. A passage is identified by its
/// `(paper_id, span)` pair; `index` is its position in the chunk
/// sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passage {
    /// The owning paper.
    pub paper_id: PaperId,
    /// Zero-based position in the paper's passage sequence.
    pub index: usize,
    /// Byte range of `text` within the paper's text.
    pub span: Span,
    /// The passage text.
    pub text: String,
}
