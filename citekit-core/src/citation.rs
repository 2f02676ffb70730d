//! Citations and bibliography references.

use serde::{Deserialize, Serialize};

use crate::paper::{PaperId, Span};

/// The surface form of an in-text citation marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationKind {
    /// Bracketed ordinal markers such as `[3]` or `[1, 4]`.
    Numeric,
    /// Parenthetical or narrative author-year markers such as
    /// `(Smith, 2020)` or `Smith (2020)`.
    AuthorYear,
    /// Superscript digit markers such as `²`.
    Footnote,
}

impl std::fmt::Display for CitationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CitationKind::Numeric => "numeric",
            CitationKind::AuthorYear => "author_year",
            CitationKind::Footnote => "footnote",
        };
        f.write_str(name)
    }
}

/// How confidently an in-text citation was linked to a reference entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionConfidence {
    /// Ordinal lookup landed on an existing entry.
    Exact,
    /// Author-year match scored at or above the resolution threshold.
    Fuzzy(f32),
    /// No entry matched.
    Unresolved,
}

impl ResolutionConfidence {
    /// True unless the citation is unresolved.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, ResolutionConfidence::Unresolved)
    }
}

/// An in-text citation marker found in a paper.
///
/// The link to a [`Reference`] is weak: `reference` holds the ordinal
/// of the matched bibliography entry, or `None` when resolution failed.
/// An unresolved citation is still a valid citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// The paper the marker was found in.
    pub paper_id: PaperId,
    /// The matched marker text, e.g. `(Smith, 2020)` or `[3]`.
    pub literal: String,
    /// Surface form of the marker.
    pub kind: CitationKind,
    /// Absolute byte range of the marker in the paper's text.
    pub span: Span,
    /// Span of the first passage containing the marker.
    pub passage_span: Span,
    /// Byte offset of the marker within that passage.
    pub offset_in_passage: usize,
    /// Ordinal of the resolved bibliography entry, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<usize>,
    /// How the link to the bibliography was established.
    pub confidence: ResolutionConfidence,
    /// Surrounding sentence (or fixed-radius window) for display.
    pub context: String,
    /// Absolute byte range of `context` in the paper's text.
    pub context_span: Span,
}

/// A bibliography entry parsed from a paper's reference section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// One-based position in the bibliography.
    pub ordinal: usize,
    /// The raw entry text.
    pub text: String,
    /// Author string, when one could be split off the entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    /// Title string, when one could be split off the entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Publication year, when one was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
}

/// The result of citation analysis for one paper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitationExtraction {
    /// In-text citations ordered by position in the paper.
    pub citations: Vec<Citation>,
    /// Bibliography entries ordered by ordinal.
    pub references: Vec<Reference>,
}

impl CitationExtraction {
    /// Look up a reference by its one-based ordinal.
    pub fn reference(&self, ordinal: usize) -> Option<&Reference> {
        self.references.iter().find(|r| r.ordinal == ordinal)
    }

    /// Citations that resolved to the reference with the given ordinal.
    pub fn citations_of(&self, ordinal: usize) -> impl Iterator<Item = &Citation> {
        self.citations.iter().filter(move |c| c.reference == Some(ordinal))
    }
}
