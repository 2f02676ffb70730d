//! The citation linker: markers, bibliography, and resolution combined.

use std::collections::BTreeMap;

use citekit_core::{
    Citation, CitationExtraction, Paper, Passage, ResolutionConfidence, Span,
};
use tracing::debug;

use crate::bibliography;
use crate::config::LinkerConfig;
use crate::context;
use crate::marker::{self, MarkerPart, RawMarker};
use crate::resolve;

/// Extracts in-text citations and bibliography references from a paper.
///
/// Extraction is tolerant: a paper without a detectable bibliography
/// yields citations with empty references, and markers that resolve to
/// nothing are kept as unresolved. Running the linker twice over the
/// same passages produces the same extraction.
#[derive(Debug, Clone, Default)]
pub struct CitationLinker {
    config: LinkerConfig,
}

impl CitationLinker {
    /// Create a linker with the given configuration.
    pub fn new(config: LinkerConfig) -> Self {
        Self { config }
    }

    /// The linker's configuration.
    pub fn config(&self) -> &LinkerConfig {
        &self.config
    }

    /// Extract citations and references from `paper`.
    ///
    /// Markers are scanned per passage; a marker covered by several
    /// overlapping passages is attributed to the first one. Markers
    /// inside the bibliography region (the entry labels themselves)
    /// are not reported as citations. Compound markers such as
    /// `[1, 4]` produce one [`Citation`] per listed ordinal, all
    /// sharing the marker's literal and span.
    pub fn extract(&self, paper: &Paper, passages: &[Passage]) -> CitationExtraction {
        let region = bibliography::detect(&paper.text);
        let references = region
            .map(|r| {
                bibliography::split_entries(&paper.text[r.body_start..], self.config.max_references)
            })
            .unwrap_or_default();
        let cutoff = region.map(|r| r.heading_start).unwrap_or(usize::MAX);

        // Marker span -> (marker, owning passage span, offset within it).
        let mut markers: BTreeMap<Span, (RawMarker, Span, usize)> = BTreeMap::new();
        for passage in passages {
            for found in marker::scan(&passage.text, passage.span.start) {
                if found.span.start >= cutoff {
                    continue;
                }
                let offset = found.span.start - passage.span.start;
                markers.entry(found.span).or_insert((found, passage.span, offset));
            }
        }

        let mut citations = Vec::new();
        for (span, (found, passage_span, offset)) in markers {
            let (context_span, context) =
                context::sentence_context(&paper.text, span, self.config.context_radius);
            for part in &found.parts {
                let (reference, confidence) = match part {
                    MarkerPart::Ordinal(ordinal) => {
                        match resolve::resolve_ordinal(*ordinal, &references) {
                            Some(r) => (Some(r.ordinal), ResolutionConfidence::Exact),
                            None => (None, ResolutionConfidence::Unresolved),
                        }
                    }
                    MarkerPart::AuthorYear { authors, year } => {
                        match resolve::resolve_author_year(
                            authors,
                            year,
                            &references,
                            self.config.resolution_threshold,
                        ) {
                            Some((ordinal, score)) => {
                                (Some(ordinal), ResolutionConfidence::Fuzzy(score))
                            }
                            None => (None, ResolutionConfidence::Unresolved),
                        }
                    }
                };
                citations.push(Citation {
                    paper_id: paper.id,
                    literal: found.literal.clone(),
                    kind: found.kind,
                    span,
                    passage_span,
                    offset_in_passage: offset,
                    reference,
                    confidence,
                    context: context.clone(),
                    context_span,
                });
            }
        }

        debug!(
            paper.id = %paper.id,
            citation_count = citations.len(),
            reference_count = references.len(),
            "linked citations"
        );
        CitationExtraction { citations, references }
    }
}
