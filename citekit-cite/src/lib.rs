//! Citation extraction and bibliography linking for citekit.
//!
//! [`CitationLinker`] scans a paper's passages for in-text citation
//! markers in three surface forms (numeric brackets, author-year, and
//! superscript footnotes), finds the bibliography section, parses it
//! into reference entries, and links markers to entries. Numeric and
//! footnote markers resolve by ordinal; author-year markers resolve by
//! fuzzy surname-and-year matching against entry text.
//!
//! Extraction never fails on messy input. A missing bibliography, an
//! unparseable entry, or a marker that matches nothing all degrade to
//! weaker output (empty references, raw entry text, an unresolved
//! citation) instead of errors.
//!
//! # Example
//!
//! ```
//! use citekit_cite::{CitationLinker, LinkerConfig};
//! use citekit_core::{Paper, Passage, Span};
//!
//! let paper = Paper::new(
//!     "Note",
//!     vec![],
//!     "Deep learning (Smith, 2020) improved accuracy. \
//!      References: Smith, J. 2020. Deep Learning Advances.",
//! );
//! let passages = vec![Passage {
//!     paper_id: paper.id,
//!     index: 0,
//!     span: Span::new(0, paper.text.len()),
//!     text: paper.text.clone(),
//! }];
//!
//! let linker = CitationLinker::new(LinkerConfig::default());
//! let extraction = linker.extract(&paper, &passages);
//! assert_eq!(extraction.citations[0].reference, Some(1));
//! ```

mod bibliography;
mod config;
mod context;
mod linker;
mod marker;
mod resolve;

pub use config::{LinkerConfig, LinkerConfigBuilder};
pub use linker::CitationLinker;
