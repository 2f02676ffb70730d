//! Core data model for the citekit workspace.
//!
//! This crate defines the types every other citekit crate speaks:
//! papers and their byte-addressed [`Passage`]s, in-text [`Citation`]
//! markers with weak links to bibliography [`Reference`] entries, the
//! [`TextExtractor`] seam for binary uploads, and the shared
//! [`CitekitError`] taxonomy.
//!
//! Two invariants underpin everything downstream:
//!
//! - A [`Passage`]'s text is byte-for-byte equal to the spanned slice
//!   of its paper's text, so grounded answers can always point back to
//!   exact source locations.
//! - A [`Citation`]'s link to a reference is weak. Unresolved markers
//!   are kept, never discarded.
//!
//! # Example
//!
//! ```
//! use citekit_core::{Paper, Span};
//!
//! let paper = Paper::new(
//!     "Attention Is All You Need",
//!     vec!["Vaswani".to_string()],
//!     "The dominant sequence transduction models...",
//! );
//! let span = Span::new(0, 12);
//! assert_eq!(span.slice(&paper.text), Some("The dominant"));
//! ```

mod citation;
mod error;
mod extract;
mod paper;

pub use citation::{Citation, CitationExtraction, CitationKind, Reference, ResolutionConfidence};
pub use error::{CitekitError, ErrorClass, Result};
pub use extract::{PlainTextExtractor, TextExtractor};
pub use paper::{Paper, PaperId, Passage, Span, ceil_char_boundary, floor_char_boundary};
