//! Grounded answers, summaries, and the paper library for citekit.
//!
//! This crate sits on top of retrieval. The [`AnswerAssembler`] packs
//! retrieved passages into a completion prompt under a byte budget and
//! returns the generated text together with exactly the passages it
//! disclosed, so every answer is auditable against its sources. The
//! [`Summarizer`] generates style-specific paper summaries, and
//! [`Library`] ties chunking, citation linking, indexing, retrieval,
//! and answering into the facade most callers use.
//!
//! When retrieval grounds nothing, the assembler returns the fixed
//! [`NO_GROUNDING_ANSWER`] without calling the completion provider at
//! all. There is no such thing as an answer invented off-context.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use citekit_answer::{Library, SummaryStyle};
//!
//! let library = Library::builder()
//!     .embedding_provider(embedder)
//!     .completion_provider(completer)
//!     .build()?;
//!
//! let id = library.add_paper("Attention Is All You Need", authors, text).await?;
//! library.add_to_library(id).await?;
//!
//! let answer = library.ask("What replaces recurrence?", None).await?;
//! let summary = library.summarize(id, SummaryStyle::Plain).await?;
//! ```

mod assembler;
mod completion;
mod config;
mod library;
mod summarize;

#[cfg(feature = "openai")]
pub mod openai;

pub use assembler::{
    Answer, AnswerAssembler, AnswerSource, NO_GROUNDING_ANSWER, RelatedCitation,
};
pub use completion::{CompletionProvider, Prompt};
pub use config::{AnswerConfig, AnswerConfigBuilder};
pub use library::{
    AnalyzedPaper, CitationAnswer, CitationLabel, Library, LibraryBuilder, LibraryStats,
    PaperStats, ReferenceDetails, RelevantCitation, SimilarPaper,
};
pub use summarize::{Summarizer, SummaryStyle};
