//! Research paper retrieval, citation linking, and grounded answering.
//!
//! citekit ingests research papers as plain text, splits them into
//! byte-addressed passages, links in-text citation markers to
//! bibliography entries, embeds passages for semantic search, and
//! answers questions with generated text that carries its grounding:
//! every answer lists exactly the passages it was produced from.
//!
//! The workspace layers cleanly and this crate re-exports all of it:
//!
//! - `citekit-core` – papers, spans, passages, citations, the error
//!   taxonomy, and the [`TextExtractor`] seam.
//! - `citekit-cite` – [`CitationLinker`]: marker scanning, bibliography
//!   parsing, and citation resolution.
//! - `citekit-retrieval` – [`SectionChunker`], the model-tagged
//!   [`EmbeddingIndex`], and the [`RetrievalPlanner`].
//! - `citekit-answer` – [`AnswerAssembler`], [`Summarizer`], and the
//!   [`Library`] facade.
//!
//! AI services stay behind two single-method traits,
//! [`EmbeddingProvider`] and [`CompletionProvider`]. The `openai`
//! feature supplies implementations of both in the [`openai`] module;
//! any other backend plugs in the same way.
//!
//! # Example
//!
//! ```rust,ignore
//! use citekit::{Library, SummaryStyle};
//! use citekit::openai::{OpenAICompletionProvider, OpenAIEmbeddingProvider};
//!
//! let library = Library::builder()
//!     .embedding_provider(Arc::new(OpenAIEmbeddingProvider::from_env()?))
//!     .completion_provider(Arc::new(OpenAICompletionProvider::from_env()?))
//!     .build()?;
//!
//! let id = library.add_paper(title, authors, text).await?;
//! library.add_to_library(id).await?;
//!
//! let answer = library.ask("What does the corpus say about attention?", None).await?;
//! for source in &answer.sources {
//!     println!("{} ({:.2}): {}", source.title, source.relevance_score, source.excerpt);
//! }
//! ```

pub use citekit_answer::{
    AnalyzedPaper, Answer, AnswerAssembler, AnswerConfig, AnswerConfigBuilder, AnswerSource,
    CitationAnswer, CitationLabel, CompletionProvider, Library, LibraryBuilder, LibraryStats,
    NO_GROUNDING_ANSWER, PaperStats, Prompt, ReferenceDetails, RelatedCitation, RelevantCitation,
    SimilarPaper, Summarizer, SummaryStyle,
};
pub use citekit_cite::{CitationLinker, LinkerConfig, LinkerConfigBuilder};
pub use citekit_core::{
    Citation, CitationExtraction, CitationKind, CitekitError, ErrorClass, Paper, PaperId, Passage,
    PlainTextExtractor, Reference, ResolutionConfidence, Result, Span, TextExtractor,
};
pub use citekit_retrieval::{
    Chunker, EmbeddedQuery, EmbeddingIndex, EmbeddingProvider, IndexEntry, RetrievalConfig,
    RetrievalConfigBuilder, RetrievalPlanner, RetrievedPassage, SearchHit, SearchScope,
    SectionChunker,
};

/// OpenAI-backed providers, available with the `openai` feature.
#[cfg(feature = "openai")]
pub mod openai {
    pub use citekit_answer::openai::OpenAICompletionProvider;
    pub use citekit_retrieval::openai::OpenAIEmbeddingProvider;
}
