//! Retrieval for citekit: chunking, embedding, and scoped search.
//!
//! This crate turns papers into byte-addressed passages
//! ([`SectionChunker`]), embeds them through an [`EmbeddingProvider`],
//! stores them in a per-paper [`EmbeddingIndex`], and plans grounded
//! retrieval ([`RetrievalPlanner`]): embed the question, overfetch,
//! drop overlapping duplicates, apply the relevance floor, truncate.
//!
//! The index is strict about comparability. Every stored vector carries
//! the producing model's tag, query vectors carry theirs, and a search
//! across mismatched tags fails with a typed error instead of returning
//! garbage rankings. Scores are cosine similarity mapped monotonically
//! onto `[0, 1]`.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use citekit_retrieval::{
//!     Chunker, EmbeddingIndex, RetrievalConfig, RetrievalPlanner, SearchScope, SectionChunker,
//! };
//!
//! let config = RetrievalConfig::default();
//! let index = Arc::new(EmbeddingIndex::new(provider.clone(), config.request_timeout));
//! let planner = RetrievalPlanner::new(provider, index.clone(), config);
//!
//! let passages = SectionChunker::default().chunk(&paper)?;
//! index.insert(paper.id, &passages).await?;
//! let results = planner.plan("What is attention?", &SearchScope::All, 8).await?;
//! ```

mod chunk;
mod config;
mod embedding;
mod index;
mod planner;

#[cfg(feature = "openai")]
pub mod openai;

pub use chunk::{Chunker, SectionChunker};
pub use config::{RetrievalConfig, RetrievalConfigBuilder};
pub use embedding::{EmbeddedQuery, EmbeddingProvider};
pub use index::{EmbeddingIndex, IndexEntry, SearchHit, SearchScope};
pub use planner::{RetrievalPlanner, RetrievedPassage};
