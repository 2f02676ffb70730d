//! The paper library facade.
//!
//! [`Library`] owns uploaded papers and their derived artifacts and
//! wires the chunker, citation linker, embedding index, retrieval
//! planner, and answer assembler into one surface. Papers move through
//! two stages: *uploaded* (chunked and citation-linked, queryable for
//! citations and summaries) and *in the library* (embedded and
//! searchable across papers).
//!
//! # Example
//!
//! ```rust,ignore
//! use citekit_answer::Library;
//!
//! let library = Library::builder()
//!     .embedding_provider(Arc::new(embedder))
//!     .completion_provider(Arc::new(completer))
//!     .build()?;
//!
//! let id = library.add_paper("Attention Is All You Need", authors, text).await?;
//! library.add_to_library(id).await?;
//! let answer = library.ask("what replaces recurrence?", None).await?;
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use citekit_cite::{CitationLinker, LinkerConfig};
use citekit_core::{
    Citation, CitationExtraction, CitationKind, CitekitError, Paper, PaperId, Passage, Reference,
    Result, Span, TextExtractor, floor_char_boundary,
};
use citekit_retrieval::{
    Chunker, EmbeddingIndex, EmbeddingProvider, RetrievalConfig, RetrievalPlanner,
    RetrievedPassage, SearchScope, SectionChunker,
};

use crate::assembler::{Answer, AnswerAssembler};
use crate::completion::CompletionProvider;
use crate::config::AnswerConfig;
use crate::summarize::{Summarizer, SummaryStyle};

/// How much of a paper's opening text seeds a similarity query.
const SIMILARITY_QUERY_LEN: usize = 1000;

/// A paper with its derived artifacts. Replaced wholesale by
/// [`Library::reanalyze`]; never mutated in place.
#[derive(Debug, Clone)]
pub struct AnalyzedPaper {
    /// The uploaded paper.
    pub paper: Paper,
    /// Its passages, in text order.
    pub passages: Vec<Passage>,
    /// Its citation markers and bibliography entries.
    pub extraction: CitationExtraction,
}

/// A citation marker reduced to its display fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CitationLabel {
    /// The marker's literal text.
    pub text: String,
    /// The marker's syntactic kind.
    pub kind: CitationKind,
}

/// A citation marker with the sentence it appears in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelevantCitation {
    /// The marker.
    pub citation: CitationLabel,
    /// Its surrounding context in the paper.
    pub context: String,
}

/// Answer to a single-paper question, with the citation markers whose
/// contexts touch the question's vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CitationAnswer {
    /// The grounded answer.
    pub answer: Answer,
    /// Markers whose context shares keywords with the question.
    pub relevant_citations: Vec<RelevantCitation>,
    /// Total citation markers found in the paper.
    pub citations_found: usize,
}

/// A library member ranked by similarity to a query paper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarPaper {
    /// The similar paper.
    pub paper_id: PaperId,
    /// Its title.
    pub title: String,
    /// Best passage score against the query paper's opening text.
    pub score: f32,
}

/// A bibliography entry with every marker citing it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceDetails {
    /// The bibliography entry.
    pub reference: Reference,
    /// Each citing marker with its context.
    pub citing_contexts: Vec<RelevantCitation>,
}

/// Per-paper counts reported by [`Library::stats`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaperStats {
    /// The paper.
    pub paper_id: PaperId,
    /// Its title.
    pub title: String,
    /// Passages produced by chunking.
    pub passage_count: usize,
    /// Citation markers found (compound markers count per ordinal).
    pub citation_count: usize,
    /// Bibliography entries found.
    pub reference_count: usize,
    /// Whether the paper is embedded for multi-paper search.
    pub in_library: bool,
}

/// Library-wide counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryStats {
    /// Papers uploaded.
    pub paper_count: usize,
    /// Papers embedded for search.
    pub member_count: usize,
    /// Total passages across uploaded papers.
    pub passage_count: usize,
    /// Total passages currently embedded in the index.
    pub indexed_passage_count: usize,
    /// Per-paper breakdown, ordered by paper id.
    pub papers: Vec<PaperStats>,
}

/// The paper library.
///
/// All operations take `&self`; interior state lives behind async
/// locks. Derived artifacts and index partitions swap wholesale, so
/// concurrent readers always see a paper fully-old or fully-new.
pub struct Library {
    chunker: Arc<dyn Chunker>,
    linker: CitationLinker,
    index: Arc<EmbeddingIndex>,
    planner: RetrievalPlanner,
    assembler: AnswerAssembler,
    summarizer: Summarizer,
    papers: RwLock<HashMap<PaperId, Arc<AnalyzedPaper>>>,
    members: RwLock<BTreeSet<PaperId>>,
}

impl Library {
    /// Create a new [`LibraryBuilder`].
    pub fn builder() -> LibraryBuilder {
        LibraryBuilder::default()
    }

    /// The retrieval configuration in effect.
    pub fn retrieval_config(&self) -> &RetrievalConfig {
        self.planner.config()
    }

    /// The answer configuration in effect.
    pub fn answer_config(&self) -> &AnswerConfig {
        self.assembler.config()
    }

    /// The embedding index backing multi-paper search.
    pub fn index(&self) -> &Arc<EmbeddingIndex> {
        &self.index
    }

    // ── ingestion ──────────────────────────────────────────────────

    /// Upload a paper: chunk it and link its citations.
    ///
    /// The paper is queryable for citations and summaries but not yet
    /// searchable; call [`add_to_library`](Library::add_to_library) to
    /// embed it.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::EmptyInput`] if `text` is blank.
    pub async fn add_paper(
        &self,
        title: impl Into<String>,
        authors: Vec<String>,
        text: impl Into<String>,
    ) -> Result<PaperId> {
        let analyzed = self.analyze(Paper::new(title, authors, text))?;
        let paper_id = analyzed.paper.id;
        let passage_count = analyzed.passages.len();
        self.papers.write().await.insert(paper_id, Arc::new(analyzed));
        info!(paper.id = %paper_id, passage_count, "added paper");
        Ok(paper_id)
    }

    /// Upload a paper from raw bytes via a [`TextExtractor`].
    ///
    /// # Errors
    ///
    /// Extraction failures are returned unchanged; a blank extraction
    /// is [`CitekitError::EmptyInput`].
    pub async fn add_paper_extracted(
        &self,
        extractor: &dyn TextExtractor,
        title: impl Into<String>,
        authors: Vec<String>,
        bytes: &[u8],
    ) -> Result<PaperId> {
        let text = extractor.extract(bytes).await?;
        self.add_paper(title, authors, text).await
    }

    /// Embed an uploaded paper and mark it a library member.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::PaperNotFound`] if the paper was never
    /// uploaded, plus any embedding error from the index; a failed
    /// embed leaves the paper out of the library.
    pub async fn add_to_library(&self, paper_id: PaperId) -> Result<()> {
        let analyzed = self.analyzed(paper_id).await?;
        self.index.insert(paper_id, &analyzed.passages).await?;
        self.members.write().await.insert(paper_id);
        info!(paper.id = %paper_id, "added paper to library");
        Ok(())
    }

    /// Add several papers to the library, independently.
    ///
    /// Each paper embeds on its own; one failure does not stop the
    /// others. The outcome for every requested id is returned in input
    /// order.
    pub async fn add_many_to_library(
        &self,
        paper_ids: &[PaperId],
    ) -> Vec<(PaperId, Result<()>)> {
        let tasks = paper_ids.iter().map(|id| {
            let id = *id;
            async move { (id, self.add_to_library(id).await) }
        });
        let outcomes = join_all(tasks).await;
        let failed = outcomes.iter().filter(|(_, outcome)| outcome.is_err()).count();
        info!(requested = paper_ids.len(), failed, "bulk library add finished");
        outcomes
    }

    /// Drop a paper from the search index and the membership set,
    /// keeping its uploaded artifacts. Returns whether it was a member.
    pub async fn remove_from_library(&self, paper_id: PaperId) -> bool {
        let was_member = self.members.write().await.remove(&paper_id);
        self.index.remove(paper_id).await;
        if was_member {
            info!(paper.id = %paper_id, "removed paper from library");
        }
        was_member
    }

    /// Remove a paper entirely: artifacts, membership, and index state.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::PaperNotFound`] if the paper was never
    /// uploaded.
    pub async fn remove_paper(&self, paper_id: PaperId) -> Result<()> {
        if self.papers.write().await.remove(&paper_id).is_none() {
            return Err(CitekitError::PaperNotFound { paper_id });
        }
        self.members.write().await.remove(&paper_id);
        self.index.remove(paper_id).await;
        info!(paper.id = %paper_id, "removed paper");
        Ok(())
    }

    /// Re-chunk and re-link a paper, swapping its artifacts in one
    /// step. Members are re-embedded before the swap; if re-embedding
    /// fails, the previous artifacts stay in place.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::PaperNotFound`] if the paper was never
    /// uploaded, plus any embedding error from the index.
    pub async fn reanalyze(&self, paper_id: PaperId) -> Result<()> {
        let current = self.analyzed(paper_id).await?;
        let fresh = Arc::new(self.analyze(current.paper.clone())?);
        if self.members.read().await.contains(&paper_id) {
            self.index.insert(paper_id, &fresh.passages).await?;
        }
        self.papers.write().await.insert(paper_id, fresh);
        info!(paper.id = %paper_id, "reanalyzed paper");
        Ok(())
    }

    // ── queries ────────────────────────────────────────────────────

    /// Answer a question over the library.
    ///
    /// With `scope` the search covers exactly those papers; without it,
    /// every current member. The membership set is snapshotted before
    /// searching, so concurrent additions or removals cannot tear the
    /// view.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::InvalidInput`] for a blank question,
    /// [`CitekitError::PaperNotFound`] if a scoped paper is not in the
    /// library, and service errors from embedding or completion.
    pub async fn ask(&self, question: &str, scope: Option<&[PaperId]>) -> Result<Answer> {
        let searched: Vec<PaperId> = match scope {
            Some(ids) => ids.to_vec(),
            None => self.members.read().await.iter().copied().collect(),
        };
        let retrieved = self
            .planner
            .plan(question, &SearchScope::Papers(searched.clone()), self.retrieval_config().top_k)
            .await?;
        let (titles, citations) = self.grounding_inputs(&retrieved).await;
        self.assembler.assemble(question, &retrieved, &titles, &citations, Some(&searched)).await
    }

    /// Answer a question about one paper, attaching the citation
    /// markers whose contexts share the question's vocabulary.
    ///
    /// The paper must be a library member; its sub-index is what the
    /// question searches.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::PaperNotFound`] if the paper was never
    /// uploaded or is not in the library, plus the errors of
    /// [`ask`](Library::ask).
    pub async fn ask_paper(&self, paper_id: PaperId, question: &str) -> Result<CitationAnswer> {
        let analyzed = self.analyzed(paper_id).await?;
        let retrieved = self
            .planner
            .plan(question, &SearchScope::papers([paper_id]), self.retrieval_config().top_k)
            .await?;
        let titles = HashMap::from([(paper_id, analyzed.paper.title.clone())]);
        let answer = self
            .assembler
            .assemble(
                question,
                &retrieved,
                &titles,
                &analyzed.extraction.citations,
                Some(&[paper_id]),
            )
            .await?;

        let relevant_citations = keyword_citations(
            question,
            &analyzed.extraction.citations,
            self.answer_config().max_related_citations,
        );
        let citations_found = distinct_markers(&analyzed.extraction.citations);
        info!(
            paper.id = %paper_id,
            relevant_count = relevant_citations.len(),
            "answered single-paper question"
        );
        Ok(CitationAnswer { answer, relevant_citations, citations_found })
    }

    /// Rank library members by similarity to a paper's opening text.
    ///
    /// The paper itself is excluded from the ranking. Papers with no
    /// other members to compare against rank nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::PaperNotFound`] if the paper was never
    /// uploaded, plus any embedding error.
    pub async fn similar_papers(&self, paper_id: PaperId, k: usize) -> Result<Vec<SimilarPaper>> {
        let analyzed = self.analyzed(paper_id).await?;
        let others: Vec<PaperId> = {
            let members = self.members.read().await;
            members.iter().copied().filter(|id| *id != paper_id).collect()
        };
        if others.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let text = analyzed.paper.text.as_str();
        let query = if text.len() <= SIMILARITY_QUERY_LEN {
            text
        } else {
            &text[..floor_char_boundary(text, SIMILARITY_QUERY_LEN)]
        };
        let fetch = k.saturating_mul(self.retrieval_config().overfetch_factor).max(k);
        let retrieved = self.planner.plan(query, &SearchScope::Papers(others), fetch).await?;

        // Collapse passages to each paper's best score.
        let mut best: BTreeMap<PaperId, f32> = BTreeMap::new();
        for item in retrieved {
            best.entry(item.passage.paper_id)
                .and_modify(|score| {
                    if item.score > *score {
                        *score = item.score;
                    }
                })
                .or_insert(item.score);
        }

        let papers = self.papers.read().await;
        let mut similar: Vec<SimilarPaper> = best
            .into_iter()
            .map(|(id, score)| SimilarPaper {
                paper_id: id,
                title: papers
                    .get(&id)
                    .map(|analyzed| analyzed.paper.title.clone())
                    .unwrap_or_else(|| "Untitled".to_string()),
                score,
            })
            .collect();
        similar.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.paper_id.cmp(&b.paper_id))
        });
        similar.truncate(k);
        Ok(similar)
    }

    /// A bibliography entry with every marker citing it.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::PaperNotFound`] if the paper was never
    /// uploaded and [`CitekitError::ReferenceNotFound`] if the paper
    /// has no entry with that ordinal.
    pub async fn reference_details(
        &self,
        paper_id: PaperId,
        ordinal: usize,
    ) -> Result<ReferenceDetails> {
        let analyzed = self.analyzed(paper_id).await?;
        let reference = analyzed
            .extraction
            .reference(ordinal)
            .cloned()
            .ok_or(CitekitError::ReferenceNotFound { ordinal })?;
        let citing_contexts = analyzed
            .extraction
            .citations_of(ordinal)
            .map(|citation| RelevantCitation {
                citation: CitationLabel {
                    text: citation.literal.clone(),
                    kind: citation.kind,
                },
                context: citation.context.clone(),
            })
            .collect();
        Ok(ReferenceDetails { reference, citing_contexts })
    }

    /// Summarize an uploaded paper in the given style. Membership is
    /// not required.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::PaperNotFound`] if the paper was never
    /// uploaded, plus completion errors.
    pub async fn summarize(&self, paper_id: PaperId, style: SummaryStyle) -> Result<String> {
        let analyzed = self.analyzed(paper_id).await?;
        self.summarizer.summarize(&analyzed.paper, style).await
    }

    /// Library-wide counts.
    pub async fn stats(&self) -> LibraryStats {
        let indexed_passage_count = self.index.passage_count().await;
        let papers = self.papers.read().await;
        let members = self.members.read().await;
        let mut paper_stats: Vec<PaperStats> = papers
            .values()
            .map(|analyzed| PaperStats {
                paper_id: analyzed.paper.id,
                title: analyzed.paper.title.clone(),
                passage_count: analyzed.passages.len(),
                citation_count: analyzed.extraction.citations.len(),
                reference_count: analyzed.extraction.references.len(),
                in_library: members.contains(&analyzed.paper.id),
            })
            .collect();
        paper_stats.sort_by_key(|stats| stats.paper_id);
        LibraryStats {
            paper_count: papers.len(),
            member_count: members.len(),
            passage_count: paper_stats.iter().map(|stats| stats.passage_count).sum(),
            indexed_passage_count,
            papers: paper_stats,
        }
    }

    /// An uploaded paper with its artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::PaperNotFound`] if the paper was never
    /// uploaded.
    pub async fn paper(&self, paper_id: PaperId) -> Result<Arc<AnalyzedPaper>> {
        self.analyzed(paper_id).await
    }

    /// Whether the paper is currently a library member.
    pub async fn is_member(&self, paper_id: PaperId) -> bool {
        self.members.read().await.contains(&paper_id)
    }

    /// Current members, sorted by id.
    pub async fn members(&self) -> Vec<PaperId> {
        self.members.read().await.iter().copied().collect()
    }

    // ── internals ──────────────────────────────────────────────────

    /// Chunk and citation-link a paper.
    fn analyze(&self, paper: Paper) -> Result<AnalyzedPaper> {
        let passages = self.chunker.chunk(&paper)?;
        let extraction = self.linker.extract(&paper, &passages);
        Ok(AnalyzedPaper { paper, passages, extraction })
    }

    async fn analyzed(&self, paper_id: PaperId) -> Result<Arc<AnalyzedPaper>> {
        self.papers
            .read()
            .await
            .get(&paper_id)
            .cloned()
            .ok_or(CitekitError::PaperNotFound { paper_id })
    }

    /// Titles and citations for the papers behind a retrieval result.
    async fn grounding_inputs(
        &self,
        retrieved: &[RetrievedPassage],
    ) -> (HashMap<PaperId, String>, Vec<Citation>) {
        let papers = self.papers.read().await;
        let mut titles = HashMap::new();
        let mut citations = Vec::new();
        for item in retrieved {
            let paper_id = item.passage.paper_id;
            if titles.contains_key(&paper_id) {
                continue;
            }
            if let Some(analyzed) = papers.get(&paper_id) {
                titles.insert(paper_id, analyzed.paper.title.clone());
                citations.extend(analyzed.extraction.citations.iter().cloned());
            }
        }
        (titles, citations)
    }
}

/// Markers whose context contains a question word longer than three
/// characters, one entry per marker span, capped at `max`.
fn keyword_citations(question: &str, citations: &[Citation], max: usize) -> Vec<RelevantCitation> {
    let keywords: Vec<String> = question
        .split_whitespace()
        .filter(|word| word.len() > 3)
        .map(str::to_lowercase)
        .collect();

    let mut seen: HashSet<Span> = HashSet::new();
    let mut relevant = Vec::new();
    for citation in citations {
        if relevant.len() >= max {
            break;
        }
        if !seen.insert(citation.span) {
            continue;
        }
        let context = citation.context.to_lowercase();
        if keywords.iter().any(|keyword| context.contains(keyword.as_str())) {
            relevant.push(RelevantCitation {
                citation: CitationLabel {
                    text: citation.literal.clone(),
                    kind: citation.kind,
                },
                context: citation.context.clone(),
            });
        }
    }
    relevant
}

/// Number of distinct marker spans (compound markers count once).
fn distinct_markers(citations: &[Citation]) -> usize {
    citations.iter().map(|citation| citation.span).collect::<HashSet<_>>().len()
}

/// Builder for constructing a [`Library`].
///
/// The embedding and completion providers are required; everything
/// else defaults.
#[derive(Default)]
pub struct LibraryBuilder {
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    completion_provider: Option<Arc<dyn CompletionProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
    linker_config: Option<LinkerConfig>,
    retrieval_config: Option<RetrievalConfig>,
    answer_config: Option<AnswerConfig>,
}

impl LibraryBuilder {
    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the completion provider.
    pub fn completion_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.completion_provider = Some(provider);
        self
    }

    /// Override the default chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Override the default citation linker configuration.
    pub fn linker_config(mut self, config: LinkerConfig) -> Self {
        self.linker_config = Some(config);
        self
    }

    /// Override the default retrieval configuration.
    pub fn retrieval_config(mut self, config: RetrievalConfig) -> Self {
        self.retrieval_config = Some(config);
        self
    }

    /// Override the default answer configuration.
    pub fn answer_config(mut self, config: AnswerConfig) -> Self {
        self.answer_config = Some(config);
        self
    }

    /// Build the [`Library`], validating that the providers are set.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::Config`] if a required provider is
    /// missing.
    pub fn build(self) -> Result<Library> {
        let embedding = self.embedding_provider.ok_or_else(|| {
            CitekitError::Config("embedding_provider is required".to_string())
        })?;
        let completion = self.completion_provider.ok_or_else(|| {
            CitekitError::Config("completion_provider is required".to_string())
        })?;

        let retrieval_config = self.retrieval_config.unwrap_or_default();
        let answer_config = self.answer_config.unwrap_or_default();
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(SectionChunker::new(retrieval_config.chunk_size, retrieval_config.chunk_overlap))
        });
        let linker = CitationLinker::new(self.linker_config.unwrap_or_default());

        let index = Arc::new(EmbeddingIndex::new(
            Arc::clone(&embedding),
            retrieval_config.request_timeout,
        ));
        let planner =
            RetrievalPlanner::new(Arc::clone(&embedding), Arc::clone(&index), retrieval_config);
        let assembler = AnswerAssembler::new(Arc::clone(&completion), answer_config.clone());
        let summarizer = Summarizer::new(completion, answer_config.request_timeout);

        Ok(Library {
            chunker,
            linker,
            index,
            planner,
            assembler,
            summarizer,
            papers: RwLock::new(HashMap::new()),
            members: RwLock::new(BTreeSet::new()),
        })
    }
}
