//! Per-paper embedding index with scoped, fan-out search.
//!
//! The index keeps one partition per paper. Partitions are immutable
//! snapshots behind `Arc`: writers build a replacement partition off to
//! the side and swap it in, so searches either see a paper's previous
//! state or its new state, never a half-written one. Searches scan the
//! selected partitions concurrently and merge into one ranked list.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use citekit_core::{CitekitError, PaperId, Passage, Result};

use crate::embedding::{EmbeddedQuery, EmbeddingProvider};

/// A stored passage with its embedding vector.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// The embedded passage.
    pub passage: Passage,
    /// The embedding vector, produced by the index's provider.
    pub vector: Vec<f32>,
}

/// A passage returned from a search, paired with its normalized score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// The matched passage.
    pub passage: Passage,
    /// Normalized similarity in `[0, 1]` (higher is more relevant).
    pub score: f32,
}

/// Which papers a search covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchScope {
    /// Every paper currently in the index.
    All,
    /// Exactly the listed papers. Searching a paper that is not in the
    /// index is an error, not an empty result.
    Papers(Vec<PaperId>),
}

impl SearchScope {
    /// Scope a search to the given papers.
    pub fn papers(ids: impl IntoIterator<Item = PaperId>) -> Self {
        SearchScope::Papers(ids.into_iter().collect())
    }
}

/// One paper's embedded passages, tagged with the producing model.
#[derive(Debug)]
struct Partition {
    model: String,
    entries: Vec<IndexEntry>,
}

impl Partition {
    /// Score every entry against `vector` and return the top `limit`.
    fn scan(&self, vector: &[f32], limit: usize) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                passage: entry.passage.clone(),
                score: normalized_cosine(&entry.vector, vector),
            })
            .collect();
        sort_hits(&mut hits);
        hits.truncate(limit);
        hits
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Map cosine similarity from `[-1, 1]` onto `[0, 1]`, monotonically.
/// Clamped, since accumulated rounding can push the raw cosine a hair
/// outside `[-1, 1]`.
fn normalized_cosine(a: &[f32], b: &[f32]) -> f32 {
    ((cosine_similarity(a, b) + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Order hits by descending score; ties break by ascending
/// `(paper_id, span.start)` so merged rankings are deterministic.
pub(crate) fn sort_hits(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.passage.paper_id.cmp(&b.passage.paper_id))
            .then_with(|| a.passage.span.start.cmp(&b.passage.span.start))
    });
}

/// The per-paper embedding index.
///
/// Writes to different papers proceed independently; writes to the same
/// paper serialize on a per-paper lock. Inserts are all-or-nothing: a
/// failed embedding call leaves the paper's previous partition (or its
/// absence) untouched.
pub struct EmbeddingIndex {
    provider: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
    partitions: RwLock<HashMap<PaperId, Arc<Partition>>>,
    writers: Mutex<HashMap<PaperId, Arc<Mutex<()>>>>,
}

impl EmbeddingIndex {
    /// Create an index over the given provider.
    ///
    /// `timeout` bounds each external embedding call made by
    /// [`insert`](EmbeddingIndex::insert).
    pub fn new(provider: Arc<dyn EmbeddingProvider>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout,
            partitions: RwLock::new(HashMap::new()),
            writers: Mutex::new(HashMap::new()),
        }
    }

    /// The embedding provider backing this index.
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Identifier of the model whose vectors this index stores.
    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    /// Embed `passages` and store them as the paper's partition,
    /// replacing any previous partition for the same paper.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::EmbeddingService`] if the provider call
    /// fails, [`CitekitError::ServiceTimeout`] if it exceeds the index
    /// timeout, and [`CitekitError::DimensionMismatch`] if a returned
    /// vector has the wrong width. On any error the index is unchanged.
    pub async fn insert(&self, paper_id: PaperId, passages: &[Passage]) -> Result<()> {
        let writer = self.writer(paper_id).await;
        let _guard = writer.lock().await;

        let texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
        let vectors = tokio::time::timeout(self.timeout, self.provider.embed_batch(&texts))
            .await
            .map_err(|_| CitekitError::ServiceTimeout {
                service: "embedding".to_string(),
                timeout: self.timeout,
            })??;

        if vectors.len() != passages.len() {
            return Err(CitekitError::EmbeddingService {
                provider: self.provider.model_id().to_string(),
                message: format!("expected {} vectors, got {}", passages.len(), vectors.len()),
            });
        }
        let expected = self.provider.dimensions();
        for vector in &vectors {
            if vector.len() != expected {
                return Err(CitekitError::DimensionMismatch { expected, actual: vector.len() });
            }
        }

        let mut entries: Vec<IndexEntry> = passages
            .iter()
            .cloned()
            .zip(vectors)
            .map(|(passage, vector)| IndexEntry { passage, vector })
            .collect();
        entries.sort_by_key(|e| e.passage.span);
        let partition =
            Arc::new(Partition { model: self.provider.model_id().to_string(), entries });

        self.partitions.write().await.insert(paper_id, partition);
        info!(paper.id = %paper_id, passage_count = passages.len(), "indexed paper");
        Ok(())
    }

    /// Drop a paper's partition. Returns whether one existed.
    pub async fn remove(&self, paper_id: PaperId) -> bool {
        let writer = self.writer(paper_id).await;
        let _guard = writer.lock().await;

        let removed = self.partitions.write().await.remove(&paper_id).is_some();
        if removed {
            info!(paper.id = %paper_id, "removed paper from index");
        }
        removed
    }

    /// True if the paper has a partition.
    pub async fn contains(&self, paper_id: PaperId) -> bool {
        self.partitions.read().await.contains_key(&paper_id)
    }

    /// Number of papers in the index.
    pub async fn paper_count(&self) -> usize {
        self.partitions.read().await.len()
    }

    /// Total number of embedded passages across all papers.
    pub async fn passage_count(&self) -> usize {
        self.partitions.read().await.values().map(|p| p.entries.len()).sum()
    }

    /// Identifiers of all indexed papers, sorted.
    pub async fn indexed_papers(&self) -> Vec<PaperId> {
        let mut ids: Vec<PaperId> = self.partitions.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Search the scoped partitions for the `limit` nearest passages.
    ///
    /// Partition snapshots are taken under the read lock, then scanned
    /// concurrently without it; results merge into one list ordered by
    /// descending score with deterministic tie-breaks.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::PaperNotFound`] if a scoped paper has no
    /// partition, [`CitekitError::ModelMismatch`] if the query's model
    /// tag differs from the stored vectors' tag, and
    /// [`CitekitError::DimensionMismatch`] if the query vector has the
    /// wrong width.
    pub async fn search(
        &self,
        query: &EmbeddedQuery,
        scope: &SearchScope,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let expected = self.provider.dimensions();
        if query.vector.len() != expected {
            return Err(CitekitError::DimensionMismatch {
                expected,
                actual: query.vector.len(),
            });
        }

        let selected: Vec<Arc<Partition>> = {
            let partitions = self.partitions.read().await;
            match scope {
                SearchScope::All => partitions.values().cloned().collect(),
                SearchScope::Papers(ids) => {
                    let unique: BTreeSet<PaperId> = ids.iter().copied().collect();
                    let mut selected = Vec::with_capacity(unique.len());
                    for id in unique {
                        let partition = partitions
                            .get(&id)
                            .ok_or(CitekitError::PaperNotFound { paper_id: id })?;
                        selected.push(Arc::clone(partition));
                    }
                    selected
                }
            }
        };

        for partition in &selected {
            if partition.model != query.model {
                return Err(CitekitError::ModelMismatch {
                    indexed: partition.model.clone(),
                    query: query.model.clone(),
                });
            }
        }

        let vector = Arc::new(query.vector.clone());
        let tasks: Vec<_> = selected
            .into_iter()
            .map(|partition| {
                let vector = Arc::clone(&vector);
                tokio::task::spawn_blocking(move || partition.scan(&vector, limit))
            })
            .collect();

        let mut hits = Vec::new();
        for outcome in join_all(tasks).await {
            let partial = outcome
                .map_err(|e| CitekitError::Internal(format!("partition scan failed: {e}")))?;
            hits.extend(partial);
        }

        sort_hits(&mut hits);
        hits.truncate(limit);
        debug!(hit_count = hits.len(), limit, "index search merged");
        Ok(hits)
    }

    /// Per-paper writer lock, created on first use.
    async fn writer(&self, paper_id: PaperId) -> Arc<Mutex<()>> {
        let mut writers = self.writers.lock().await;
        Arc::clone(writers.entry(paper_id).or_default())
    }
}
