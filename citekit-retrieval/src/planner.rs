//! Retrieval planning: embed, overfetch, dedup, floor, truncate.

use std::sync::Arc;

use tracing::debug;

use citekit_core::{CitekitError, Passage, Result};

use crate::config::RetrievalConfig;
use crate::embedding::{EmbeddedQuery, EmbeddingProvider};
use crate::index::{EmbeddingIndex, SearchHit, SearchScope};

/// A passage selected by a retrieval plan.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedPassage {
    /// The selected passage.
    pub passage: Passage,
    /// Normalized similarity in `[0, 1]`.
    pub score: f32,
}

/// Turns a question into a ranked, deduplicated set of grounding passages.
///
/// The planner overfetches from the index so that overlap dedup and the
/// relevance floor have slack to work with, then cuts the survivors to
/// `k`. An empty result is a valid outcome, not an error.
pub struct RetrievalPlanner {
    provider: Arc<dyn EmbeddingProvider>,
    index: Arc<EmbeddingIndex>,
    config: RetrievalConfig,
}

impl RetrievalPlanner {
    /// Create a planner over the given provider and index.
    ///
    /// The provider should be the same one the index embeds with;
    /// queries embedded elsewhere are rejected by the index's model
    /// tag check.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        index: Arc<EmbeddingIndex>,
        config: RetrievalConfig,
    ) -> Self {
        Self { provider, index, config }
    }

    /// The planner's configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Plan retrieval for `question` over `scope`, returning at most
    /// `k` passages ordered by descending score.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::InvalidInput`] for a blank question,
    /// [`CitekitError::ServiceTimeout`] if embedding the question
    /// exceeds the configured deadline, and whatever the index search
    /// reports (missing scoped papers, model or dimension mismatches).
    pub async fn plan(
        &self,
        question: &str,
        scope: &SearchScope,
        k: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        if question.trim().is_empty() {
            return Err(CitekitError::InvalidInput {
                message: "question must not be empty".to_string(),
            });
        }

        // 1. Embed the question, tagged with the producing model
        let vector = tokio::time::timeout(
            self.config.request_timeout,
            self.provider.embed(question),
        )
        .await
        .map_err(|_| CitekitError::ServiceTimeout {
            service: "embedding".to_string(),
            timeout: self.config.request_timeout,
        })??;
        let query = EmbeddedQuery::new(vector, self.provider.model_id());

        // 2. Overfetch so dedup and the floor have candidates to spare
        let fetch = k.saturating_mul(self.config.overfetch_factor).max(k);
        let hits = self.index.search(&query, scope, fetch).await?;

        // 3. Drop hits overlapping an already-kept higher-scored hit
        //    from the same paper; hits arrive ordered by score
        let mut kept: Vec<SearchHit> = Vec::new();
        for hit in hits {
            let shadowed = kept.iter().any(|k| {
                k.passage.paper_id == hit.passage.paper_id
                    && k.passage.span.overlaps(hit.passage.span)
            });
            if !shadowed {
                kept.push(hit);
            }
        }

        // 4. Apply the relevance floor, then cut to k
        kept.retain(|hit| hit.score >= self.config.relevance_floor);
        kept.truncate(k);

        debug!(result_count = kept.len(), k, "retrieval plan complete");
        Ok(kept
            .into_iter()
            .map(|hit| RetrievedPassage { passage: hit.passage, score: hit.score })
            .collect())
    }
}
