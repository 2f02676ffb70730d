//! Integration tests for retrieval planning: overlap deduplication,
//! the relevance floor, and result capping.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use citekit_core::{CitekitError, PaperId, Passage, Result, Span};
use citekit_retrieval::{
    EmbeddingIndex, EmbeddingProvider, RetrievalConfig, RetrievalPlanner, SearchScope,
};

const MODEL: &str = "stub-embed";

/// Embedding provider that returns a fixed vector per exact text.
struct KeyedEmbedder {
    table: HashMap<String, Vec<f32>>,
}

impl KeyedEmbedder {
    fn new(entries: &[(&str, &[f32])]) -> Self {
        let table = entries
            .iter()
            .map(|(text, vector)| (text.to_string(), vector.to_vec()))
            .collect();
        Self { table }
    }
}

#[async_trait]
impl EmbeddingProvider for KeyedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.table
            .get(text)
            .cloned()
            .ok_or_else(|| CitekitError::EmbeddingService {
                provider: MODEL.to_string(),
                message: format!("no stub vector for {text:?}"),
            })
    }

    fn dimensions(&self) -> usize {
        2
    }

    fn model_id(&self) -> &str {
        MODEL
    }
}

fn passage(paper_id: PaperId, index: usize, start: usize, text: &str) -> Passage {
    Passage {
        paper_id,
        index,
        span: Span::new(start, start + text.len()),
        text: text.to_string(),
    }
}

fn planner_over(
    provider: KeyedEmbedder,
    config: RetrievalConfig,
) -> (RetrievalPlanner, Arc<EmbeddingIndex>) {
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(provider);
    let index = Arc::new(EmbeddingIndex::new(
        Arc::clone(&provider),
        Duration::from_secs(5),
    ));
    let planner = RetrievalPlanner::new(provider, Arc::clone(&index), config);
    (planner, index)
}

#[tokio::test]
async fn overlapping_passages_keep_only_the_best_scored() {
    let provider = KeyedEmbedder::new(&[
        ("where is the anchor", &[1.0, 0.0]),
        ("anchor text a", &[1.0, 0.0]),
        ("anchor text b", &[0.8, 0.2]),
        ("anchor text c", &[0.0, 1.0]),
    ]);
    let (planner, index) = planner_over(provider, RetrievalConfig::default());

    let paper = PaperId::new();
    index
        .insert(
            paper,
            &[
                passage(paper, 0, 0, "anchor text a"),
                // Overlaps the first passage's span, so only one of the
                // two may survive planning.
                passage(paper, 1, 5, "anchor text b"),
                passage(paper, 2, 200, "anchor text c"),
            ],
        )
        .await
        .unwrap();

    let results = planner
        .plan("where is the anchor", &SearchScope::All, 8)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].passage.text, "anchor text a");
    assert_eq!(results[1].passage.text, "anchor text c");
    assert!(results[0].score > results[1].score);
}

#[tokio::test]
async fn relevance_floor_drops_weak_matches() {
    let provider = KeyedEmbedder::new(&[
        ("unrelated question", &[1.0, 0.0]),
        // Points away from the query: cosine -0.4, normalized 0.3.
        ("off-topic passage", &[-0.4, 0.916_515_1]),
    ]);
    let config = RetrievalConfig::builder()
        .relevance_floor(0.5)
        .build()
        .unwrap();
    let (planner, index) = planner_over(provider, config);

    let paper = PaperId::new();
    index
        .insert(paper, &[passage(paper, 0, 0, "off-topic passage")])
        .await
        .unwrap();

    let results = planner
        .plan("unrelated question", &SearchScope::All, 8)
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn results_are_capped_at_k() {
    let provider = KeyedEmbedder::new(&[
        ("rank them", &[1.0, 0.0]),
        ("p0", &[1.0, 0.0]),
        ("p1", &[0.9, 0.435_89]),
        ("p2", &[0.6, 0.8]),
        ("p3", &[0.0, 1.0]),
        ("p4", &[-0.6, 0.8]),
    ]);
    let (planner, index) = planner_over(provider, RetrievalConfig::default());

    let paper = PaperId::new();
    let passages: Vec<Passage> = ["p0", "p1", "p2", "p3", "p4"]
        .iter()
        .enumerate()
        .map(|(i, text)| passage(paper, i, i * 100, text))
        .collect();
    index.insert(paper, &passages).await.unwrap();

    let results = planner.plan("rank them", &SearchScope::All, 2).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].passage.text, "p0");
    assert_eq!(results[1].passage.text, "p1");
}

#[tokio::test]
async fn blank_question_is_rejected() {
    let provider = KeyedEmbedder::new(&[]);
    let (planner, _index) = planner_over(provider, RetrievalConfig::default());

    let err = planner
        .plan("   \n", &SearchScope::All, 5)
        .await
        .unwrap_err();
    assert!(matches!(err, CitekitError::InvalidInput { .. }));
}

#[tokio::test]
async fn empty_scope_list_yields_no_results() {
    let provider = KeyedEmbedder::new(&[("anything", &[1.0, 0.0])]);
    let (planner, _index) = planner_over(provider, RetrievalConfig::default());

    let results = planner
        .plan("anything", &SearchScope::Papers(Vec::new()), 5)
        .await
        .unwrap();
    assert!(results.is_empty());
}

mod prop_overlap_dedup {
    use super::*;
    use proptest::prelude::*;

    const QUESTION: &str = "locate the strongest passage";

    /// Passage geometry and direction: `(start, len, angle)` triples.
    /// Lengths stay positive so spans are non-empty and free to overlap;
    /// the angle turns into a unit vector, so every score is defined.
    fn arb_passages() -> impl Strategy<Value = Vec<(usize, usize, f32)>> {
        proptest::collection::vec(
            (0usize..500, 1usize..80, 0.0f32..std::f32::consts::TAU),
            1..12,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// However the stored spans overlap, planned results from the
        /// same paper never do: a kept passage shadows every overlapping
        /// lower-scored one. Results stay score-ordered and capped at k.
        #[test]
        fn planned_results_never_overlap_within_a_paper(
            shapes in arb_passages(),
            k in 1usize..10,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let texts: Vec<String> =
                    (0..shapes.len()).map(|i| format!("passage {i}")).collect();
                let vectors: Vec<Vec<f32>> = shapes
                    .iter()
                    .map(|&(_, _, angle)| vec![angle.cos(), angle.sin()])
                    .collect();
                let mut entries: Vec<(&str, &[f32])> = texts
                    .iter()
                    .map(String::as_str)
                    .zip(vectors.iter().map(Vec::as_slice))
                    .collect();
                entries.push((QUESTION, &[1.0, 0.0]));

                let (planner, index) =
                    planner_over(KeyedEmbedder::new(&entries), RetrievalConfig::default());

                let paper = PaperId::new();
                let passages: Vec<Passage> = shapes
                    .iter()
                    .enumerate()
                    .map(|(i, &(start, len, _))| Passage {
                        paper_id: paper,
                        index: i,
                        span: Span::new(start, start + len),
                        text: texts[i].clone(),
                    })
                    .collect();
                index.insert(paper, &passages).await.unwrap();

                planner.plan(QUESTION, &SearchScope::All, k).await.unwrap()
            });

            prop_assert!(results.len() <= k);
            for pair in results.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
            for (i, left) in results.iter().enumerate() {
                for right in &results[i + 1..] {
                    prop_assert!(
                        !left.passage.span.overlaps(right.passage.span),
                        "kept passages overlap: {:?} and {:?}",
                        left.passage.span,
                        right.passage.span,
                    );
                }
            }
        }
    }
}
