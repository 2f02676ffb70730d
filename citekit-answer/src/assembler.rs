//! Grounded answer assembly.
//!
//! The [`AnswerAssembler`] turns retrieved passages into one completion
//! request and pairs the generated text with the exact passages it was
//! grounded on. Every passage placed in the model's context appears in
//! the answer's source list; the assembler never answers from passages
//! it did not disclose.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use citekit_core::{
    Citation, CitationKind, CitekitError, PaperId, Result, Span, floor_char_boundary,
};
use citekit_retrieval::RetrievedPassage;

use crate::completion::{CompletionProvider, Prompt};
use crate::config::AnswerConfig;

/// The fixed answer returned when retrieval produced nothing to ground
/// on. No completion request is made in that case.
pub const NO_GROUNDING_ANSWER: &str = "No relevant information found in the papers.";

const SYSTEM_PROMPT: &str = "You are a research assistant that answers questions based on \
     multiple research papers. Provide comprehensive answers and cite which papers support \
     your statements.";

/// A passage disclosed to the completion model, with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerSource {
    /// The paper the passage came from.
    pub paper_id: PaperId,
    /// Title of that paper.
    pub title: String,
    /// Opening of the context text placed in the prompt, capped at the
    /// configured excerpt length.
    pub excerpt: String,
    /// Normalized relevance score from retrieval.
    pub relevance_score: f32,
    /// The passage's span in the paper's raw text.
    pub span: Span,
}

/// A citation marker whose surrounding context overlaps a used passage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelatedCitation {
    /// The paper the marker appears in.
    pub paper_id: PaperId,
    /// The marker's literal text, e.g. `[3]` or `(Smith, 2020)`.
    pub text: String,
    /// The marker's syntactic kind.
    pub kind: CitationKind,
}

/// A generated answer with its grounding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// The generated answer text.
    pub text: String,
    /// Exactly the passages placed in the completion context, in the
    /// order they were placed.
    pub sources: Vec<AnswerSource>,
    /// Citation markers near the passages the answer drew on.
    pub related_citations: Vec<RelatedCitation>,
    /// The papers the retrieval covered.
    pub papers_searched: Vec<PaperId>,
    /// Number of passages retrieval produced before the context budget
    /// was applied.
    pub results_found: usize,
}

/// Assembles grounded answers from retrieved passages.
///
/// Construct with a [`CompletionProvider`] and an [`AnswerConfig`];
/// call [`assemble`](AnswerAssembler::assemble) once per question.
pub struct AnswerAssembler {
    provider: Arc<dyn CompletionProvider>,
    config: AnswerConfig,
}

impl AnswerAssembler {
    /// Create an assembler over the given provider.
    pub fn new(provider: Arc<dyn CompletionProvider>, config: AnswerConfig) -> Self {
        Self { provider, config }
    }

    /// The assembler's configuration.
    pub fn config(&self) -> &AnswerConfig {
        &self.config
    }

    /// Assemble an answer to `question` from `retrieved` passages.
    ///
    /// `titles` maps paper ids to display titles for the prompt and the
    /// source list. `citations` supplies the markers considered for
    /// [`Answer::related_citations`]. `searched` names the papers the
    /// retrieval covered; when `None`, the papers appearing in the
    /// sources are reported instead.
    ///
    /// An empty `retrieved` set short-circuits to the fixed
    /// [`NO_GROUNDING_ANSWER`] without calling the provider.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::InvalidInput`] if the question is blank
    /// and [`CitekitError::CompletionUnavailable`] if the completion
    /// call fails or exceeds the configured timeout.
    pub async fn assemble(
        &self,
        question: &str,
        retrieved: &[RetrievedPassage],
        titles: &HashMap<PaperId, String>,
        citations: &[Citation],
        searched: Option<&[PaperId]>,
    ) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(CitekitError::InvalidInput {
                message: "question must not be empty".to_string(),
            });
        }

        if retrieved.is_empty() {
            return Ok(Answer {
                text: NO_GROUNDING_ANSWER.to_string(),
                sources: Vec::new(),
                related_citations: Vec::new(),
                papers_searched: searched.unwrap_or_default().to_vec(),
                results_found: 0,
            });
        }

        // 1. Build the grounding context in score order, truncating to
        //    the character budget. Each block pushed here pushes its
        //    source in the same step, so the disclosure list cannot
        //    drift from the prompt.
        let mut context_parts = Vec::new();
        let mut sources = Vec::new();
        let mut used = 0usize;
        for item in retrieved {
            let remaining = self.config.context_budget.saturating_sub(used);
            if remaining == 0 {
                break;
            }
            let text = item.passage.text.as_str();
            let content = if text.len() > remaining {
                &text[..floor_char_boundary(text, remaining)]
            } else {
                text
            };
            if content.is_empty() {
                break;
            }

            let title = titles
                .get(&item.passage.paper_id)
                .map(String::as_str)
                .unwrap_or("Untitled");
            context_parts.push(format!("From '{title}':\n{content}"));
            sources.push(AnswerSource {
                paper_id: item.passage.paper_id,
                title: title.to_string(),
                excerpt: excerpt(content, self.config.excerpt_length),
                relevance_score: item.score,
                span: item.passage.span,
            });
            used += content.len();
        }
        let context = context_parts.join("\n\n");

        // 2. One completion request over that context.
        let prompt = Prompt::new(
            SYSTEM_PROMPT,
            format!(
                "Question: {question}\n\nContext from research papers:\n{context}\n\n\
                 Please provide a comprehensive answer based on the information from these \
                 papers. When possible, mention which specific papers support different points."
            ),
            self.config.answer_tokens,
        );
        let reply = tokio::time::timeout(self.config.request_timeout, self.provider.complete(&prompt))
            .await
            .map_err(|_| {
                error!(timeout = ?self.config.request_timeout, "completion timed out");
                CitekitError::CompletionUnavailable {
                    provider: self.provider.model_id().to_string(),
                    message: format!("no completion within {:?}", self.config.request_timeout),
                }
            })??;

        // 3. Attach citation markers whose context overlaps a disclosed
        //    passage.
        let related_citations = self.related_citations(&sources, citations);

        let papers_searched = match searched {
            Some(ids) => ids.to_vec(),
            None => {
                let mut seen = Vec::new();
                for source in &sources {
                    if !seen.contains(&source.paper_id) {
                        seen.push(source.paper_id);
                    }
                }
                seen
            }
        };

        info!(
            source_count = sources.len(),
            related_count = related_citations.len(),
            "assembled answer"
        );

        Ok(Answer {
            text: reply.trim().to_string(),
            sources,
            related_citations,
            papers_searched,
            results_found: retrieved.len(),
        })
    }

    /// Markers whose captured context overlaps a disclosed passage, one
    /// per marker span, capped at the configured maximum.
    fn related_citations(
        &self,
        sources: &[AnswerSource],
        citations: &[Citation],
    ) -> Vec<RelatedCitation> {
        let mut seen: HashSet<(PaperId, Span)> = HashSet::new();
        let mut related = Vec::new();
        for citation in citations {
            if related.len() >= self.config.max_related_citations {
                break;
            }
            let touches_source = sources.iter().any(|source| {
                source.paper_id == citation.paper_id && citation.context_span.overlaps(source.span)
            });
            if touches_source && seen.insert((citation.paper_id, citation.span)) {
                related.push(RelatedCitation {
                    paper_id: citation.paper_id,
                    text: citation.literal.clone(),
                    kind: citation.kind,
                });
            }
        }
        related
    }
}

/// The opening of `text`, capped at `limit` bytes on a char boundary,
/// with an ellipsis when anything was cut.
fn excerpt(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let cut = floor_char_boundary(text, limit);
    format!("{}...", &text[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use citekit_core::{Passage, ResolutionConfidence};

    /// Provider that records every prompt and replies with a fixed text.
    struct ScriptedProvider {
        reply: String,
        prompts: Mutex<Vec<Prompt>>,
    }

    impl ScriptedProvider {
        fn new(reply: &str) -> Self {
            Self { reply: reply.to_string(), prompts: Mutex::new(Vec::new()) }
        }

        fn prompt_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        fn last_prompt(&self) -> Prompt {
            self.prompts.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, prompt: &Prompt) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.clone());
            Ok(self.reply.clone())
        }

        fn model_id(&self) -> &str {
            "scripted"
        }
    }

    /// Provider that never answers in time.
    struct StalledProvider;

    #[async_trait]
    impl CompletionProvider for StalledProvider {
        async fn complete(&self, _prompt: &Prompt) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }

        fn model_id(&self) -> &str {
            "stalled"
        }
    }

    fn retrieved(paper_id: PaperId, index: usize, start: usize, text: &str, score: f32) -> RetrievedPassage {
        RetrievedPassage {
            passage: Passage {
                paper_id,
                index,
                span: Span::new(start, start + text.len()),
                text: text.to_string(),
            },
            score,
        }
    }

    fn titles_of(entries: &[(PaperId, &str)]) -> HashMap<PaperId, String> {
        entries.iter().map(|(id, title)| (*id, title.to_string())).collect()
    }

    #[tokio::test]
    async fn empty_retrieval_answers_without_a_completion_call() {
        let provider = Arc::new(ScriptedProvider::new("should not be used"));
        let assembler = AnswerAssembler::new(provider.clone(), AnswerConfig::default());

        let answer = assembler
            .assemble("any question", &[], &HashMap::new(), &[], None)
            .await
            .unwrap();

        assert_eq!(answer.text, NO_GROUNDING_ANSWER);
        assert!(answer.sources.is_empty());
        assert!(answer.related_citations.is_empty());
        assert_eq!(answer.results_found, 0);
        assert_eq!(provider.prompt_count(), 0);
    }

    #[tokio::test]
    async fn every_context_passage_appears_in_sources() {
        let provider = Arc::new(ScriptedProvider::new("  the answer  "));
        let assembler = AnswerAssembler::new(provider.clone(), AnswerConfig::default());

        let a = PaperId::new();
        let b = PaperId::new();
        let items = vec![
            retrieved(a, 0, 0, "attention replaces recurrence entirely", 0.9),
            retrieved(b, 0, 0, "convolution remains useful for vision", 0.7),
        ];
        let titles = titles_of(&[(a, "Paper A"), (b, "Paper B")]);

        let answer = assembler
            .assemble("what replaces recurrence?", &items, &titles, &[], None)
            .await
            .unwrap();

        assert_eq!(answer.text, "the answer");
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.sources[0].title, "Paper A");
        assert_eq!(answer.sources[1].title, "Paper B");
        assert_eq!(answer.results_found, 2);
        assert_eq!(answer.papers_searched, vec![a, b]);

        // The prompt contains exactly one context block per source.
        let prompt = provider.last_prompt();
        assert_eq!(prompt.user.matches("From '").count(), answer.sources.len());
        assert!(prompt.user.contains("From 'Paper A':\nattention replaces recurrence entirely"));
        assert!(prompt.system.contains("research assistant"));
    }

    #[tokio::test]
    async fn context_budget_truncates_and_drops_in_score_order() {
        let provider = Arc::new(ScriptedProvider::new("ok"));
        let config = AnswerConfig::builder().context_budget(50).build().unwrap();
        let assembler = AnswerAssembler::new(provider.clone(), config);

        let a = PaperId::new();
        let items = vec![
            retrieved(a, 0, 0, &"x".repeat(40), 0.9),
            retrieved(a, 1, 100, &"y".repeat(40), 0.8),
            retrieved(a, 2, 200, &"z".repeat(40), 0.7),
        ];
        let titles = titles_of(&[(a, "Long Paper")]);

        let answer = assembler
            .assemble("q", &items, &titles, &[], None)
            .await
            .unwrap();

        // First passage fits whole, second is cut to the 10 remaining
        // chars, third never reaches the context.
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.sources[1].excerpt, "y".repeat(10));
        assert_eq!(answer.results_found, 3);
        let prompt = provider.last_prompt();
        assert_eq!(prompt.user.matches("From '").count(), 2);
        assert!(!prompt.user.contains('z'));
    }

    #[tokio::test]
    async fn long_excerpts_are_cut_with_an_ellipsis() {
        let provider = Arc::new(ScriptedProvider::new("ok"));
        let config = AnswerConfig::builder().excerpt_length(10).build().unwrap();
        let assembler = AnswerAssembler::new(provider.clone(), config);

        let a = PaperId::new();
        let items = vec![retrieved(a, 0, 0, "abcdefghijKLMNOP", 0.9)];
        let titles = titles_of(&[(a, "P")]);

        let answer = assembler.assemble("q", &items, &titles, &[], None).await.unwrap();
        assert_eq!(answer.sources[0].excerpt, "abcdefghij...");
    }

    #[tokio::test]
    async fn related_citations_overlap_used_passages() {
        let provider = Arc::new(ScriptedProvider::new("ok"));
        let assembler = AnswerAssembler::new(provider.clone(), AnswerConfig::default());

        let a = PaperId::new();
        let items = vec![retrieved(a, 0, 100, "the cited claim [3] holds", 0.9)];
        let titles = titles_of(&[(a, "P")]);

        let near = Citation {
            paper_id: a,
            literal: "[3]".to_string(),
            kind: CitationKind::Numeric,
            span: Span::new(116, 119),
            passage_span: Span::new(100, 125),
            offset_in_passage: 16,
            reference: Some(3),
            confidence: ResolutionConfidence::Exact,
            context: "the cited claim [3] holds".to_string(),
            context_span: Span::new(100, 125),
        };
        let mut far = near.clone();
        far.span = Span::new(900, 903);
        far.context_span = Span::new(890, 930);
        // Second ordinal of the same compound marker: same span, so it
        // must not produce a second entry.
        let mut sibling = near.clone();
        sibling.reference = Some(4);

        let answer = assembler
            .assemble("q", &items, &titles, &[near, far, sibling], None)
            .await
            .unwrap();

        assert_eq!(answer.related_citations.len(), 1);
        assert_eq!(answer.related_citations[0].text, "[3]");
        assert_eq!(answer.related_citations[0].kind, CitationKind::Numeric);
    }

    #[tokio::test]
    async fn scoped_papers_are_echoed_in_papers_searched() {
        let provider = Arc::new(ScriptedProvider::new("ok"));
        let assembler = AnswerAssembler::new(provider.clone(), AnswerConfig::default());

        let a = PaperId::new();
        let b = PaperId::new();
        let items = vec![retrieved(a, 0, 0, "only paper a matched", 0.9)];
        let titles = titles_of(&[(a, "A")]);

        let answer = assembler
            .assemble("q", &items, &titles, &[], Some(&[a, b]))
            .await
            .unwrap();
        assert_eq!(answer.papers_searched, vec![a, b]);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_completion_times_out_as_unavailable() {
        let config = AnswerConfig::builder()
            .request_timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let assembler = AnswerAssembler::new(Arc::new(StalledProvider), config);

        let a = PaperId::new();
        let items = vec![retrieved(a, 0, 0, "some grounding", 0.9)];
        let titles = titles_of(&[(a, "P")]);

        let err = assembler.assemble("q", &items, &titles, &[], None).await.unwrap_err();
        assert!(matches!(err, CitekitError::CompletionUnavailable { .. }));
    }

    #[tokio::test]
    async fn blank_question_is_rejected() {
        let assembler =
            AnswerAssembler::new(Arc::new(ScriptedProvider::new("ok")), AnswerConfig::default());
        let err = assembler
            .assemble("  ", &[], &HashMap::new(), &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, CitekitError::InvalidInput { .. }));
    }
}
