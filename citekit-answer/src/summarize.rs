//! Style-driven paper summarization.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use citekit_core::{CitekitError, Paper, Result, ceil_char_boundary, floor_char_boundary};

use crate::completion::{CompletionProvider, Prompt};

/// Character budget for the paper text sent with a summary request.
const INPUT_BUDGET: usize = 4000;

/// Smaller budget for the plain-language style, which also carries the
/// title and framing instructions.
const PLAIN_INPUT_BUDGET: usize = 3000;

/// The angle a summary takes on the paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStyle {
    /// Whole-paper summary of problem, approach, and findings.
    Overview,
    /// Methodology, experimental setup, data, and metrics.
    Methods,
    /// Experimental results, comparisons, and findings.
    Results,
    /// Acknowledged limitations and future work.
    Limitations,
    /// Jargon-free explanation for a general audience.
    Plain,
}

/// Produces one-shot summaries of a paper in a chosen style.
///
/// Each style selects the slice of the paper most likely to carry the
/// relevant material and issues a single completion request over it.
pub struct Summarizer {
    provider: Arc<dyn CompletionProvider>,
    request_timeout: Duration,
}

impl Summarizer {
    /// Create a summarizer over the given provider.
    pub fn new(provider: Arc<dyn CompletionProvider>, request_timeout: Duration) -> Self {
        Self { provider, request_timeout }
    }

    /// Summarize `paper` in the given style.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::EmptyInput`] if the paper text is blank
    /// and [`CitekitError::CompletionUnavailable`] if the completion
    /// call fails or exceeds the timeout.
    pub async fn summarize(&self, paper: &Paper, style: SummaryStyle) -> Result<String> {
        if paper.text.trim().is_empty() {
            return Err(CitekitError::EmptyInput);
        }

        let prompt = style_prompt(style, paper);
        let reply = tokio::time::timeout(self.request_timeout, self.provider.complete(&prompt))
            .await
            .map_err(|_| {
                error!(timeout = ?self.request_timeout, "summary completion timed out");
                CitekitError::CompletionUnavailable {
                    provider: self.provider.model_id().to_string(),
                    message: format!("no completion within {:?}", self.request_timeout),
                }
            })??;

        info!(paper.id = %paper.id, ?style, "summarized paper");
        Ok(reply.trim().to_string())
    }
}

/// Build the completion request for a style.
fn style_prompt(style: SummaryStyle, paper: &Paper) -> Prompt {
    match style {
        SummaryStyle::Overview => Prompt::new(
            "You are an expert research paper analyst. Provide clear, concise summaries.",
            format!(
                "Paper title: {}\n\nContent: {}\n\nSummarize this paper, highlighting the \
                 problem it addresses, the main approach, and the key findings and \
                 contributions.",
                paper.title,
                head(&paper.text, INPUT_BUDGET)
            ),
            400,
        ),
        SummaryStyle::Methods => Prompt::new(
            "You are an expert research analyst. Focus on methodology, experimental design, \
             and technical approaches.",
            format!(
                "Analyze the methods and methodology of this research paper. Provide a \
                 detailed summary covering:\n1. Main approach/methodology\n2. Experimental \
                 setup\n3. Data and datasets used\n4. Evaluation metrics\n5. Technical \
                 implementation details\n\nContent:\n{}",
                head(&paper.text, INPUT_BUDGET)
            ),
            500,
        ),
        SummaryStyle::Results => Prompt::new(
            "You are an expert research analyst. Focus on experimental results, performance \
             metrics, and findings.",
            format!(
                "Analyze the results and findings of this research paper. Provide a detailed \
                 summary covering:\n1. Key experimental results\n2. Performance metrics and \
                 comparisons\n3. Statistical significance\n4. Main findings and discoveries\n\
                 5. Comparison with baseline/state-of-the-art\n\nContent:\n{}",
                head(tail_from(&paper.text, paper.text.len() / 2), INPUT_BUDGET)
            ),
            500,
        ),
        SummaryStyle::Limitations => Prompt::new(
            "You are an expert research analyst. Focus on limitations, weaknesses, and areas \
             for improvement.",
            format!(
                "Analyze the limitations and future work directions of this research paper. \
                 Provide a summary covering:\n1. Acknowledged limitations\n2. Potential \
                 weaknesses\n3. Scope constraints\n4. Future research directions\n5. Areas \
                 for improvement\n\nContent:\n{}",
                head(tail_from(&paper.text, paper.text.len() / 4 * 3), INPUT_BUDGET)
            ),
            400,
        ),
        SummaryStyle::Plain => Prompt::new(
            "You are an expert at explaining complex research to high school students. Use \
             simple language, avoid jargon, and use analogies when helpful.",
            format!(
                "Explain this research paper like I'm a 10th grade student. Make it engaging \
                 and easy to understand:\n\nTitle: {}\n\nContent: {}\n\nCover:\n1. What \
                 problem they're trying to solve\n2. How they solved it (in simple terms)\n\
                 3. What they found out\n4. Why it matters",
                paper.title,
                head(&paper.text, PLAIN_INPUT_BUDGET)
            ),
            400,
        ),
    }
}

/// The opening of `text`, capped at `limit` bytes on a char boundary.
fn head(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        text
    } else {
        &text[..floor_char_boundary(text, limit)]
    }
}

/// The remainder of `text` from `at`, rounded up to a char boundary.
fn tail_from(text: &str, at: usize) -> &str {
    &text[ceil_char_boundary(text, at)..]
}
