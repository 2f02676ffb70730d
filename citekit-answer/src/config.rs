//! Configuration for answer assembly.

use std::time::Duration;

use citekit_core::{CitekitError, Result};
use serde::{Deserialize, Serialize};

/// Configuration parameters for the answer side of the library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerConfig {
    /// Character budget for the grounding context sent to the
    /// completion model. Passages past the budget are truncated or
    /// dropped, in score order.
    pub context_budget: usize,
    /// Maximum length of the excerpt recorded per answer source.
    pub excerpt_length: usize,
    /// Token budget for the generated answer.
    pub answer_tokens: u32,
    /// Maximum number of citation markers attached to an answer.
    pub max_related_citations: usize,
    /// Deadline for a single external completion call.
    pub request_timeout: Duration,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            context_budget: 3000,
            excerpt_length: 200,
            answer_tokens: 600,
            max_related_citations: 5,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl AnswerConfig {
    /// Create a new builder for constructing an [`AnswerConfig`].
    pub fn builder() -> AnswerConfigBuilder {
        AnswerConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`AnswerConfig`].
#[derive(Debug, Clone, Default)]
pub struct AnswerConfigBuilder {
    config: AnswerConfig,
}

impl AnswerConfigBuilder {
    /// Set the character budget for the grounding context.
    pub fn context_budget(mut self, budget: usize) -> Self {
        self.config.context_budget = budget;
        self
    }

    /// Set the maximum excerpt length per answer source.
    pub fn excerpt_length(mut self, length: usize) -> Self {
        self.config.excerpt_length = length;
        self
    }

    /// Set the token budget for the generated answer.
    pub fn answer_tokens(mut self, tokens: u32) -> Self {
        self.config.answer_tokens = tokens;
        self
    }

    /// Set the maximum number of citation markers attached to an answer.
    pub fn max_related_citations(mut self, max: usize) -> Self {
        self.config.max_related_citations = max;
        self
    }

    /// Set the deadline for a single external completion call.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Build the [`AnswerConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`CitekitError::Config`] if:
    /// - `context_budget == 0`
    /// - `excerpt_length == 0`
    /// - `answer_tokens == 0`
    /// - `request_timeout` is zero
    pub fn build(self) -> Result<AnswerConfig> {
        if self.config.context_budget == 0 {
            return Err(CitekitError::Config("context_budget must be greater than zero".to_string()));
        }
        if self.config.excerpt_length == 0 {
            return Err(CitekitError::Config("excerpt_length must be greater than zero".to_string()));
        }
        if self.config.answer_tokens == 0 {
            return Err(CitekitError::Config("answer_tokens must be greater than zero".to_string()));
        }
        if self.config.request_timeout.is_zero() {
            return Err(CitekitError::Config("request_timeout must be non-zero".to_string()));
        }
        Ok(self.config)
    }
}
