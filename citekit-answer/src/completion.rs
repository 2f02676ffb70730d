//! Completion provider trait and prompt type.

use async_trait::async_trait;

use citekit_core::Result;

/// A single completion request: a system instruction, a user message,
/// and a token budget for the reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    /// The system instruction framing the model's role.
    pub system: String,
    /// The user message, including any grounding context.
    pub user: String,
    /// Maximum number of tokens the reply may use.
    pub max_tokens: u32,
}

impl Prompt {
    /// Create a prompt.
    pub fn new(system: impl Into<String>, user: impl Into<String>, max_tokens: u32) -> Self {
        Self { system: system.into(), user: user.into(), max_tokens }
    }
}

/// A provider that generates text completions.
///
/// Implementations wrap specific chat backends behind a unified async
/// interface. Providers are stateless between calls; every request
/// carries its full prompt.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn complete(&self, prompt: &Prompt) -> Result<String>;

    /// Return the identifier of the completion model.
    fn model_id(&self) -> &str;
}
