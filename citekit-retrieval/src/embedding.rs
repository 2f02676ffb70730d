//! Embedding provider trait and tagged query vectors.

use async_trait::async_trait;

use citekit_core::Result;

/// A provider that generates vector embeddings from text.
///
/// Implementations wrap specific embedding backends behind a unified
/// async interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends with native batching should override it.
///
/// [`model_id`](EmbeddingProvider::model_id) names the model producing
/// the vectors. The index records it with every stored vector and
/// refuses to compare vectors across models.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially for each input. Override this method if the backend
    /// supports native batch embedding for better throughput.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Return the identifier of the embedding model.
    fn model_id(&self) -> &str;
}

/// A query vector tagged with the model that produced it.
///
/// Carrying the tag with the vector lets the index reject queries
/// embedded with a different model than its stored vectors, instead of
/// silently comparing incompatible spaces.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedQuery {
    /// The query embedding.
    pub vector: Vec<f32>,
    /// Identifier of the model that produced `vector`.
    pub model: String,
}

impl EmbeddedQuery {
    /// Create a tagged query vector.
    pub fn new(vector: Vec<f32>, model: impl Into<String>) -> Self {
        Self { vector, model: model.into() }
    }
}
