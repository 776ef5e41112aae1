//! Embedding provider trait for generating text embeddings

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What the embedded text will be used for; hosted models embed passages
/// and queries asymmetrically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Document chunks being indexed
    Passage,
    /// A user question being searched
    Query,
}

/// Trait for generating text embeddings
///
/// Implementations:
/// - `PineconeClient`: Pinecone hosted inference (llama-text-embed-v2)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for multiple texts, one vector per input in order
    async fn embed_batch(&self, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>>;

    /// Generate embedding for a single text
    async fn embed(&self, text: &str, input_type: InputType) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()], input_type)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("No embedding in response"))
    }

    /// Get the embedding model name
    fn model(&self) -> &str;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
