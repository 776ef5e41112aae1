//! Provider abstractions for embeddings, vector storage, and generation
//!
//! Each hosted service sits behind a trait so the pipeline can be exercised
//! with in-process stand-ins and backends can be reordered by configuration.

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod openai_compat;
pub mod pinecone;
pub mod vector_store;

use std::sync::Arc;
use std::time::Duration;

use crate::config::BackendConfig;
use crate::error::Result;

pub use embedding::{EmbeddingProvider, InputType};
pub use gemini::GeminiClient;
pub use llm::{GenerationRequest, LlmProvider};
pub use openai_compat::OpenAiCompatibleClient;
pub use pinecone::PineconeClient;
pub use vector_store::{VectorMatch, VectorStoreProvider};

/// Build the generation backends in fallback order
pub fn build_backends(configs: &[BackendConfig], timeout: Duration) -> Result<Vec<Arc<dyn LlmProvider>>> {
    configs
        .iter()
        .map(|config| {
            let backend: Arc<dyn LlmProvider> = match config {
                BackendConfig::Gemini(c) => Arc::new(GeminiClient::new(c, timeout)?),
                BackendConfig::OpenAiCompatible(c) => Arc::new(OpenAiCompatibleClient::new(c, timeout)?),
            };
            Ok(backend)
        })
        .collect()
}
