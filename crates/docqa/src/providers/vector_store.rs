//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::types::StoredRecord;

/// One nearest-neighbour match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    /// Record ID
    pub id: String,
    /// Similarity score (higher is more similar)
    #[serde(default)]
    pub score: f32,
    /// Stored metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl VectorMatch {
    /// The chunk text stored in the `text` metadata field
    pub fn text(&self) -> Option<&str> {
        self.metadata.get("text").and_then(|v| v.as_str())
    }
}

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `PineconeClient`: Pinecone serverless index
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Append records; returns the number stored
    async fn upsert(&self, records: &[StoredRecord]) -> Result<usize>;

    /// Nearest records to `vector`, best match first
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
