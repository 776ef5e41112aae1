//! Similarity search over indexed chunks

use std::sync::Arc;

use crate::error::Result;
use crate::providers::{EmbeddingProvider, InputType, VectorStoreProvider};

/// Default number of chunks returned per query
pub const DEFAULT_TOP_K: usize = 3;

/// Embeds a question and fetches the nearest chunk texts
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    default_top_k: usize,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        default_top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            default_top_k,
        }
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    /// Up to `top_k` chunk texts (configured default when `None`), most similar first.
    /// Matches without stored text are skipped.
    pub async fn retrieve(&self, query: &str, top_k: Option<usize>) -> Result<Vec<String>> {
        let top_k = top_k.unwrap_or(self.default_top_k);
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(query, InputType::Query).await?;
        let matches = self.store.query(&vector, top_k).await?;

        let texts: Vec<String> = matches
            .iter()
            .filter_map(|m| {
                let text = m.text();
                if text.is_none() {
                    tracing::debug!("Match {} has no text metadata, skipping", m.id);
                }
                text.map(str::to_string)
            })
            .take(top_k)
            .collect();

        tracing::debug!("Retrieved {} chunks (top_k={}) for query", texts.len(), top_k);
        Ok(texts)
    }
}
