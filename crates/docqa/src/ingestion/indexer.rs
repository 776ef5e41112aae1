//! Extract, chunk, embed, and store one document

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::ingestion::chunker::WordChunker;
use crate::ingestion::parser::TextExtractor;
use crate::providers::{EmbeddingProvider, InputType, VectorStoreProvider};
use crate::types::StoredRecord;

/// Result of indexing a single document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// Chunks were embedded and written to the index
    Indexed { chunks: usize },
    /// Extraction failed or produced no text; nothing was written
    NoText,
}

/// Turns a local document into vector records
pub struct Indexer {
    extractor: Arc<dyn TextExtractor>,
    chunker: WordChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
}

impl Indexer {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        chunker: WordChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Self {
        Self {
            extractor,
            chunker,
            embedder,
            store,
        }
    }

    pub fn chunker(&self) -> &WordChunker {
        &self.chunker
    }

    /// Index the document at `path`.
    ///
    /// Every chunk gets a fresh UUID record ID and `{source, chunk, text}` metadata,
    /// with `metadata` merged in. All chunk texts go to the embedder as one batch.
    pub async fn index_document(
        &self,
        path: &Path,
        metadata: Option<&BTreeMap<String, String>>,
    ) -> Result<IndexOutcome> {
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let text = match self.extractor.extract(path).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Text extraction failed for {}: {}", source, e);
                return Ok(IndexOutcome::NoText);
            }
        };
        let chunks = self.chunker.chunk(&source, &text);
        if chunks.is_empty() {
            tracing::warn!("No extractable text in {}, skipping indexing", source);
            return Ok(IndexOutcome::NoText);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts, InputType::Passage).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings for {}, got {}",
                chunks.len(),
                source,
                embeddings.len()
            )));
        }

        let empty = BTreeMap::new();
        let extra = metadata.unwrap_or(&empty);
        let records: Vec<StoredRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, values)| StoredRecord::from_chunk(chunk, values, extra))
            .collect();

        let stored = self.store.upsert(&records).await?;
        tracing::info!(
            "Indexed '{}': {} chunks ({} words/chunk) into {}",
            source,
            stored,
            self.chunker.chunk_words(),
            self.store.name()
        );

        Ok(IndexOutcome::Indexed { chunks: records.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingStore, InMemoryStore, StubEmbedder, StubExtractor};
    use std::sync::atomic::Ordering;
    use std::collections::HashSet;

    fn indexer(text: &str, chunk_words: usize) -> (Indexer, Arc<StubEmbedder>, Arc<InMemoryStore>) {
        let embedder = Arc::new(StubEmbedder::default());
        let store = Arc::new(InMemoryStore::default());
        let indexer = Indexer::new(
            Arc::new(StubExtractor::new(text)),
            WordChunker::new(chunk_words),
            embedder.clone(),
            store.clone(),
        );
        (indexer, embedder, store)
    }

    fn scratch_file(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("policy.pdf");
        std::fs::write(&path, b"%PDF").unwrap();
        path
    }

    #[tokio::test]
    async fn test_index_document_writes_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch_file(dir.path());
        let text = (0..25).map(|i| format!("word{}", i)).collect::<Vec<_>>().join(" ");
        let (indexer, embedder, store) = indexer(&text, 10);

        let mut extra = BTreeMap::new();
        extra.insert("url".to_string(), "https://example.com/policy.pdf".to_string());
        let outcome = indexer.index_document(&path, Some(&extra)).await.unwrap();

        assert_eq!(outcome, IndexOutcome::Indexed { chunks: 3 });
        assert_eq!(embedder.calls(), 1);

        let records = store.records.lock();
        assert_eq!(records.len(), 3);
        let ids: HashSet<_> = records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids.len(), 3);
        for (i, record) in records.iter().enumerate() {
            assert!(uuid::Uuid::parse_str(&record.id).is_ok());
            assert_eq!(record.metadata.source, "policy.pdf");
            assert_eq!(record.metadata.chunk, i as u32);
            assert_eq!(record.metadata.extra.get("url").unwrap(), "https://example.com/policy.pdf");
        }
        assert_eq!(records[2].metadata.text, "word20 word21 word22 word23 word24");
    }

    #[tokio::test]
    async fn test_empty_text_is_no_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch_file(dir.path());
        let (indexer, embedder, store) = indexer("   \n ", 500);

        let outcome = indexer.index_document(&path, None).await.unwrap();
        assert_eq!(outcome, IndexOutcome::NoText);
        assert_eq!(embedder.calls(), 0);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_document_is_no_text() {
        let dir = tempfile::tempdir().unwrap();
        let (indexer, _, store) = indexer("never read", 500);

        let outcome = indexer.index_document(&dir.path().join("gone.pdf"), None).await.unwrap();
        assert_eq!(outcome, IndexOutcome::NoText);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch_file(dir.path());
        let store = Arc::new(InMemoryStore::default());
        let indexer = Indexer::new(
            Arc::new(StubExtractor::new("some words here")),
            WordChunker::default(),
            Arc::new(StubEmbedder::failing()),
            store.clone(),
        );

        let err = indexer.index_document(&path, None).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_upsert_failure_propagates_without_retry() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch_file(dir.path());
        let store = Arc::new(FailingStore::default());
        let indexer = Indexer::new(
            Arc::new(StubExtractor::new("some words here")),
            WordChunker::default(),
            Arc::new(StubEmbedder::default()),
            store.clone(),
        );

        let err = indexer.index_document(&path, None).await.unwrap_err();
        assert!(matches!(err, Error::VectorDb(_)));
        assert_eq!(store.upsert_calls.load(Ordering::SeqCst), 1);
    }
}
