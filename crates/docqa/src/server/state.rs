//! Application state for the Q&A server

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::AnswerComposer;
use crate::ingestion::{Downloader, Indexer, PdfExtractor, WordChunker};
use crate::processing::QaPipeline;
use crate::providers::{build_backends, EmbeddingProvider, PineconeClient, VectorStoreProvider};
use crate::retrieval::Retriever;
use crate::types::{Document, DocumentDescriptor};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Download, index, and answer pipeline
    pipeline: QaPipeline,
    /// Recently indexed documents keyed by content hash
    documents: RwLock<HashMap<String, DocumentDescriptor>>,
    /// Maximum number of recent documents kept
    max_documents: usize,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Connect to the hosted services and assemble the pipeline
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing Q&A application state...");

        let pinecone = Arc::new(PineconeClient::connect(&config.pinecone).await?);
        tracing::info!(
            "Pinecone index '{}' ready (embed model {})",
            config.pinecone.index_name,
            config.pinecone.embed_model
        );
        let embedder: Arc<dyn EmbeddingProvider> = pinecone.clone();
        let store: Arc<dyn VectorStoreProvider> = pinecone;

        let backends = build_backends(&config.generation.backends, config.generation.timeout())?;
        let composer = AnswerComposer::new(backends, config.generation.timeout());
        tracing::info!("Generation backends: {}", composer.backend_names().join(" -> "));

        let indexer = Indexer::new(
            Arc::new(PdfExtractor::new()),
            WordChunker::new(config.chunking.chunk_words),
            embedder.clone(),
            store.clone(),
        );
        let retriever = Retriever::new(embedder, store, config.retrieval.top_k);
        let downloader = Downloader::new(&config.input)?;

        let pipeline = QaPipeline::new(
            downloader,
            indexer,
            retriever,
            composer,
            config.generation.batch_questions,
        );

        let state = Self::from_parts(config, pipeline);
        state.set_ready(true);
        tracing::info!("Application state initialized");
        Ok(state)
    }

    /// Assemble state around an existing pipeline (not marked ready)
    pub fn from_parts(config: RagConfig, pipeline: QaPipeline) -> Self {
        let max_documents = config.server.max_listed_documents;
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                documents: RwLock::new(HashMap::new()),
                max_documents,
                ready: RwLock::new(false),
            }),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &QaPipeline {
        &self.inner.pipeline
    }

    /// The placeholder descriptor followed by recent documents, oldest first
    pub fn documents(&self) -> Vec<DocumentDescriptor> {
        let mut recent: Vec<DocumentDescriptor> = self.inner.documents.read().values().cloned().collect();
        recent.sort_by_key(|d| d.indexed_at);

        let mut documents = Vec::with_capacity(recent.len() + 1);
        documents.push(DocumentDescriptor::placeholder());
        documents.extend(recent);
        documents
    }

    /// Record a document that was indexed by a run.
    ///
    /// Re-indexing the same content replaces its entry; past the configured
    /// limit the oldest entry is evicted.
    pub fn record_document(&self, document: &Document) {
        let descriptor = DocumentDescriptor {
            name: document.filename.clone(),
            summary: format!("Indexed from {} ({} bytes)", document.url, document.file_size),
            url: Some(document.url.clone()),
            indexed_at: Some(document.downloaded_at),
        };

        let mut documents = self.inner.documents.write();
        if self.inner.max_documents == 0 {
            return;
        }
        if !documents.contains_key(&document.content_hash) && documents.len() >= self.inner.max_documents {
            if let Some(oldest) = documents
                .iter()
                .min_by_key(|(_, d)| d.indexed_at)
                .map(|(hash, _)| hash.clone())
            {
                documents.remove(&oldest);
            }
        }
        documents.insert(document.content_hash.clone(), descriptor);
    }

    /// Check if ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
