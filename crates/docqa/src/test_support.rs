//! In-process stand-ins shared by unit tests

use async_trait::async_trait;
use axum::{
    http::{StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::InputConfig;
use crate::error::{Error, Result};
use crate::generation::AnswerComposer;
use crate::ingestion::{Downloader, Indexer, TextExtractor, WordChunker};
use crate::processing::QaPipeline;
use crate::retrieval::Retriever;
use crate::providers::{
    EmbeddingProvider, GenerationRequest, InputType, LlmProvider, VectorMatch, VectorStoreProvider,
};
use crate::types::StoredRecord;

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn serve_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Serve `body` for every path except those under `/missing`
pub async fn serve_bytes(body: Vec<u8>) -> String {
    let router = Router::new().fallback(move |uri: Uri| {
        let body = body.clone();
        async move {
            if uri.path().starts_with("/missing") {
                StatusCode::NOT_FOUND.into_response()
            } else {
                body.into_response()
            }
        }
    });
    serve_router(router).await
}

/// Extractor returning fixed text regardless of the file
pub struct StubExtractor {
    pub text: String,
}

impl StubExtractor {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl TextExtractor for StubExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(Error::file_parse(path.display().to_string(), "missing"));
        }
        Ok(self.text.clone())
    }
}

pub const STUB_DIMENSION: usize = 16;

/// Deterministic bag-of-words embedder: texts sharing words land close together
#[derive(Default)]
pub struct StubEmbedder {
    pub batch_calls: AtomicUsize,
    pub fail: bool,
}

impl StubEmbedder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; STUB_DIMENSION];
        for word in text.split_whitespace() {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            if word.is_empty() {
                continue;
            }
            let bucket = word.bytes().fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
            v[bucket % STUB_DIMENSION] += 1.0;
        }
        v
    }

    pub fn calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed_batch(&self, texts: &[String], _input_type: InputType) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::embedding("stub embedder failure"));
        }
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn model(&self) -> &str {
        "stub-embed"
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Vector store kept in memory, ranked by cosine similarity
#[derive(Default)]
pub struct InMemoryStore {
    pub records: Mutex<Vec<StoredRecord>>,
}

impl InMemoryStore {
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[async_trait]
impl VectorStoreProvider for InMemoryStore {
    async fn upsert(&self, records: &[StoredRecord]) -> Result<usize> {
        self.records.lock().extend_from_slice(records);
        Ok(records.len())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>> {
        let records = self.records.lock();
        let mut matches: Vec<VectorMatch> = records
            .iter()
            .map(|r| VectorMatch {
                id: r.id.clone(),
                score: cosine(vector, &r.values),
                metadata: match serde_json::to_value(&r.metadata) {
                    Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
                    _ => Default::default(),
                },
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Vector store whose writes always fail
#[derive(Default)]
pub struct FailingStore {
    pub upsert_calls: AtomicUsize,
}

#[async_trait]
impl VectorStoreProvider for FailingStore {
    async fn upsert(&self, _records: &[StoredRecord]) -> Result<usize> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::vector_db("upsert rejected: 429 Too Many Requests"))
    }

    async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<VectorMatch>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Pipeline over in-process stand-ins, downloading into `input`
pub fn stub_pipeline(text: &str, llm: Arc<StubLlm>, input: &Path) -> QaPipeline {
    let embedder = Arc::new(StubEmbedder::default());
    let store = Arc::new(InMemoryStore::default());
    let downloader = Downloader::new(&InputConfig {
        folder: input.to_path_buf(),
        download_timeout_secs: 10,
    })
    .unwrap();

    QaPipeline::new(
        downloader,
        Indexer::new(Arc::new(StubExtractor::new(text)), WordChunker::new(10), embedder.clone(), store.clone()),
        Retriever::new(embedder, store, 3),
        AnswerComposer::new(vec![llm as Arc<dyn LlmProvider>], Duration::from_secs(5)),
        true,
    )
}

/// Scripted behaviour of a `StubLlm`
#[derive(Clone)]
pub enum StubBehavior {
    Reply(String),
    Fail,
    Hang,
}

/// Generation backend with a fixed behaviour that records every prompt
pub struct StubLlm {
    name: String,
    behavior: StubBehavior,
    pub prompts: Mutex<Vec<GenerationRequest>>,
}

impl StubLlm {
    pub fn new(name: &str, behavior: StubBehavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(name: &str, text: &str) -> Self {
        Self::new(name, StubBehavior::Reply(text.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().map(|r| r.prompt.clone())
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.prompts.lock().push(request.clone());
        match &self.behavior {
            StubBehavior::Reply(text) => Ok(text.clone()),
            StubBehavior::Fail => Err(Error::llm(format!("{} unavailable", self.name))),
            StubBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "stub-model"
    }
}
