//! Request-level orchestration: download, index, retrieve, compose, format

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{Error, Result};
use crate::generation::{classify, format_answers, AnswerComposer, PromptBuilder};
use crate::ingestion::{Downloader, IndexOutcome, Indexer};
use crate::providers::GenerationRequest;
use crate::retrieval::Retriever;
use crate::types::{Document, QuestionAnswer, RunRequest};

/// Content hashes remembered for duplicate warnings
pub const SEEN_HASH_CAPACITY: usize = 1024;

/// Content hashes of recently indexed documents, oldest evicted at capacity
struct SeenHashes {
    /// Hash -> insertion sequence number
    entries: HashMap<String, u64>,
    next_seq: u64,
    capacity: usize,
}

impl SeenHashes {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            next_seq: 0,
            capacity: capacity.max(1),
        }
    }

    /// Record `hash`; returns true when it was already present
    fn remember(&mut self, hash: &str) -> bool {
        let seq = self.next_seq;
        self.next_seq += 1;

        if let Some(existing) = self.entries.get_mut(hash) {
            *existing = seq;
            return true;
        }

        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, seq)| **seq)
                .map(|(hash, _)| hash.clone())
            {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(hash.to_string(), seq);
        false
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Result of a `/hackrx/run` request
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The downloaded document; `None` when there was nothing to ask
    pub document: Option<Document>,
    /// What indexing did with the document
    pub indexed: Option<IndexOutcome>,
    /// One answer per question, in question order
    pub answers: Vec<QuestionAnswer>,
}

/// Question answering over downloaded documents
pub struct QaPipeline {
    downloader: Downloader,
    indexer: Indexer,
    retriever: Retriever,
    composer: AnswerComposer,
    batch_questions: bool,
    seen_hashes: Mutex<SeenHashes>,
}

impl QaPipeline {
    pub fn new(
        downloader: Downloader,
        indexer: Indexer,
        retriever: Retriever,
        composer: AnswerComposer,
        batch_questions: bool,
    ) -> Self {
        Self {
            downloader,
            indexer,
            retriever,
            composer,
            batch_questions,
            seen_hashes: Mutex::new(SeenHashes::new(SEEN_HASH_CAPACITY)),
        }
    }

    /// Limit how many content hashes are remembered
    pub fn with_seen_capacity(self, capacity: usize) -> Self {
        *self.seen_hashes.lock() = SeenHashes::new(capacity);
        self
    }

    /// Number of content hashes currently remembered
    pub fn seen_count(&self) -> usize {
        self.seen_hashes.lock().len()
    }

    pub fn composer(&self) -> &AnswerComposer {
        &self.composer
    }

    /// Answer one question against whatever is already indexed
    pub async fn answer_question(&self, question: &str) -> Result<QuestionAnswer> {
        let texts = self.retriever.retrieve(question, None).await?;
        let context = PromptBuilder::build_context(&texts);
        let prompt = PromptBuilder::build_question_prompt(question, &context);

        let generation = self.composer.compose(&GenerationRequest::text(prompt)).await;
        let status = classify(&generation.text);
        Ok(QuestionAnswer::new(generation.text, status))
    }

    /// Download and index `request.documents`, then answer every question
    pub async fn run(&self, request: &RunRequest) -> Result<RunOutcome> {
        if request.questions.is_empty() {
            return Ok(RunOutcome {
                document: None,
                indexed: None,
                answers: Vec::new(),
            });
        }

        let url = request.documents.trim();
        if url.is_empty() {
            return Err(Error::bad_request("Field 'documents' must be a document URL"));
        }

        let downloaded = self.downloader.download(url).await?;
        let document = downloaded.document.clone();

        if self.seen_hashes.lock().remember(&document.content_hash) {
            tracing::warn!(
                "Document {} was indexed before in this process; its chunks will be stored again",
                document.filename
            );
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("url".to_string(), document.url.clone());
        let indexed = self.indexer.index_document(downloaded.path(), Some(&metadata)).await?;
        if indexed == IndexOutcome::NoText {
            tracing::warn!("{} has no text; answering from the existing index", document.filename);
        }
        drop(downloaded);

        let answers = if self.batch_questions {
            self.answer_batch(&request.questions).await?
        } else {
            let mut answers = Vec::with_capacity(request.questions.len());
            for question in &request.questions {
                answers.push(self.answer_question(question).await?);
            }
            answers
        };

        Ok(RunOutcome {
            document: Some(document),
            indexed: Some(indexed),
            answers,
        })
    }

    /// One prompt for all questions, with contexts concatenated in question order
    async fn answer_batch(&self, questions: &[String]) -> Result<Vec<QuestionAnswer>> {
        let mut seen = HashSet::new();
        let mut texts = Vec::new();
        for question in questions {
            for text in self.retriever.retrieve(question, None).await? {
                if seen.insert(text.clone()) {
                    texts.push(text);
                }
            }
        }

        let context = PromptBuilder::build_context(&texts);
        let prompt = PromptBuilder::build_batch_prompt(questions, &context);
        let generation = self.composer.compose(&GenerationRequest::json(prompt)).await;

        Ok(format_answers(&generation, questions.len()))
    }
}
