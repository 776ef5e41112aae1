//! docqa: question answering over PDF documents
//!
//! Downloads a PDF, splits its text into word chunks, embeds and stores them in a
//! Pinecone index, and answers questions from the retrieved chunks with an ordered
//! chain of generation backends (Gemini, then OpenAI-compatible endpoints).

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

#[cfg(test)]
mod test_support;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{
    document::{Chunk, Document, StoredRecord},
    query::{ChatParams, RunRequest},
    response::{AnswerStatus, QuestionAnswer, RunResponse},
};
