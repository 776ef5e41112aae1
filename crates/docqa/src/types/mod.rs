//! Core types for the Q&A service

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, Document, RecordMetadata, StoredRecord};
pub use query::{ChatParams, RunRequest};
pub use response::{AnswerStatus, ChatResponse, DocumentDescriptor, QuestionAnswer, RunResponse};
