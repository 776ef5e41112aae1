//! Response types for the HTTP surface

use serde::{Deserialize, Serialize};

/// Per-question outcome of a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    /// The model produced an answer
    Answered,
    /// The model reported the information is not in the document
    NotFound,
    /// The model output had no entry for this question
    Missing,
    /// Every generation backend failed
    Failed,
}

/// One answer together with its status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub answer: String,
    pub status: AnswerStatus,
}

impl QuestionAnswer {
    pub fn new(answer: impl Into<String>, status: AnswerStatus) -> Self {
        Self {
            answer: answer.into(),
            status,
        }
    }
}

/// Body returned by `POST /hackrx/run`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunResponse {
    /// One answer per question, in question order
    pub answers: Vec<String>,
    /// Status of each answer, aligned with `answers`
    #[serde(default)]
    pub statuses: Vec<AnswerStatus>,
}

impl From<Vec<QuestionAnswer>> for RunResponse {
    fn from(items: Vec<QuestionAnswer>) -> Self {
        let (answers, statuses) = items.into_iter().map(|qa| (qa.answer, qa.status)).unzip();
        Self { answers, statuses }
    }
}

/// Body returned by `POST /chat/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// Entry listed by `GET /documents`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    pub name: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl DocumentDescriptor {
    /// The placeholder entry the service starts with
    pub fn placeholder() -> Self {
        Self {
            name: "SampleDoc".to_string(),
            summary: "This is a placeholder summary for the purpose of AI querying.".to_string(),
            url: None,
            indexed_at: None,
        }
    }
}
