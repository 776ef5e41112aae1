//! Inbound request types

use serde::{Deserialize, Serialize};

/// Body of `POST /hackrx/run`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    /// URL of the PDF to ingest
    pub documents: String,
    /// Questions to answer against the document
    pub questions: Vec<String>,
}

/// Query parameters of `POST /chat/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatParams {
    /// The question to answer; absent is treated as empty
    #[serde(default)]
    pub question: String,
}
