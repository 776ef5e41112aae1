//! Document, chunk, and stored record types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

/// A document downloaded for a single request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Source URL
    pub url: String,
    /// File name used for the `source` metadata field
    pub filename: String,
    /// Materialized local path (inside the request's scoped directory)
    pub local_path: PathBuf,
    /// SHA-256 of the downloaded bytes (hex)
    pub content_hash: String,
    /// File size in bytes
    pub file_size: u64,
    /// Download timestamp
    pub downloaded_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new document record
    pub fn new(url: String, filename: String, local_path: PathBuf, content_hash: String, file_size: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            url,
            filename,
            local_path,
            content_hash,
            file_size,
            downloaded_at: chrono::Utc::now(),
        }
    }
}

/// A word-count-bounded slice of document text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID (becomes the stored record ID)
    pub id: Uuid,
    /// Position within the document, starting at 0
    pub index: u32,
    /// Source document name
    pub source: String,
    /// Chunk text
    pub text: String,
}

impl Chunk {
    /// Create a new chunk with a fresh ID
    pub fn new(index: u32, source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            index,
            source: source.into(),
            text: text.into(),
        }
    }

    /// Number of whitespace-separated words
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Metadata persisted alongside each vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Source file name
    pub source: String,
    /// Chunk position
    pub chunk: u32,
    /// Chunk text
    pub text: String,
    /// Caller-supplied metadata
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, String>,
}

/// The vector index's persisted unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: RecordMetadata,
}

impl StoredRecord {
    /// Build a record for a chunk and its embedding
    pub fn from_chunk(chunk: &Chunk, values: Vec<f32>, extra: &BTreeMap<String, String>) -> Self {
        Self {
            id: chunk.id.to_string(),
            values,
            metadata: RecordMetadata {
                source: chunk.source.clone(),
                chunk: chunk.index,
                text: chunk.text.clone(),
                extra: extra.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_metadata_shape() {
        let chunk = Chunk::new(3, "policy.pdf", "cover applies to air ambulance");
        let mut extra = BTreeMap::new();
        extra.insert("url".to_string(), "https://example.com/policy.pdf".to_string());

        let record = StoredRecord::from_chunk(&chunk, vec![0.1, 0.2], &extra);
        assert_eq!(record.id, chunk.id.to_string());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["metadata"]["source"], "policy.pdf");
        assert_eq!(json["metadata"]["chunk"], 3);
        assert_eq!(json["metadata"]["text"], "cover applies to air ambulance");
        assert_eq!(json["metadata"]["url"], "https://example.com/policy.pdf");
    }

    #[test]
    fn test_chunk_ids_are_unique() {
        let a = Chunk::new(0, "a.pdf", "same text");
        let b = Chunk::new(0, "a.pdf", "same text");
        assert_ne!(a.id, b.id);
        assert_eq!(a.word_count(), 2);
    }
}
