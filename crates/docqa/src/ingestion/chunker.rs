//! Fixed-size word chunking

use crate::types::Chunk;

/// Default words per chunk
pub const DEFAULT_CHUNK_WORDS: usize = 500;

/// Splits text into consecutive, non-overlapping word windows
#[derive(Debug, Clone, Copy)]
pub struct WordChunker {
    /// Words per chunk
    chunk_words: usize,
}

impl WordChunker {
    /// Create a new chunker. A limit of 0 is treated as 1.
    pub fn new(chunk_words: usize) -> Self {
        Self {
            chunk_words: chunk_words.max(1),
        }
    }

    pub fn chunk_words(&self) -> usize {
        self.chunk_words
    }

    /// Split text into chunk strings; words inside a chunk are joined by single spaces.
    /// Empty or whitespace-only text yields no chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        words
            .chunks(self.chunk_words)
            .map(|window| window.join(" "))
            .collect()
    }

    /// Split text into [`Chunk`]s attributed to `source`
    pub fn chunk(&self, source: &str, text: &str) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(i, chunk_text)| Chunk::new(i as u32, source, chunk_text))
            .collect()
    }
}

impl Default for WordChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_WORDS)
    }
}
