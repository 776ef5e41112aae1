//! PDF text extraction

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Upper bound for a single extraction; some fonts make pdf-extract spin
const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Turns a materialized document into plain text.
///
/// An empty string means the document had no extractable text; errors are
/// reserved for unreadable or corrupt files.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<String>;
}

/// PDF extractor backed by `pdf-extract`, with a `lopdf` page-by-page fallback
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract text from in-memory PDF bytes (blocking)
    pub fn extract_from_bytes(filename: &str, data: &[u8]) -> Result<String> {
        let raw = match pdf_extract::extract_text_from_mem(data) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::debug!("pdf-extract found no text in {}, trying lopdf", filename);
                Self::extract_with_lopdf(filename, data)?
            }
            Err(e) => {
                tracing::warn!("pdf-extract failed on {}: {}, trying lopdf", filename, e);
                Self::extract_with_lopdf(filename, data)?
            }
        };

        Ok(cleanup_pdf_text(&raw))
    }

    fn extract_with_lopdf(filename: &str, data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let mut text = String::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                }
                Err(e) => {
                    tracing::debug!("Could not extract page {} of {}: {}", page_number, filename, e);
                }
            }
        }

        Ok(text)
    }
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        let name = filename.clone();
        let task = tokio::task::spawn_blocking(move || Self::extract_from_bytes(&name, &data));

        match tokio::time::timeout(EXTRACTION_TIMEOUT, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(Error::internal(format!(
                "PDF extraction task for {} failed: {}",
                filename, join_err
            ))),
            Err(_) => {
                tracing::error!("PDF extraction of {} timed out after {:?}", filename, EXTRACTION_TIMEOUT);
                Err(Error::Timeout(EXTRACTION_TIMEOUT.as_secs()))
            }
        }
    }
}

/// Normalize extracted PDF text: typographic characters to ASCII, no NULs,
/// trimmed lines, blank lines removed.
pub fn cleanup_pdf_text(text: &str) -> String {
    let text = text
        .replace('\0', "")
        .replace(['\u{2010}', '\u{2011}', '\u{2013}'], "-")
        .replace('\u{2014}', "--")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{2026}', "...")
        .replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl");

    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
