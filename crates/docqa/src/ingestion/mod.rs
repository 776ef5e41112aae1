//! Document ingestion: download, text extraction, chunking, and indexing

mod chunker;
mod download;
mod indexer;
mod parser;

pub use chunker::{WordChunker, DEFAULT_CHUNK_WORDS};
pub use download::{filename_from_url, DownloadedDocument, Downloader};
pub use indexer::{IndexOutcome, Indexer};
pub use parser::{cleanup_pdf_text, PdfExtractor, TextExtractor};
