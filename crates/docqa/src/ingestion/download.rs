//! Document download into per-request scoped directories

use reqwest::{Client, Url};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

use crate::config::InputConfig;
use crate::error::{Error, Result};
use crate::types::Document;

/// File name used when the URL has no usable last path segment
const DEFAULT_FILENAME: &str = "input.pdf";

/// A downloaded document and the directory that owns it.
///
/// The directory (and the file inside it) is removed when this value is dropped,
/// so concurrent requests never share a destination path.
#[derive(Debug)]
pub struct DownloadedDocument {
    pub document: Document,
    dir: TempDir,
}

impl DownloadedDocument {
    pub fn path(&self) -> &Path {
        &self.document.local_path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// HTTP downloader
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    input_folder: PathBuf,
}

impl Downloader {
    /// Create a downloader writing below `config.folder`
    pub fn new(config: &InputConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.download_timeout())
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            input_folder: config.folder.clone(),
        })
    }

    pub fn input_folder(&self) -> &Path {
        &self.input_folder
    }

    /// Download `url` into a fresh scoped directory. Any non-success status is an error.
    pub async fn download(&self, url: &str) -> Result<DownloadedDocument> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| Error::bad_request(format!("Invalid document URL '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::bad_request(format!(
                "Unsupported URL scheme '{}'",
                parsed.scheme()
            )));
        }

        let response = self.client.get(parsed.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Download {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;

        tokio::fs::create_dir_all(&self.input_folder).await?;
        let dir = tempfile::Builder::new()
            .prefix("request-")
            .tempdir_in(&self.input_folder)?;

        let filename = filename_from_url(&parsed);
        let local_path = dir.path().join(&filename);
        tokio::fs::write(&local_path, &bytes).await?;

        let content_hash = hex::encode(Sha256::digest(&bytes));
        tracing::info!(
            "Downloaded {} ({} bytes) to {}",
            url,
            bytes.len(),
            local_path.display()
        );

        Ok(DownloadedDocument {
            document: Document::new(
                url.to_string(),
                filename,
                local_path,
                content_hash,
                bytes.len() as u64,
            ),
            dir,
        })
    }
}

/// Derive a safe local file name from the URL's last path segment
pub fn filename_from_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    let sanitized: String = segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let sanitized = sanitized.trim_start_matches('.');

    if sanitized.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else if !sanitized.contains('.') {
        format!("{}.pdf", sanitized)
    } else {
        sanitized.to_string()
    }
}
