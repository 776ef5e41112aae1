//! Configuration for the Q&A service
//!
//! Values come from serde defaults, an optional TOML file (`DOCQA_CONFIG`),
//! and environment variable overrides, in that order. The resulting
//! [`RagConfig`] is validated once at startup and handed to every component.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable naming an optional TOML configuration file
pub const CONFIG_PATH_ENV: &str = "DOCQA_CONFIG";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Download/input configuration
    pub input: InputConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Pinecone embedding + vector index configuration
    pub pinecone: PineconeConfig,
    /// Generation backends and fallback policy
    pub generation: GenerationConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Indexed documents listed by `GET /documents` (most recent kept)
    pub max_listed_documents: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_body_size: 1024 * 1024, // 1MB
            max_listed_documents: 100,
        }
    }
}

/// Where downloaded documents are materialized
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Root folder; each request gets its own scoped directory inside it
    pub folder: PathBuf,
    /// Download timeout in seconds
    pub download_timeout_secs: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("./input"),
            download_timeout_secs: 120,
        }
    }
}

impl InputConfig {
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Words per chunk
    pub chunk_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_words: 500 }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks fetched per question
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// Pinecone configuration (inference embeddings + serverless index)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PineconeConfig {
    /// API key (required)
    pub api_key: Option<String>,
    /// Index name, used to resolve the host when `index_host` is unset
    pub index_name: String,
    /// Data plane host, e.g. "demo-abc123.svc.aped-4627-b74a.pinecone.io"
    pub index_host: Option<String>,
    /// Namespace for upserts and queries (empty = default namespace)
    pub namespace: String,
    /// Hosted embedding model
    pub embed_model: String,
    /// Control plane / inference base URL
    pub api_url: String,
    /// Value of the X-Pinecone-API-Version header
    pub api_version: String,
    /// Cloud used when the index has to be created
    pub cloud: String,
    /// Region used when the index has to be created
    pub region: String,
    /// Maximum inputs per embed request
    pub embed_batch_size: usize,
    /// Maximum records per upsert request
    pub upsert_batch_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_name: "demo".to_string(),
            index_host: None,
            namespace: String::new(),
            embed_model: "llama-text-embed-v2".to_string(),
            api_url: "https://api.pinecone.io".to_string(),
            api_version: "2025-01".to_string(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            embed_batch_size: 96,
            upsert_batch_size: 50,
            timeout_secs: 60,
        }
    }
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Per-backend timeout in seconds; exceeding it falls through to the next backend
    pub timeout_secs: u64,
    /// Answer all questions of a run with a single prompt (false = one prompt per question)
    pub batch_questions: bool,
    /// Backends in fallback order
    pub backends: Vec<BackendConfig>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            batch_questions: true,
            backends: vec![
                BackendConfig::Gemini(GeminiConfig::default()),
                BackendConfig::OpenAiCompatible(OpenAiCompatibleConfig::default()),
            ],
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// One generation backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Google Generative Language API
    Gemini(GeminiConfig),
    /// Any chat-completions endpoint (OpenRouter by default)
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible(OpenAiCompatibleConfig),
}

impl BackendConfig {
    /// Name used in logs and in `LLM_BACKENDS`
    pub fn name(&self) -> &str {
        match self {
            BackendConfig::Gemini(c) => &c.name,
            BackendConfig::OpenAiCompatible(c) => &c.name,
        }
    }

    fn api_key(&self) -> Option<&str> {
        match self {
            BackendConfig::Gemini(c) => c.api_key.as_deref(),
            BackendConfig::OpenAiCompatible(c) => c.api_key.as_deref(),
        }
    }
}

/// Gemini backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub name: String,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            name: "gemini".to_string(),
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.3,
            max_output_tokens: 2048,
        }
    }
}

/// OpenAI-compatible chat-completions backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiCompatibleConfig {
    pub name: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Sent as HTTP-Referer (OpenRouter app attribution)
    pub referer: Option<String>,
    /// Sent as X-Title (OpenRouter app attribution)
    pub title: Option<String>,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OpenAiCompatibleConfig {
    fn default() -> Self {
        Self {
            name: "openrouter".to_string(),
            api_key: None,
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "meta-llama/llama-3-8b-instruct".to_string(),
            referer: Some("https://rag-llm-system.onrender.com".to_string()),
            title: Some("DocAnalyzer Assistant".to_string()),
            system_prompt: "You are a helpful document assistant.".to_string(),
            temperature: 0.3,
            max_tokens: 800,
        }
    }
}

impl RagConfig {
    /// Load configuration from `DOCQA_CONFIG` (if set) and the process environment,
    /// then validate it.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).ok().filter(|p| !p.trim().is_empty());
        Self::load_from(path.as_deref().map(|p| Path::new(p.trim())))
    }

    /// Load from an optional TOML file, apply environment overrides, and validate
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML configuration
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Apply overrides from a key lookup (the process environment in production).
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("PORT") {
            self.server.port = parse_number("PORT", &v)?;
        }
        if let Some(v) = get("INPUT_FOLDER") {
            self.input.folder = PathBuf::from(v);
        }
        if let Some(v) = get("DOWNLOAD_TIMEOUT_SECS") {
            self.input.download_timeout_secs = parse_number("DOWNLOAD_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("CHUNK_WORDS") {
            self.chunking.chunk_words = parse_number("CHUNK_WORDS", &v)?;
        }
        if let Some(v) = get("RETRIEVAL_TOP_K") {
            self.retrieval.top_k = parse_number("RETRIEVAL_TOP_K", &v)?;
        }

        // Pinecone
        if let Some(v) = get("PINECONE_API_KEY") {
            self.pinecone.api_key = Some(v);
        }
        if let Some(v) = get("PINECONE_INDEX_NAME") {
            self.pinecone.index_name = v;
        }
        if let Some(v) = get("PINECONE_INDEX_HOST") {
            self.pinecone.index_host = Some(v);
        }
        if let Some(v) = get("PINECONE_NAMESPACE") {
            self.pinecone.namespace = v;
        }
        if let Some(v) = get("PINECONE_EMBED_MODEL") {
            self.pinecone.embed_model = v;
        }
        if let Some(v) = get("PINECONE_CLOUD") {
            self.pinecone.cloud = v;
        }
        if let Some(v) = get("PINECONE_REGION") {
            self.pinecone.region = v;
        }

        // Generation
        if let Some(v) = get("LLM_TIMEOUT_SECS") {
            self.generation.timeout_secs = parse_number("LLM_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("BATCH_QUESTIONS") {
            self.generation.batch_questions = parse_bool("BATCH_QUESTIONS", &v)?;
        }
        if let Some(model) = get("OPENROUTER_FALLBACK_MODEL") {
            let exists = self
                .generation
                .backends
                .iter()
                .any(|b| b.name() == "openrouter-fallback");
            if !exists {
                self.generation.backends.push(BackendConfig::OpenAiCompatible(
                    OpenAiCompatibleConfig {
                        name: "openrouter-fallback".to_string(),
                        model,
                        ..OpenAiCompatibleConfig::default()
                    },
                ));
            }
        }

        let google_key = get("GOOGLE_API_KEY");
        let gemini_model = get("GEMINI_MODEL");
        let openrouter_key = get("OPENROUTER_API_KEY");
        let openrouter_model = get("OPENROUTER_MODEL");
        let openrouter_url = get("OPENROUTER_BASE_URL");

        for backend in &mut self.generation.backends {
            match backend {
                BackendConfig::Gemini(c) => {
                    if c.api_key.is_none() {
                        c.api_key = google_key.clone();
                    }
                    if let Some(model) = &gemini_model {
                        c.model = model.clone();
                    }
                }
                BackendConfig::OpenAiCompatible(c) => {
                    if c.api_key.is_none() {
                        c.api_key = openrouter_key.clone();
                    }
                    if let Some(url) = &openrouter_url {
                        c.base_url = url.clone();
                    }
                    if c.name == "openrouter" {
                        if let Some(model) = &openrouter_model {
                            c.model = model.clone();
                        }
                    }
                }
            }
        }

        if let Some(order) = get("LLM_BACKENDS") {
            self.generation.backends = select_backends(&self.generation.backends, &order)?;
        }

        Ok(())
    }

    /// Check required settings; fails startup deterministically
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_words == 0 {
            return Err(Error::Config("chunking.chunk_words must be greater than 0".to_string()));
        }
        if self.generation.timeout_secs == 0 {
            return Err(Error::Config("generation.timeout_secs must be greater than 0".to_string()));
        }
        if self.pinecone.embed_batch_size == 0 || self.pinecone.upsert_batch_size == 0 {
            return Err(Error::Config("pinecone batch sizes must be greater than 0".to_string()));
        }
        if self.pinecone.api_key.is_none() {
            return Err(Error::Config("PINECONE_API_KEY not set".to_string()));
        }
        if self.generation.backends.is_empty() {
            return Err(Error::Config("no generation backends configured".to_string()));
        }
        for backend in &self.generation.backends {
            if backend.api_key().is_none() {
                let var = match backend {
                    BackendConfig::Gemini(_) => "GOOGLE_API_KEY",
                    BackendConfig::OpenAiCompatible(_) => "OPENROUTER_API_KEY",
                };
                return Err(Error::Config(format!(
                    "{} not set (required by backend '{}')",
                    var,
                    backend.name()
                )));
            }
        }
        Ok(())
    }
}

/// Reorder/filter backends by a comma-separated list of names
fn select_backends(backends: &[BackendConfig], order: &str) -> Result<Vec<BackendConfig>> {
    order
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            backends
                .iter()
                .find(|b| b.name() == name)
                .cloned()
                .ok_or_else(|| Error::Config(format!("LLM_BACKENDS: unknown backend '{}'", name)))
        })
        .collect()
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number, got '{}'", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{} must be a boolean, got '{}'", key, value))),
    }
}
