//! Pinecone client: hosted inference embeddings and serverless index data plane
//!
//! One client serves both the embedding and the vector store traits so the
//! same model configuration is used for indexing and querying.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::PineconeConfig;
use crate::error::{Error, Result};
use crate::providers::embedding::{EmbeddingProvider, InputType};
use crate::providers::vector_store::{VectorMatch, VectorStoreProvider};
use crate::types::StoredRecord;

/// Pinecone REST client
pub struct PineconeClient {
    client: Client,
    api_key: String,
    api_url: String,
    api_version: String,
    /// Data plane base URL (with scheme)
    index_url: String,
    namespace: String,
    embed_model: String,
    embed_batch_size: usize,
    upsert_batch_size: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    parameters: EmbedParameters,
    inputs: Vec<EmbedInput<'a>>,
}

#[derive(Serialize)]
struct EmbedParameters {
    input_type: InputType,
    truncate: &'static str,
}

#[derive(Serialize)]
struct EmbedInput<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [StoredRecord],
    namespace: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    namespace: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
}

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    cloud: &'a str,
    region: &'a str,
    embed: CreateIndexEmbed<'a>,
}

#[derive(Serialize)]
struct CreateIndexEmbed<'a> {
    model: &'a str,
    field_map: serde_json::Value,
}

impl PineconeClient {
    /// Create a client for a known data plane host
    pub fn new(config: &PineconeConfig, index_host: &str) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("PINECONE_API_KEY not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            index_url: with_scheme(index_host),
            namespace: config.namespace.clone(),
            embed_model: config.embed_model.clone(),
            embed_batch_size: config.embed_batch_size.max(1),
            upsert_batch_size: config.upsert_batch_size.max(1),
        })
    }

    /// Create a client, resolving (and if needed creating) the index by name
    /// when no host is configured
    pub async fn connect(config: &PineconeConfig) -> Result<Self> {
        if let Some(host) = &config.index_host {
            return Self::new(config, host);
        }

        let bootstrap = Self::new(config, "")?;
        let host = bootstrap.ensure_index(config).await?;
        tracing::info!("Resolved Pinecone index '{}' to {}", config.index_name, host);
        Ok(Self {
            index_url: with_scheme(&host),
            ..bootstrap
        })
    }

    /// Describe the index, creating it for the embed model when it does not exist
    async fn ensure_index(&self, config: &PineconeConfig) -> Result<String> {
        let url = format!("{}/indexes/{}", self.api_url, config.index_name);
        let response = self.authorized(self.client.get(&url)).send().await?;

        if response.status().is_success() {
            let description: IndexDescription = response.json().await.map_err(|e| {
                Error::vector_db(format!("Failed to parse index description: {}", e))
            })?;
            return Ok(description.host);
        }
        if response.status() != StatusCode::NOT_FOUND {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::vector_db(format!(
                "Describe index '{}' failed ({}): {}",
                config.index_name, status, body
            )));
        }

        tracing::info!(
            "Index '{}' not found, creating it for model {} ({}/{})",
            config.index_name,
            config.embed_model,
            config.cloud,
            config.region
        );
        let request = CreateIndexRequest {
            name: &config.index_name,
            cloud: &config.cloud,
            region: &config.region,
            embed: CreateIndexEmbed {
                model: &config.embed_model,
                field_map: serde_json::json!({ "text": "text" }),
            },
        };
        let response = self
            .authorized(self.client.post(format!("{}/indexes/create-for-model", self.api_url)))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::vector_db(format!(
                "Create index '{}' failed ({}): {}",
                config.index_name, status, body
            )));
        }

        let description: IndexDescription = response
            .json()
            .await
            .map_err(|e| Error::vector_db(format!("Failed to parse created index: {}", e)))?;
        Ok(description.host)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.api_version)
    }

    async fn embed_request(&self, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>> {
        let request = EmbedRequest {
            model: &self.embed_model,
            parameters: EmbedParameters {
                input_type,
                truncate: "END",
            },
            inputs: texts.iter().map(|t| EmbedInput { text: t }).collect(),
        };

        let response = self
            .authorized(self.client.post(format!("{}/embed", self.api_url)))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::embedding(format!("Pinecone embed request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!(
                "Pinecone embedding failed ({}): {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Failed to parse Pinecone embed response: {}", e)))?;

        if embed_response.data.len() != texts.len() {
            return Err(Error::embedding(format!(
                "Pinecone returned {} embeddings for {} inputs",
                embed_response.data.len(),
                texts.len()
            )));
        }

        Ok(embed_response.data.into_iter().map(|d| d.values).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for PineconeClient {
    async fn embed_batch(&self, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.embed_batch_size) {
            all_embeddings.extend(self.embed_request(batch, input_type).await?);
        }

        tracing::debug!("Embedded {} texts as {:?}", texts.len(), input_type);
        Ok(all_embeddings)
    }

    fn model(&self) -> &str {
        &self.embed_model
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}

#[async_trait]
impl VectorStoreProvider for PineconeClient {
    async fn upsert(&self, records: &[StoredRecord]) -> Result<usize> {
        let mut upserted = 0;

        for batch in records.chunks(self.upsert_batch_size) {
            let request = UpsertRequest {
                vectors: batch,
                namespace: &self.namespace,
            };

            let response = self
                .authorized(self.client.post(format!("{}/vectors/upsert", self.index_url)))
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::vector_db(format!("Pinecone upsert request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::vector_db(format!(
                    "Pinecone upsert failed ({}): {}",
                    status, body
                )));
            }

            let upsert_response: UpsertResponse = response
                .json()
                .await
                .map_err(|e| Error::vector_db(format!("Failed to parse upsert response: {}", e)))?;
            upserted += upsert_response.upserted_count;
        }

        Ok(upserted)
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: &self.namespace,
        };

        let response = self
            .authorized(self.client.post(format!("{}/query", self.index_url)))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Pinecone query request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::vector_db(format!(
                "Pinecone query failed ({}): {}",
                status, body
            )));
        }

        let query_response: QueryResponse = response
            .json()
            .await
            .map_err(|e| Error::vector_db(format!("Failed to parse query response: {}", e)))?;

        Ok(query_response.matches)
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}

/// Index hosts are reported without a scheme
fn with_scheme(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}
