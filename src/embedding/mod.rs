//! Dense embedding providers.
//!
//! Implements [`DenseEmbedder`] for the supported backends:
//! - **[`DisabledEmbedder`]**: returns errors; used when embeddings are not configured.
//! - **[`OpenAIEmbedder`]**: calls the OpenAI embeddings API.
//! - **[`OllamaEmbedder`]**: calls a local Ollama instance's `/api/embed` endpoint.
//! - **[`GeminiEmbedder`]**: calls the Gemini `embedContent` endpoint.
//!
//! All remote providers share the retry/backoff policy in [`crate::http`].
//!
//! # Provider Selection
//!
//! Use [`create_embedder`] to instantiate the provider named in config:
//!
//! ```rust
//! # use commentary_search::config::EmbeddingConfig;
//! # use commentary_search::embedding::create_embedder;
//! let config = EmbeddingConfig::default(); // provider = "disabled"
//! let embedder = create_embedder(&config).unwrap();
//! assert_eq!(embedder.model_name(), "disabled");
//! ```

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use commentary_search_core::embedding::DenseEmbedder;
use std::sync::Arc;

use crate::config::EmbeddingConfig;
use crate::http;

const OPENAI_URL: &str = "https://api.openai.com";
const OLLAMA_URL: &str = "http://localhost:11434";
const GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

fn required_model(config: &EmbeddingConfig, provider: &str) -> Result<String> {
    config
        .model
        .clone()
        .ok_or_else(|| anyhow!("embedding.model required for {} provider", provider))
}

fn required_dims(config: &EmbeddingConfig, provider: &str) -> Result<usize> {
    config
        .dims
        .ok_or_else(|| anyhow!("embedding.dims required for {} provider", provider))
}

fn parse_vector(values: &serde_json::Value, what: &str) -> Result<Vec<f32>> {
    let array = values
        .as_array()
        .ok_or_else(|| anyhow!("Invalid {} response: embedding is not an array", what))?;
    array
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64().map(|f| f as f32).ok_or_else(|| {
                anyhow!("Invalid {} response: embedding[{}] is not a number", what, i)
            })
        })
        .collect()
}

fn check_dims(vector: Vec<f32>, dims: usize, what: &str) -> Result<Vec<f32>> {
    if vector.len() != dims {
        bail!(
            "{} returned {} dimensions, expected {}",
            what,
            vector.len(),
            dims
        );
    }
    Ok(vector)
}

// ============ Disabled Provider ============

/// A no-op embedder that always returns errors.
pub struct DisabledEmbedder;

#[async_trait]
impl DenseEmbedder for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed_dense(&self, _text: &str) -> Result<Vec<f32>> {
        bail!("Embedding provider is disabled")
    }
}

// ============ OpenAI Provider ============

/// Embedder using the OpenAI `POST /v1/embeddings` endpoint.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAIEmbedder {
    model: String,
    dims: usize,
    url: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAIEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            model: required_model(config, "OpenAI")?,
            dims: required_dims(config, "OpenAI")?,
            url: config.url.clone().unwrap_or_else(|| OPENAI_URL.to_string()),
            api_key: http::api_key("OPENAI_API_KEY")?,
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl DenseEmbedder for OpenAIEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed_dense(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": [text],
            "dimensions": self.dims,
        });
        let url = http::join_url(&self.url, "v1/embeddings");
        let json = http::send_json("OpenAI embeddings", self.max_retries, || {
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
        })
        .await?;
        check_dims(parse_openai_response(&json)?, self.dims, "OpenAI")
    }
}

/// Extract `data[0].embedding` from an OpenAI embeddings response.
fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<f32>> {
    let first = json
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .ok_or_else(|| anyhow!("Invalid OpenAI response: missing data array"))?;
    let embedding = first
        .get("embedding")
        .ok_or_else(|| anyhow!("Invalid OpenAI response: missing embedding"))?;
    parse_vector(embedding, "OpenAI")
}

// ============ Ollama Provider ============

/// Embedder using a local Ollama instance (`POST /api/embed`).
pub struct OllamaEmbedder {
    model: String,
    dims: usize,
    url: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            model: required_model(config, "Ollama")?,
            dims: required_dims(config, "Ollama")?,
            url: config.url.clone().unwrap_or_else(|| OLLAMA_URL.to_string()),
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl DenseEmbedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed_dense(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": [text],
        });
        let url = http::join_url(&self.url, "api/embed");
        let json = http::send_json("Ollama embeddings", self.max_retries, || {
            self.client.post(&url).json(&body)
        })
        .await?;
        check_dims(parse_ollama_response(&json)?, self.dims, "Ollama")
    }
}

/// Extract `embeddings[0]` from an Ollama `/api/embed` response.
fn parse_ollama_response(json: &serde_json::Value) -> Result<Vec<f32>> {
    let first = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .and_then(|e| e.first())
        .ok_or_else(|| anyhow!("Invalid Ollama response: missing embeddings array"))?;
    parse_vector(first, "Ollama")
}

// ============ Gemini Provider ============

/// Embedder using the Gemini `models/{model}:embedContent` endpoint.
///
/// Requires the `GOOGLE_API_KEY` environment variable. Queries are
/// embedded with the `RETRIEVAL_QUERY` task type.
pub struct GeminiEmbedder {
    model: String,
    dims: usize,
    url: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl GeminiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            model: required_model(config, "Gemini")?,
            dims: required_dims(config, "Gemini")?,
            url: config.url.clone().unwrap_or_else(|| GEMINI_URL.to_string()),
            api_key: http::api_key("GOOGLE_API_KEY")?,
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl DenseEmbedder for GeminiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed_dense(&self, text: &str) -> Result<Vec<f32>> {
        let model = format!("models/{}", self.model);
        let body = serde_json::json!({
            "model": model,
            "content": { "parts": [{ "text": text }] },
            "taskType": "RETRIEVAL_QUERY",
        });
        let url = http::join_url(&self.url, &format!("v1beta/{}:embedContent", model));
        let json = http::send_json("Gemini embeddings", self.max_retries, || {
            self.client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
        })
        .await?;
        check_dims(parse_gemini_response(&json)?, self.dims, "Gemini")
    }
}

/// Extract `embedding.values` from a Gemini `embedContent` response.
fn parse_gemini_response(json: &serde_json::Value) -> Result<Vec<f32>> {
    let values = json
        .get("embedding")
        .and_then(|e| e.get("values"))
        .ok_or_else(|| anyhow!("Invalid Gemini response: missing embedding.values"))?;
    parse_vector(values, "Gemini")
}

/// Create the [`DenseEmbedder`] named by `embedding.provider`.
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledEmbedder`] |
/// | `"openai"` | [`OpenAIEmbedder`] |
/// | `"ollama"` | [`OllamaEmbedder`] |
/// | `"gemini"` | [`GeminiEmbedder`] |
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn DenseEmbedder>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledEmbedder)),
        "openai" => Ok(Arc::new(OpenAIEmbedder::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(config)?)),
        "gemini" => Ok(Arc::new(GeminiEmbedder::new(config)?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}
