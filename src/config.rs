use anyhow::{Context, Result};
use commentary_search_core::format::CitationFormat;
use commentary_search_core::pipeline::RetrievalParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub citation: CitationConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    pub sparse: SparseConfig,
    pub dense_index: IndexConfig,
    pub sparse_index: IndexConfig,
    #[serde(default)]
    pub rerank: RerankConfig,
    #[serde(default)]
    pub verse: VerseConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub dense_top_k: usize,
    #[serde(default = "default_top_k")]
    pub sparse_top_k: usize,
    #[serde(default = "default_rerank_top_n")]
    pub rerank_top_n: usize,
    #[serde(default = "default_window_top_k")]
    pub window_top_k: usize,
    #[serde(default = "default_timeout_secs")]
    pub call_timeout_secs: u64,
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
    #[serde(default = "default_namespaces")]
    pub namespaces: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            dense_top_k: default_top_k(),
            sparse_top_k: default_top_k(),
            rerank_top_n: default_rerank_top_n(),
            window_top_k: default_window_top_k(),
            call_timeout_secs: default_timeout_secs(),
            default_namespace: default_namespace(),
            namespaces: default_namespaces(),
        }
    }
}

impl RetrievalConfig {
    pub fn params(&self) -> RetrievalParams {
        RetrievalParams {
            dense_top_k: self.dense_top_k,
            sparse_top_k: self.sparse_top_k,
            rerank_top_n: self.rerank_top_n,
            window_top_k: self.window_top_k,
            call_timeout: Duration::from_secs(self.call_timeout_secs),
        }
    }
}

fn default_top_k() -> usize {
    40
}
fn default_rerank_top_n() -> usize {
    5
}
fn default_window_top_k() -> usize {
    3
}
fn default_namespace() -> String {
    "quran-english-five-volume-1".to_string()
}
fn default_namespaces() -> Vec<String> {
    vec![default_namespace()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct CitationConfig {
    #[serde(default = "default_page_param")]
    pub page_param: String,
    #[serde(default = "default_code_param")]
    pub code_param: String,
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            page_param: default_page_param(),
            code_param: default_code_param(),
        }
    }
}

impl CitationConfig {
    pub fn format(&self) -> CitationFormat {
        CitationFormat {
            page_param: self.page_param.clone(),
            code_param: self.code_param.clone(),
        }
    }
}

fn default_page_param() -> String {
    "page".to_string()
}
fn default_code_param() -> String {
    "code".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL override (Ollama host, or a Gemini/OpenAI-compatible proxy).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            url: None,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

/// Sparse token-weight service and the vocabulary used to resolve its tokens.
#[derive(Debug, Deserialize, Clone)]
pub struct SparseConfig {
    pub url: String,
    /// HuggingFace `tokenizer.json` whose vocabulary maps tokens to ids.
    pub tokenizer_path: PathBuf,
    #[serde(default = "default_sparse_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_sparse_retries() -> u32 {
    3
}

/// A hosted vector index reachable at `host`.
#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    pub host: String,
    #[serde(default = "default_index_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_index_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_index_key_env() -> String {
    "PINECONE_API_KEY".to_string()
}
fn default_index_retries() -> u32 {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct RerankConfig {
    #[serde(default = "default_rerank_provider")]
    pub provider: String,
    #[serde(default = "default_rerank_model")]
    pub model: String,
    #[serde(default = "default_rerank_url")]
    pub url: String,
    #[serde(default = "default_rerank_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_index_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            provider: default_rerank_provider(),
            model: default_rerank_model(),
            url: default_rerank_url(),
            api_key_env: default_rerank_key_env(),
            max_retries: default_index_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_rerank_provider() -> String {
    "cohere".to_string()
}
fn default_rerank_model() -> String {
    "rerank-multilingual-v3.0".to_string()
}
fn default_rerank_url() -> String {
    "https://api.cohere.com".to_string()
}
fn default_rerank_key_env() -> String {
    "COHERE_API_KEY".to_string()
}

/// Verse service backing the `find_verse` tool.
#[derive(Debug, Deserialize, Clone)]
pub struct VerseConfig {
    #[serde(default = "default_verse_url")]
    pub url: String,
    #[serde(default = "default_index_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VerseConfig {
    fn default() -> Self {
        Self {
            url: default_verse_url(),
            max_retries: default_index_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_verse_url() -> String {
    "https://api.openquran.com".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    let r = &config.retrieval;
    if r.dense_top_k < 1 || r.sparse_top_k < 1 {
        anyhow::bail!("retrieval.dense_top_k and retrieval.sparse_top_k must be >= 1");
    }
    if r.rerank_top_n < 1 {
        anyhow::bail!("retrieval.rerank_top_n must be >= 1");
    }
    if r.window_top_k < 1 {
        anyhow::bail!("retrieval.window_top_k must be >= 1");
    }
    if r.call_timeout_secs == 0 {
        anyhow::bail!("retrieval.call_timeout_secs must be > 0");
    }
    if !r.namespaces.contains(&r.default_namespace) {
        anyhow::bail!(
            "retrieval.default_namespace '{}' must be listed in retrieval.namespaces",
            r.default_namespace
        );
    }

    if config.citation.page_param.is_empty() || config.citation.code_param.is_empty() {
        anyhow::bail!("citation.page_param and citation.code_param must not be empty");
    }

    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" | "gemini" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, or gemini.",
            other
        ),
    }

    match config.rerank.provider.as_str() {
        "disabled" | "cohere" => {}
        other => anyhow::bail!(
            "Unknown rerank provider: '{}'. Must be disabled or cohere.",
            other
        ),
    }

    Ok(())
}
