//! Client for Pinecone-compatible hosted indexes.
//!
//! One [`PineconeIndex`] handle talks to a single index host and serves both
//! dense and sparse lookups through `POST {host}/query`. Deployments keep
//! the dense and sparse corpora in separate indexes, so the app builds one
//! handle per host.
//!
//! Stored vector values are never requested (`includeValues: false`); only
//! scores and metadata travel back.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use commentary_search_core::index::{DenseIndex, DenseQuery, SparseIndex};
use commentary_search_core::models::{IndexMatch, SparseVector};

use crate::config::IndexConfig;
use crate::http;

const API_VERSION: &str = "2024-07";

pub struct PineconeIndex {
    query_url: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl PineconeIndex {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        Ok(Self {
            query_url: http::join_url(&config.host, "query"),
            api_key: http::api_key(&config.api_key_env)?,
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }

    async fn query(&self, label: &str, body: serde_json::Value) -> Result<Vec<IndexMatch>> {
        let json = http::send_json(label, self.max_retries, || {
            self.client
                .post(&self.query_url)
                .header("Api-Key", &self.api_key)
                .header("X-Pinecone-API-Version", API_VERSION)
                .json(&body)
        })
        .await?;
        parse_matches(json)
    }
}

#[async_trait]
impl DenseIndex for PineconeIndex {
    async fn query_dense(&self, query: &DenseQuery<'_>) -> Result<Vec<IndexMatch>> {
        let mut body = serde_json::json!({
            "namespace": query.namespace,
            "vector": query.vector,
            "topK": query.top_k,
            "includeMetadata": true,
            "includeValues": false,
        });
        if let Some(filter) = query.filter {
            body["filter"] = filter.to_json();
        }
        self.query("dense index", body).await
    }
}

#[async_trait]
impl SparseIndex for PineconeIndex {
    async fn query_sparse(
        &self,
        vector: &SparseVector,
        top_k: usize,
        namespace: &str,
    ) -> Result<Vec<IndexMatch>> {
        let body = serde_json::json!({
            "namespace": namespace,
            "sparseVector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "includeValues": false,
        });
        self.query("sparse index", body).await
    }
}

/// Decode the `matches` array of a query response.
fn parse_matches(json: serde_json::Value) -> Result<Vec<IndexMatch>> {
    let matches = json
        .get("matches")
        .cloned()
        .ok_or_else(|| anyhow!("Invalid index response: missing matches"))?;
    Ok(serde_json::from_value(matches)?)
}
