//! Cross-encoder reranking providers.
//!
//! - **[`CohereReranker`]**: calls the Cohere `POST /v2/rerank` endpoint.
//! - **[`DisabledReranker`]**: always fails, so a search without a
//!   configured reranker reports the reranker as unavailable rather than
//!   silently returning unranked candidates.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use commentary_search_core::models::RerankedResult;
use commentary_search_core::rerank::Reranker;
use std::sync::Arc;

use crate::config::RerankConfig;
use crate::http;

pub struct CohereReranker {
    model: String,
    url: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl CohereReranker {
    pub fn new(config: &RerankConfig) -> Result<Self> {
        Ok(Self {
            model: config.model.clone(),
            url: http::join_url(&config.url, "v2/rerank"),
            api_key: http::api_key(&config.api_key_env)?,
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl Reranker for CohereReranker {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<RerankedResult>> {
        let body = serde_json::json!({
            "model": self.model,
            "query": query,
            "documents": documents,
            "top_n": top_n,
        });
        let json = http::send_json("Cohere rerank", self.max_retries, || {
            self.client
                .post(&self.url)
                .bearer_auth(&self.api_key)
                .json(&body)
        })
        .await?;
        parse_rerank_response(&json)
    }
}

/// Extract `results[].{index, relevance_score}` in response order.
fn parse_rerank_response(json: &serde_json::Value) -> Result<Vec<RerankedResult>> {
    let results = json
        .get("results")
        .and_then(|r| r.as_array())
        .ok_or_else(|| anyhow!("Invalid rerank response: missing results array"))?;
    results
        .iter()
        .map(|r| {
            let index = r
                .get("index")
                .and_then(|i| i.as_u64())
                .ok_or_else(|| anyhow!("Invalid rerank response: result without index"))?;
            let relevance = r
                .get("relevance_score")
                .and_then(|s| s.as_f64())
                .ok_or_else(|| {
                    anyhow!(
                        "Invalid rerank response: result {} without numeric relevance_score",
                        index
                    )
                })?;
            Ok(RerankedResult {
                index: index as usize,
                relevance,
            })
        })
        .collect()
}

pub struct DisabledReranker;

#[async_trait]
impl Reranker for DisabledReranker {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn rerank(
        &self,
        _query: &str,
        _documents: &[String],
        _top_n: usize,
    ) -> Result<Vec<RerankedResult>> {
        bail!("Rerank provider is disabled")
    }
}

/// Create the [`Reranker`] named by `rerank.provider`.
pub fn create_reranker(config: &RerankConfig) -> Result<Arc<dyn Reranker>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledReranker)),
        "cohere" => Ok(Arc::new(CohereReranker::new(config)?)),
        other => bail!("Unknown rerank provider: {}", other),
    }
}
