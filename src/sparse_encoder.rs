//! Remote sparse (lexical) query encoder.
//!
//! The weighting model runs as a separate HTTP service:
//!
//! ```text
//! POST {url}   {"query": "..."}
//!           -> {"token_weights": {"fast": 0.42, "##ing": 0.31, ...}}
//! ```
//!
//! Token strings are resolved to index ids with the vocabulary of the
//! HuggingFace tokenizer the sparse index was built with. Object key order
//! in the response is preserved so the resulting [`SparseVector`] order is
//! stable across runs.
//!
//! [`SparseVector`]: commentary_search_core::models::SparseVector

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use commentary_search_core::embedding::SparseEncoder;
use std::path::Path;
use tokenizers::Tokenizer;

use crate::config::SparseConfig;
use crate::http;

pub struct HttpSparseEncoder {
    url: String,
    tokenizer: Tokenizer,
    max_retries: u32,
    client: reqwest::Client,
}

impl HttpSparseEncoder {
    pub fn new(config: &SparseConfig) -> Result<Self> {
        Ok(Self {
            url: config.url.clone(),
            tokenizer: load_tokenizer(&config.tokenizer_path)?,
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }
}

fn load_tokenizer(path: &Path) -> Result<Tokenizer> {
    Tokenizer::from_file(path)
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("Failed to load tokenizer: {}", path.display()))
}

#[async_trait]
impl SparseEncoder for HttpSparseEncoder {
    async fn embed_sparse(&self, text: &str) -> Result<Vec<(String, f32)>> {
        let body = serde_json::json!({ "query": text });
        let json = http::send_json("sparse encoder", self.max_retries, || {
            self.client.post(&self.url).json(&body)
        })
        .await?;
        parse_token_weights(&json)
    }

    fn token_id(&self, token: &str) -> Option<u32> {
        self.tokenizer.token_to_id(token)
    }
}

/// Extract the `token_weights` object as ordered `(token, weight)` pairs.
fn parse_token_weights(json: &serde_json::Value) -> Result<Vec<(String, f32)>> {
    let weights = json
        .get("token_weights")
        .and_then(|w| w.as_object())
        .ok_or_else(|| anyhow!("Invalid sparse encoder response: missing token_weights"))?;
    weights
        .iter()
        .map(|(token, w)| {
            let w = w
                .as_f64()
                .ok_or_else(|| anyhow!("Invalid weight for token '{}'", token))?;
            Ok((token.clone(), w as f32))
        })
        .collect()
}
