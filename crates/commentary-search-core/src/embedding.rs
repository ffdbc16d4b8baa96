//! Embedding provider traits and vector utilities.
//!
//! The embedding provider is an opaque external capability split into two
//! traits, because in practice the dense and sparse representations come
//! from different models:
//!
//! - [`DenseEmbedder`] turns query text into a dense vector.
//! - [`SparseEncoder`] turns query text into token weights and resolves
//!   tokens to vocabulary ids.
//!
//! Remote implementations (OpenAI, Ollama, Gemini, HTTP sparse service)
//! live in the `commentary-search` app crate. [`StaticEncoder`] is a
//! fixed-vocabulary implementation of both traits for tests and offline use.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Dense embedding capability.
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait DenseEmbedder: Send + Sync {
    /// Returns the model identifier (e.g. `"gemini-embedding-exp-03-07"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `3072`).
    fn dims(&self) -> usize;
    /// Embed a single query text.
    async fn embed_dense(&self, text: &str) -> Result<Vec<f32>>;
}

/// Sparse (lexical) encoding capability.
#[async_trait]
pub trait SparseEncoder: Send + Sync {
    /// Compute per-token weights for `text`, in the order the model
    /// emitted them.
    async fn embed_sparse(&self, text: &str) -> Result<Vec<(String, f32)>>;

    /// Resolve a decoded token to its vocabulary id.
    fn token_id(&self, token: &str) -> Option<u32>;
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` for empty vectors, vectors
/// of different lengths, or a zero-magnitude operand.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Offline encoder over a fixed vocabulary.
///
/// Text is lowercased and split on whitespace, with surrounding ASCII
/// punctuation stripped from each word. Sparse weights are `1.0` per
/// occurrence in token order (repeats are kept, the vector builder sums
/// them). The dense vector is a bag of words: each known token adds `1.0`
/// at `id % dims`.
#[derive(Debug, Clone)]
pub struct StaticEncoder {
    vocab: HashMap<String, u32>,
    dims: usize,
}

impl StaticEncoder {
    pub fn new<I, S>(vocab: I, dims: usize) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        Self {
            vocab: vocab.into_iter().map(|(t, id)| (t.into(), id)).collect(),
            dims,
        }
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split_whitespace()
            .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()).to_lowercase())
            .filter(|w| !w.is_empty())
    }
}

#[async_trait]
impl DenseEmbedder for StaticEncoder {
    fn model_name(&self) -> &str {
        "static"
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_dense(&self, text: &str) -> Result<Vec<f32>> {
        if self.dims == 0 {
            anyhow::bail!("static encoder has no dimensions");
        }
        let mut vector = vec![0.0; self.dims];
        for token in Self::tokens(text) {
            if let Some(id) = self.vocab.get(&token) {
                vector[*id as usize % self.dims] += 1.0;
            }
        }
        Ok(vector)
    }
}

#[async_trait]
impl SparseEncoder for StaticEncoder {
    async fn embed_sparse(&self, text: &str) -> Result<Vec<(String, f32)>> {
        Ok(Self::tokens(text).map(|t| (t, 1.0)).collect())
    }

    fn token_id(&self, token: &str) -> Option<u32> {
        self.vocab.get(token).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> StaticEncoder {
        StaticEncoder::new([("fasting", 7), ("prayer", 8), ("ramadan", 11)], 4)
    }

    #[tokio::test]
    async fn test_static_sparse_tokens() {
        let weights = encoder().embed_sparse("Fasting, in Ramadan!").await.unwrap();
        let tokens: Vec<&str> = weights.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tokens, vec!["fasting", "in", "ramadan"]);
        assert_eq!(encoder().token_id("in"), None);
        assert_eq!(encoder().token_id("ramadan"), Some(11));
    }

    #[tokio::test]
    async fn test_static_dense_bag_of_words() {
        // 7 % 4 = 3, 11 % 4 = 3, 8 % 4 = 0
        let v = encoder().embed_dense("fasting ramadan prayer").await.unwrap();
        assert_eq!(v, vec![1.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_different_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }
}
