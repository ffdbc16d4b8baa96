//! Cross-encoder reranking capability and index mapping.
//!
//! The reranker scores `(query, candidate_text)` pairs and returns a
//! relevance-ordered subset as indices into the list it was given. The
//! pipeline's only job is mapping those indices back to candidates in the
//! returned order. It never re-sorts by the pre-rerank score.

use anyhow::Result;
use async_trait::async_trait;

use crate::error::SearchError;
use crate::models::{RerankedResult, RetrievedHit};

/// External relevance-scoring capability.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Returns the model identifier (e.g. `"rerank-multilingual-v3.0"`).
    fn model_name(&self) -> &str;

    /// Score `documents` against `query` and return at most `top_n`
    /// results, most relevant first.
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<RerankedResult>>;
}

/// Map reranker output back onto the merged candidates.
///
/// Order follows `results` exactly. Any index outside `candidates` is a
/// contract violation and fails the whole mapping.
pub fn resolve_reranked<'a>(
    candidates: &'a [RetrievedHit],
    results: &[RerankedResult],
) -> Result<Vec<&'a RetrievedHit>, SearchError> {
    results
        .iter()
        .map(|r| {
            candidates
                .get(r.index)
                .ok_or(SearchError::RerankContractViolation {
                    index: r.index,
                    len: candidates.len(),
                })
        })
        .collect()
}

/// Reranker with a fixed answer, for tests and offline use.
///
/// With a script it returns the scripted results (truncated to `top_n`)
/// whatever the documents are. [`ScriptedReranker::passthrough`] keeps the
/// incoming order instead, with relevance falling off by position.
#[derive(Debug, Clone, Default)]
pub struct ScriptedReranker {
    script: Option<Vec<RerankedResult>>,
}

impl ScriptedReranker {
    pub fn new(results: Vec<RerankedResult>) -> Self {
        Self {
            script: Some(results),
        }
    }

    pub fn passthrough() -> Self {
        Self { script: None }
    }
}

#[async_trait]
impl Reranker for ScriptedReranker {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn rerank(
        &self,
        _query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<RerankedResult>> {
        Ok(match &self.script {
            Some(results) => results.iter().take(top_n).copied().collect(),
            None => (0..documents.len().min(top_n))
                .map(|index| RerankedResult {
                    index,
                    relevance: 1.0 / (index as f64 + 1.0),
                })
                .collect(),
        })
    }
}
