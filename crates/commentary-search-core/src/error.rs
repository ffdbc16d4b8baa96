//! Error taxonomy for a retrieval request.
//!
//! A request either succeeds (possibly with zero results, meaning "no
//! relevant content") or fails with one of these variants. The two are
//! never conflated: callers can always tell an empty answer from a broken
//! service.

use serde::Serialize;
use thiserror::Error;

/// External capability a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    DenseEmbedder,
    SparseEncoder,
    DenseIndex,
    SparseIndex,
    Reranker,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Service::DenseEmbedder => "dense embedder",
            Service::SparseEncoder => "sparse encoder",
            Service::DenseIndex => "dense index",
            Service::SparseIndex => "sparse index",
            Service::Reranker => "reranker",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    /// The raw query was empty or otherwise unusable.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// An embedder, index or reranker was unreachable, failed, or timed out.
    #[error("Retrieval unavailable: {service} failed: {reason}")]
    RetrievalUnavailable { service: Service, reason: String },

    /// The reranker referenced a candidate that does not exist.
    #[error("Reranker contract violation: index {index} out of range for {len} candidates")]
    RerankContractViolation { index: usize, len: usize },
}

impl SearchError {
    pub fn unavailable(service: Service, err: &anyhow::Error) -> Self {
        SearchError::RetrievalUnavailable {
            service,
            reason: format!("{:#}", err),
        }
    }

    /// True for failures of an external service, as opposed to bad input
    /// or a broken integration contract.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SearchError::RetrievalUnavailable { .. })
    }
}
