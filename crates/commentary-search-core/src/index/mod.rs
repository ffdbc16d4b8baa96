//! Read-only vector index abstraction.
//!
//! The [`DenseIndex`] and [`SparseIndex`] traits describe the two lookups
//! the pipeline needs from the hosted indexes. Both are namespaced and
//! return [`IndexMatch`] records carrying metadata but never the stored
//! vector values.
//!
//! Implementations must be `Send + Sync`; a single handle is shared by
//! every in-flight request.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::models::{IndexMatch, SparseVector};

/// Metadata restriction applied to a dense lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MetadataFilter {
    /// Keep matches whose `field` metadata equals one of `values`.
    In { field: String, values: Vec<String> },
}

impl MetadataFilter {
    pub fn field_in(field: impl Into<String>, values: Vec<String>) -> Self {
        MetadataFilter::In {
            field: field.into(),
            values,
        }
    }

    /// Render in the `{"field": {"$in": [...]}}` filter dialect used by
    /// hosted vector databases.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            MetadataFilter::In { field, values } => {
                serde_json::json!({ field.as_str(): { "$in": values } })
            }
        }
    }
}

/// Parameters for a single dense lookup.
#[derive(Debug, Clone)]
pub struct DenseQuery<'a> {
    pub vector: &'a [f32],
    pub top_k: usize,
    pub namespace: &'a str,
    pub filter: Option<&'a MetadataFilter>,
}

/// Nearest-neighbour lookups over dense embeddings.
#[async_trait]
pub trait DenseIndex: Send + Sync {
    /// Return up to `top_k` matches, best first, with metadata.
    async fn query_dense(&self, query: &DenseQuery<'_>) -> Result<Vec<IndexMatch>>;
}

/// Dot-product lookups over sparse token vectors.
#[async_trait]
pub trait SparseIndex: Send + Sync {
    /// Return up to `top_k` matches, best first, with metadata.
    async fn query_sparse(
        &self,
        vector: &SparseVector,
        top_k: usize,
        namespace: &str,
    ) -> Result<Vec<IndexMatch>>;
}
