//! In-memory [`DenseIndex`] / [`SparseIndex`] implementation for tests
//! and offline use.
//!
//! Records live in a `Vec` behind `std::sync::RwLock`. Dense search is
//! brute-force cosine similarity; sparse search is a dot product over
//! shared indices. Ties keep insertion order.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{HitMetadata, IndexMatch, SparseVector};

use super::{DenseIndex, DenseQuery, MetadataFilter, SparseIndex};

struct StoredRecord {
    id: String,
    namespace: String,
    dense: Option<Vec<f32>>,
    sparse: Option<SparseVector>,
    metadata: HitMetadata,
}

/// In-memory index holding both dense and sparse representations.
pub struct InMemoryIndex {
    records: RwLock<Vec<StoredRecord>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Insert or replace a record by id within `namespace`.
    pub fn upsert(
        &self,
        namespace: &str,
        id: &str,
        dense: Option<Vec<f32>>,
        sparse: Option<SparseVector>,
        metadata: HitMetadata,
    ) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| anyhow!("in-memory index lock poisoned"))?;
        records.retain(|r| !(r.namespace == namespace && r.id == id));
        records.push(StoredRecord {
            id: id.to_string(),
            namespace: namespace.to_string(),
            dense,
            sparse,
            metadata,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn metadata_field(meta: &HitMetadata, field: &str) -> Option<String> {
    match field {
        "page" => meta.page.map(|p| p.to_string()),
        "text" => meta.text.clone(),
        "link" => meta.link.clone(),
        "title" => meta.title.clone(),
        _ => None,
    }
}

fn passes(filter: Option<&MetadataFilter>, meta: &HitMetadata) -> bool {
    match filter {
        None => true,
        Some(MetadataFilter::In { field, values }) => metadata_field(meta, field)
            .map(|v| values.iter().any(|allowed| *allowed == v))
            .unwrap_or(false),
    }
}

fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f32 {
    let lookup: HashMap<u32, f32> = b.entries().collect();
    a.entries()
        .filter_map(|(i, v)| lookup.get(&i).map(|w| v * w))
        .sum()
}

fn rank(mut scored: Vec<IndexMatch>, top_k: usize) -> Vec<IndexMatch> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_k);
    scored
}

#[async_trait]
impl DenseIndex for InMemoryIndex {
    async fn query_dense(&self, query: &DenseQuery<'_>) -> Result<Vec<IndexMatch>> {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("in-memory index lock poisoned"))?;
        let scored = records
            .iter()
            .filter(|r| r.namespace == query.namespace && passes(query.filter, &r.metadata))
            .filter_map(|r| {
                r.dense.as_ref().map(|v| IndexMatch {
                    id: Some(r.id.clone()),
                    score: cosine_similarity(query.vector, v) as f64,
                    metadata: r.metadata.clone(),
                })
            })
            .collect();
        Ok(rank(scored, query.top_k))
    }
}

#[async_trait]
impl SparseIndex for InMemoryIndex {
    async fn query_sparse(
        &self,
        vector: &SparseVector,
        top_k: usize,
        namespace: &str,
    ) -> Result<Vec<IndexMatch>> {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("in-memory index lock poisoned"))?;
        let scored = records
            .iter()
            .filter(|r| r.namespace == namespace)
            .filter_map(|r| {
                let stored = r.sparse.as_ref()?;
                let score = sparse_dot(vector, stored);
                (score > 0.0).then(|| IndexMatch {
                    id: Some(r.id.clone()),
                    score: score as f64,
                    metadata: r.metadata.clone(),
                })
            })
            .collect();
        Ok(rank(scored, top_k))
    }
}
