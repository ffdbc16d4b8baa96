//! Data types flowing through the retrieval pipeline.
//!
//! Every value here is created per request and dropped when the request
//! finishes; nothing is cached across queries.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SearchError;

/// A validated, non-empty question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    /// Validate raw query text.
    ///
    /// Leading and trailing whitespace is removed. Text that is empty after
    /// trimming is rejected with [`SearchError::InvalidQuery`] so it never
    /// reaches the external services.
    pub fn parse(raw: &str) -> Result<Self, SearchError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SearchError::InvalidQuery(
                "query must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sparse query vector as parallel `indices` / `values` sequences.
///
/// Indices are unique within a vector and values are non-negative. Entry
/// order follows first appearance in the token stream and carries no
/// meaning; callers must not assume the indices are sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Iterate `(index, value)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }
}

/// Which retrieval method produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitSource {
    Dense,
    Sparse,
}

impl std::fmt::Display for HitSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HitSource::Dense => f.write_str("dense"),
            HitSource::Sparse => f.write_str("sparse"),
        }
    }
}

/// Metadata stored alongside every indexed chunk.
///
/// `page` is accepted as either a JSON number or a numeric string, since
/// both shapes exist in deployed indexes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitMetadata {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "deserialize_page")]
    pub page: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
}

/// A raw match as returned by a dense or sparse index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMatch {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub metadata: HitMetadata,
}

/// A scored chunk in the common shape shared by both retrieval methods.
///
/// `score` is only meaningful relative to other hits from the same
/// [`source`](RetrievedHit::source); cosine similarity and lexical
/// dot-product scores are not on a shared scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedHit {
    /// Chunk text with surrounding whitespace removed. Dedup key.
    pub text: String,
    pub score: f64,
    pub link: Option<String>,
    pub page: Option<i64>,
    pub title: Option<String>,
    pub source: HitSource,
}

impl RetrievedHit {
    /// Normalize an index match into a hit tagged with `source`.
    pub fn from_match(m: IndexMatch, source: HitSource) -> Self {
        let HitMetadata {
            text,
            link,
            page,
            title,
        } = m.metadata;
        Self {
            text: text.as_deref().map(str::trim).unwrap_or_default().to_string(),
            score: m.score,
            link,
            page,
            title,
            source,
        }
    }
}

/// One reranker verdict: a position in the merged candidate list and the
/// relevance score the cross-encoder assigned to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RerankedResult {
    pub index: usize,
    pub relevance: f64,
}

/// A citation-ready chunk produced by context expansion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedChunk {
    pub content: String,
    pub link: Option<String>,
    pub page: Option<i64>,
    pub title: Option<String>,
}

impl ExpandedChunk {
    pub fn from_match(m: IndexMatch) -> Self {
        Self {
            content: m.metadata.text.unwrap_or_default(),
            link: m.metadata.link,
            page: m.metadata.page,
            title: m.metadata.title,
        }
    }

    /// The chunk a candidate contributes when its window cannot be fetched.
    pub fn from_hit(hit: &RetrievedHit) -> Self {
        Self {
            content: hit.text.clone(),
            link: hit.link.clone(),
            page: hit.page,
            title: hit.title.clone(),
        }
    }
}

fn deserialize_page<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPage {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<RawPage>::deserialize(deserializer)? {
        Some(RawPage::Int(n)) => Some(n),
        Some(RawPage::Float(f)) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
        Some(RawPage::Float(_)) => None,
        Some(RawPage::Text(s)) => s.trim().parse::<i64>().ok(),
        None => None,
    })
}
