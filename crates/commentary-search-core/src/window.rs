//! Page-window context expansion.
//!
//! Reranked hits are short chunks. Each one is widened to its physical
//! page neighbourhood (`page - 1`, `page`, `page + 1`) by a filtered dense
//! lookup that uses a zero vector: only the metadata filter matters, so
//! every match scores the same and the index's own order is kept.
//!
//! Lookups for different candidates run concurrently. Output is flattened
//! in candidate order, then in the order each lookup returned its matches.
//! Overlapping windows are not deduplicated across candidates.

use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;

use crate::index::{DenseIndex, DenseQuery, MetadataFilter};
use crate::models::{ExpandedChunk, RetrievedHit};

/// Metadata field holding the physical page number.
pub const PAGE_FIELD: &str = "page";

/// The three-page neighbourhood around a hit.
///
/// No clamping is applied: a window around page 1 includes page 0, which
/// simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub center: i64,
}

impl PageWindow {
    pub fn around(page: i64) -> Self {
        Self { center: page }
    }

    pub fn pages(&self) -> [i64; 3] {
        [self.center - 1, self.center, self.center + 1]
    }

    /// Pages as strings, the form page metadata is filtered on.
    pub fn labels(&self) -> Vec<String> {
        self.pages().iter().map(|p| p.to_string()).collect()
    }

    pub fn filter(&self) -> MetadataFilter {
        MetadataFilter::field_in(PAGE_FIELD, self.labels())
    }
}

/// A candidate whose window lookup failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpansionFailure {
    pub page: i64,
    pub reason: String,
}

/// Flattened expansion output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Expansion {
    pub chunks: Vec<ExpandedChunk>,
    pub failures: Vec<ExpansionFailure>,
}

/// Expands reranked candidates against the dense index.
pub struct ContextExpander<'a> {
    pub index: &'a dyn DenseIndex,
    pub namespace: &'a str,
    /// Dense index dimensionality, used to size the zero vector.
    pub dims: usize,
    /// Maximum matches per window.
    pub top_k: usize,
    pub call_timeout: Duration,
}

impl ContextExpander<'_> {
    /// Expand every candidate and flatten the results in candidate order.
    ///
    /// A failed or timed-out lookup does not abort the others: the failure
    /// is recorded and the candidate contributes its own chunk instead.
    /// Candidates without a page contribute their own chunk directly.
    pub async fn expand(&self, candidates: &[&RetrievedHit]) -> Expansion {
        let zero = vec![0.0f32; self.dims];

        let lookups = candidates.iter().map(|hit| self.expand_one(&zero, hit));
        let per_candidate = join_all(lookups).await;

        let mut expansion = Expansion::default();
        for (hit, outcome) in candidates.iter().zip(per_candidate) {
            match outcome {
                Ok(chunks) => expansion.chunks.extend(chunks),
                Err(failure) => {
                    tracing::warn!(
                        page = failure.page,
                        reason = %failure.reason,
                        "context window lookup failed; keeping matched chunk"
                    );
                    expansion.failures.push(failure);
                    expansion.chunks.push(ExpandedChunk::from_hit(hit));
                }
            }
        }
        expansion
    }

    async fn expand_one(
        &self,
        zero: &[f32],
        hit: &RetrievedHit,
    ) -> Result<Vec<ExpandedChunk>, ExpansionFailure> {
        // Dropping a page-less candidate would lose a reranked citation.
        let Some(page) = hit.page else {
            tracing::debug!("candidate has no page metadata; skipping window lookup");
            return Ok(vec![ExpandedChunk::from_hit(hit)]);
        };

        let window = PageWindow::around(page);
        let filter = window.filter();
        let query = DenseQuery {
            vector: zero,
            top_k: self.top_k,
            namespace: self.namespace,
            filter: Some(&filter),
        };
        tracing::debug!(pages = ?window.pages(), "fetching context window");

        match tokio::time::timeout(self.call_timeout, self.index.query_dense(&query)).await {
            Ok(Ok(matches)) => Ok(matches.into_iter().map(ExpandedChunk::from_match).collect()),
            Ok(Err(e)) => Err(ExpansionFailure {
                page,
                reason: format!("{:#}", e),
            }),
            Err(_) => Err(ExpansionFailure {
                page,
                reason: format!("timed out after {:?}", self.call_timeout),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::InMemoryIndex;
    use crate::models::{HitMetadata, HitSource, IndexMatch};
    use anyhow::Result;
    use async_trait::async_trait;

    fn hit(text: &str, page: Option<i64>) -> RetrievedHit {
        RetrievedHit {
            text: text.to_string(),
            score: 1.0,
            link: Some(format!("https://example.org/?page={}", page.unwrap_or(0))),
            page,
            title: None,
            source: HitSource::Dense,
        }
    }

    fn seeded_index() -> InMemoryIndex {
        let idx = InMemoryIndex::new();
        for p in 1..=12 {
            idx.upsert(
                "ns",
                &format!("p{}", p),
                Some(vec![1.0, 0.0]),
                None,
                HitMetadata {
                    text: Some(format!("page {} text", p)),
                    link: Some(format!("https://example.org/?page={}", p)),
                    page: Some(p),
                    title: None,
                },
            )
            .unwrap();
        }
        idx
    }

    struct FailingOnPage(i64, InMemoryIndex);

    #[async_trait]
    impl DenseIndex for FailingOnPage {
        async fn query_dense(&self, query: &DenseQuery<'_>) -> Result<Vec<IndexMatch>> {
            if let Some(MetadataFilter::In { values, .. }) = query.filter {
                if values[1] == self.0.to_string() {
                    anyhow::bail!("shard unavailable");
                }
            }
            self.1.query_dense(query).await
        }
    }

    /// Delays window lookups centred on the listed pages.
    struct DelayedIndex {
        delays: Vec<(i64, Duration)>,
        inner: InMemoryIndex,
    }

    #[async_trait]
    impl DenseIndex for DelayedIndex {
        async fn query_dense(&self, query: &DenseQuery<'_>) -> Result<Vec<IndexMatch>> {
            if let Some(MetadataFilter::In { values, .. }) = query.filter {
                let delay = self
                    .delays
                    .iter()
                    .find(|(page, _)| values[1] == page.to_string())
                    .map(|(_, d)| *d);
                if let Some(d) = delay {
                    tokio::time::sleep(d).await;
                }
            }
            self.inner.query_dense(query).await
        }
    }

    fn expander(index: &dyn DenseIndex) -> ContextExpander<'_> {
        ContextExpander {
            index,
            namespace: "ns",
            dims: 2,
            top_k: 3,
            call_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_window_middle_page() {
        assert_eq!(PageWindow::around(10).pages(), [9, 10, 11]);
        assert_eq!(PageWindow::around(10).labels(), vec!["9", "10", "11"]);
    }

    #[test]
    fn test_window_first_page_not_clamped() {
        assert_eq!(PageWindow::around(1).pages(), [0, 1, 2]);
    }

    #[tokio::test]
    async fn test_expand_flattens_in_candidate_order() {
        let idx = seeded_index();
        let a = hit("a", Some(10));
        let b = hit("b", Some(1));
        let out = expander(&idx).expand(&[&a, &b]).await;
        let pages: Vec<_> = out.chunks.iter().map(|c| c.page.unwrap()).collect();
        assert_eq!(pages, vec![9, 10, 11, 1, 2]);
        assert!(out.failures.is_empty());
    }

    #[tokio::test]
    async fn test_slow_first_window_keeps_candidate_order() {
        let idx = DelayedIndex {
            delays: vec![(10, Duration::from_millis(50))],
            inner: seeded_index(),
        };
        let a = hit("a", Some(10));
        let b = hit("b", Some(3));
        let c = hit("c", Some(7));
        let out = expander(&idx).expand(&[&a, &b, &c]).await;
        let pages: Vec<_> = out.chunks.iter().map(|c| c.page.unwrap()).collect();
        assert_eq!(pages, vec![9, 10, 11, 2, 3, 4, 6, 7, 8]);
        assert!(out.failures.is_empty());
    }

    #[tokio::test]
    async fn test_timed_out_window_falls_back_to_hit() {
        let idx = DelayedIndex {
            delays: vec![(6, Duration::from_millis(500))],
            inner: seeded_index(),
        };
        let exp = ContextExpander {
            call_timeout: Duration::from_millis(20),
            ..expander(&idx)
        };
        let a = hit("a", Some(3));
        let b = hit("b-own-text", Some(6));
        let c = hit("c", Some(10));
        let out = exp.expand(&[&a, &b, &c]).await;

        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].page, 6);
        assert!(out.failures[0].reason.contains("timed out"), "{}", out.failures[0].reason);

        let contents: Vec<_> = out.chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "page 2 text",
                "page 3 text",
                "page 4 text",
                "b-own-text",
                "page 9 text",
                "page 10 text",
                "page 11 text",
            ]
        );
    }

    #[tokio::test]
    async fn test_overlapping_windows_not_deduplicated() {
        let idx = seeded_index();
        let a = hit("a", Some(5));
        let b = hit("b", Some(6));
        let out = expander(&idx).expand(&[&a, &b]).await;
        assert_eq!(out.chunks.len(), 6);
    }

    #[tokio::test]
    async fn test_failed_window_falls_back_to_hit() {
        let idx = FailingOnPage(6, seeded_index());
        let a = hit("a", Some(3));
        let b = hit("b-own-text", Some(6));
        let c = hit("c", Some(9));
        let out = expander(&idx).expand(&[&a, &b, &c]).await;
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].page, 6);
        let contents: Vec<_> = out.chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents[3], "b-own-text");
        assert_eq!(out.chunks.len(), 7);
    }

    #[tokio::test]
    async fn test_pageless_candidate_keeps_own_chunk() {
        let idx = seeded_index();
        let a = hit("no page", None);
        let out = expander(&idx).expand(&[&a]).await;
        assert_eq!(out.chunks.len(), 1);
        assert_eq!(out.chunks[0].content, "no page");
    }
}
