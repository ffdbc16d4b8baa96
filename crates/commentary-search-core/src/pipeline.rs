//! The hybrid retrieval pipeline.
//!
//! ```text
//! query ─┬─ dense embed ─ dense index ───┐   (concurrent, all-or-nothing)
//!        └─ sparse encode ─ sparse index ┘
//!                 │
//!              merge ─▶ rerank ─▶ window expansion ─▶ citations
//!                                (concurrent, best-effort)
//! ```
//!
//! All external handles are injected through [`Capabilities`]. Nothing is
//! spawned onto a runtime: every call is a child future of
//! [`HybridRetriever::search`], so dropping that future cancels whatever
//! is still outstanding. The dense and sparse lookups are joined with
//! `try_join`, which drops the sibling as soon as one side fails.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join;
use serde::Serialize;

use crate::embedding::{DenseEmbedder, SparseEncoder};
use crate::error::{SearchError, Service};
use crate::format::CitationFormat;
use crate::index::{DenseIndex, DenseQuery, SparseIndex};
use crate::merge::merge_hits;
use crate::models::{ExpandedChunk, HitSource, Query, RerankedResult, RetrievedHit};
use crate::rerank::{resolve_reranked, Reranker};
use crate::sparse::sparse_vector_for;
use crate::window::{ContextExpander, ExpansionFailure};

/// Retrieval tuning parameters, decoupled from application config.
#[derive(Debug, Clone)]
pub struct RetrievalParams {
    /// Matches requested from the dense index.
    pub dense_top_k: usize,
    /// Matches requested from the sparse index.
    pub sparse_top_k: usize,
    /// Candidates kept by the reranker.
    pub rerank_top_n: usize,
    /// Matches requested per page window.
    pub window_top_k: usize,
    /// Upper bound on any single external call.
    pub call_timeout: Duration,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            dense_top_k: 40,
            sparse_top_k: 40,
            rerank_top_n: 5,
            window_top_k: 3,
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// Long-lived handles to the external services.
///
/// Cloning is cheap; one set of capabilities can back retrievers for
/// several namespaces.
#[derive(Clone)]
pub struct Capabilities {
    pub dense_embedder: Arc<dyn DenseEmbedder>,
    pub sparse_encoder: Arc<dyn SparseEncoder>,
    pub dense_index: Arc<dyn DenseIndex>,
    pub sparse_index: Arc<dyn SparseIndex>,
    pub reranker: Arc<dyn Reranker>,
}

/// Result of one successful search.
///
/// An empty `chunks` list means no relevant content was found; service
/// failures are reported as [`SearchError`] instead.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchOutcome {
    /// Number of candidates after merge and dedup.
    pub merged_candidates: usize,
    /// Reranker verdicts, in reranker order.
    pub reranked: Vec<RerankedResult>,
    /// Citation-ready chunks, in candidate order.
    pub chunks: Vec<ExpandedChunk>,
    /// Candidates whose context window could not be fetched.
    pub expansion_failures: Vec<ExpansionFailure>,
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Format every chunk as a citation record.
    pub fn citations(&self, format: &CitationFormat) -> Vec<String> {
        format.format_all(&self.chunks)
    }
}

/// Hybrid dense + sparse retriever bound to one namespace.
pub struct HybridRetriever {
    caps: Capabilities,
    namespace: String,
    params: RetrievalParams,
}

impl HybridRetriever {
    pub fn new(caps: Capabilities, namespace: impl Into<String>, params: RetrievalParams) -> Self {
        Self {
            caps,
            namespace: namespace.into(),
            params,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn params(&self) -> &RetrievalParams {
        &self.params
    }

    /// Run the full pipeline for one query.
    ///
    /// Dense or sparse failure aborts the request before any merge,
    /// rerank or expansion work. Expansion failures are recorded on the
    /// outcome and do not fail the request.
    pub async fn search(&self, query: &Query) -> Result<SearchOutcome, SearchError> {
        let (dense, sparse) = try_join(self.dense_search(query), self.sparse_search(query)).await?;
        tracing::debug!(
            dense = dense.len(),
            sparse = sparse.len(),
            namespace = %self.namespace,
            "retrieval complete"
        );

        let merged = merge_hits(dense, sparse);
        if merged.is_empty() {
            tracing::debug!("no candidates after merge");
            return Ok(SearchOutcome::default());
        }

        let reranked = self.rerank(query, &merged).await?;
        let top = resolve_reranked(&merged, &reranked)?;

        let expander = ContextExpander {
            index: self.caps.dense_index.as_ref(),
            namespace: &self.namespace,
            dims: self.caps.dense_embedder.dims(),
            top_k: self.params.window_top_k,
            call_timeout: self.params.call_timeout,
        };
        let expansion = expander.expand(&top).await;

        Ok(SearchOutcome {
            merged_candidates: merged.len(),
            reranked,
            chunks: expansion.chunks,
            expansion_failures: expansion.failures,
        })
    }

    /// Dense retrieval: embed the query and look up nearest neighbours.
    pub async fn dense_search(&self, query: &Query) -> Result<Vec<RetrievedHit>, SearchError> {
        let vector = self
            .bounded(
                Service::DenseEmbedder,
                self.caps.dense_embedder.embed_dense(query.as_str()),
            )
            .await?;

        let request = DenseQuery {
            vector: &vector,
            top_k: self.params.dense_top_k,
            namespace: &self.namespace,
            filter: None,
        };
        let matches = self
            .bounded(Service::DenseIndex, self.caps.dense_index.query_dense(&request))
            .await?;

        Ok(matches
            .into_iter()
            .map(|m| RetrievedHit::from_match(m, HitSource::Dense))
            .collect())
    }

    /// Sparse retrieval: encode, build the sparse vector, look up matches.
    ///
    /// A query with no resolvable tokens yields an empty list without
    /// contacting the sparse index.
    pub async fn sparse_search(&self, query: &Query) -> Result<Vec<RetrievedHit>, SearchError> {
        let weights = self
            .bounded(
                Service::SparseEncoder,
                self.caps.sparse_encoder.embed_sparse(query.as_str()),
            )
            .await?;

        let vector = sparse_vector_for(self.caps.sparse_encoder.as_ref(), weights);
        if vector.is_empty() {
            tracing::debug!("sparse vector is empty; skipping lexical lookup");
            return Ok(Vec::new());
        }

        let matches = self
            .bounded(
                Service::SparseIndex,
                self.caps.sparse_index.query_sparse(
                    &vector,
                    self.params.sparse_top_k,
                    &self.namespace,
                ),
            )
            .await?;

        Ok(matches
            .into_iter()
            .map(|m| RetrievedHit::from_match(m, HitSource::Sparse))
            .collect())
    }

    async fn rerank(
        &self,
        query: &Query,
        candidates: &[RetrievedHit],
    ) -> Result<Vec<RerankedResult>, SearchError> {
        let documents: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
        let top_n = self.params.rerank_top_n.min(documents.len());
        self.bounded(
            Service::Reranker,
            self.caps.reranker.rerank(query.as_str(), &documents, top_n),
        )
        .await
    }

    async fn bounded<T, F>(&self, service: Service, call: F) -> Result<T, SearchError>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.params.call_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::warn!(%service, error = %format!("{:#}", e), "external call failed");
                Err(SearchError::unavailable(service, &e))
            }
            Err(_) => {
                tracing::warn!(%service, timeout = ?self.params.call_timeout, "external call timed out");
                Err(SearchError::RetrievalUnavailable {
                    service,
                    reason: format!("timed out after {:?}", self.params.call_timeout),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::InMemoryIndex;
    use crate::index::MetadataFilter;
    use crate::models::{HitMetadata, IndexMatch, SparseVector};
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedEmbedder {
        dims: usize,
        fail: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl DenseEmbedder for FixedEmbedder {
        fn model_name(&self) -> &str {
            "fixed"
        }
        fn dims(&self) -> usize {
            self.dims
        }
        async fn embed_dense(&self, _text: &str) -> Result<Vec<f32>> {
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            if self.fail {
                bail!("embedding backend offline");
            }
            Ok(vec![1.0; self.dims])
        }
    }

    struct WordEncoder;

    #[async_trait]
    impl SparseEncoder for WordEncoder {
        async fn embed_sparse(&self, text: &str) -> Result<Vec<(String, f32)>> {
            Ok(text.split_whitespace().map(|w| (w.to_string(), 1.0)).collect())
        }
        fn token_id(&self, token: &str) -> Option<u32> {
            match token {
                "fasting" => Some(7),
                "prayer" => Some(8),
                _ => None,
            }
        }
    }

    struct OfflineEncoder;

    #[async_trait]
    impl SparseEncoder for OfflineEncoder {
        async fn embed_sparse(&self, _text: &str) -> Result<Vec<(String, f32)>> {
            bail!("token weight service refused connection");
        }
        fn token_id(&self, _token: &str) -> Option<u32> {
            None
        }
    }

    /// Scripted dense/sparse index that records every call.
    #[derive(Default)]
    struct ScriptedIndex {
        dense: Vec<IndexMatch>,
        sparse: Vec<IndexMatch>,
        windows: Vec<IndexMatch>,
        dense_down: bool,
        sparse_down: bool,
        dense_calls: AtomicUsize,
        sparse_calls: AtomicUsize,
        window_filters: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl DenseIndex for ScriptedIndex {
        async fn query_dense(&self, query: &DenseQuery<'_>) -> Result<Vec<IndexMatch>> {
            match query.filter {
                Some(MetadataFilter::In { values, .. }) => {
                    self.window_filters.lock().unwrap().push(values.clone());
                    assert!(query.vector.iter().all(|v| *v == 0.0));
                    Ok(self
                        .windows
                        .iter()
                        .filter(|m| {
                            m.metadata
                                .page
                                .map(|p| values.contains(&p.to_string()))
                                .unwrap_or(false)
                        })
                        .take(query.top_k)
                        .cloned()
                        .collect())
                }
                None => {
                    self.dense_calls.fetch_add(1, Ordering::SeqCst);
                    if self.dense_down {
                        bail!("503 Service Unavailable");
                    }
                    Ok(self.dense.clone())
                }
            }
        }
    }

    #[async_trait]
    impl SparseIndex for ScriptedIndex {
        async fn query_sparse(
            &self,
            _vector: &SparseVector,
            _top_k: usize,
            _namespace: &str,
        ) -> Result<Vec<IndexMatch>> {
            self.sparse_calls.fetch_add(1, Ordering::SeqCst);
            if self.sparse_down {
                bail!("502 Bad Gateway");
            }
            Ok(self.sparse.clone())
        }
    }

    struct RecordingReranker {
        results: Vec<RerankedResult>,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl RecordingReranker {
        fn new(results: Vec<RerankedResult>) -> Self {
            Self {
                results,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Reranker for RecordingReranker {
        fn model_name(&self) -> &str {
            "scripted"
        }
        async fn rerank(
            &self,
            _query: &str,
            documents: &[String],
            top_n: usize,
        ) -> Result<Vec<RerankedResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen.lock().unwrap() = documents.to_vec();
            Ok(self.results.iter().take(top_n).copied().collect())
        }
    }

    fn m(text: &str, score: f64, page: i64) -> IndexMatch {
        IndexMatch {
            id: None,
            score,
            metadata: HitMetadata {
                text: Some(text.to_string()),
                link: Some(format!("https://www.alislam.org/quran/tafseer/?page={}&region=E1", page)),
                page: Some(page),
                title: Some("Five Volume Commentary".to_string()),
            },
        }
    }

    fn retriever(
        index: Arc<ScriptedIndex>,
        reranker: Arc<RecordingReranker>,
        embedder: FixedEmbedder,
        params: RetrievalParams,
    ) -> HybridRetriever {
        retriever_with_encoder(index, reranker, embedder, Arc::new(WordEncoder), params)
    }

    fn retriever_with_encoder(
        index: Arc<ScriptedIndex>,
        reranker: Arc<RecordingReranker>,
        embedder: FixedEmbedder,
        encoder: Arc<dyn SparseEncoder>,
        params: RetrievalParams,
    ) -> HybridRetriever {
        let caps = Capabilities {
            dense_embedder: Arc::new(embedder),
            sparse_encoder: encoder,
            dense_index: index.clone(),
            sparse_index: index,
            reranker,
        };
        HybridRetriever::new(caps, "quran-english-five-volume-1", params)
    }

    fn embedder() -> FixedEmbedder {
        FixedEmbedder {
            dims: 4,
            fail: false,
            delay: None,
        }
    }

    #[tokio::test]
    async fn test_end_to_end_fasting() {
        let index = Arc::new(ScriptedIndex {
            dense: vec![m("A", 0.8, 5)],
            sparse: vec![m("A", 0.95, 5), m("B", 0.3, 9)],
            windows: vec![m("A", 0.0, 5), m("B", 0.0, 9)],
            ..Default::default()
        });
        let reranker = Arc::new(RecordingReranker::new(vec![RerankedResult {
            index: 0,
            relevance: 1.0,
        }]));
        let params = RetrievalParams {
            rerank_top_n: 1,
            ..Default::default()
        };
        let r = retriever(index.clone(), reranker.clone(), embedder(), params);

        let outcome = r.search(&Query::parse("fasting").unwrap()).await.unwrap();

        assert_eq!(outcome.merged_candidates, 2);
        assert_eq!(*reranker.seen.lock().unwrap(), vec!["A", "B"]);
        assert_eq!(
            *index.window_filters.lock().unwrap(),
            vec![vec!["4".to_string(), "5".to_string(), "6".to_string()]]
        );
        let citations = outcome.citations(&CitationFormat::default());
        assert_eq!(
            citations,
            vec!["Content:A\n\nLink:https://www.alislam.org/quran/tafseer/?code=5&region=E1"]
        );
        assert!(outcome.expansion_failures.is_empty());
    }

    #[tokio::test]
    async fn test_dense_unavailable_aborts_before_merge() {
        let index = Arc::new(ScriptedIndex {
            sparse: vec![m("B", 0.3, 9)],
            dense_down: true,
            ..Default::default()
        });
        let reranker = Arc::new(RecordingReranker::new(Vec::new()));
        let r = retriever(index.clone(), reranker.clone(), embedder(), RetrievalParams::default());

        let err = r.search(&Query::parse("fasting").unwrap()).await.unwrap_err();

        assert!(matches!(
            err,
            SearchError::RetrievalUnavailable {
                service: Service::DenseIndex,
                ..
            }
        ));
        assert_eq!(reranker.calls.load(Ordering::SeqCst), 0);
        assert!(index.window_filters.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sparse_index_unavailable_aborts_before_merge() {
        let index = Arc::new(ScriptedIndex {
            dense: vec![m("A", 0.8, 5)],
            windows: vec![m("A", 0.0, 5)],
            sparse_down: true,
            ..Default::default()
        });
        let reranker = Arc::new(RecordingReranker::new(vec![RerankedResult {
            index: 0,
            relevance: 1.0,
        }]));
        let r = retriever(index.clone(), reranker.clone(), embedder(), RetrievalParams::default());

        let err = r.search(&Query::parse("fasting").unwrap()).await.unwrap_err();

        assert!(matches!(
            err,
            SearchError::RetrievalUnavailable {
                service: Service::SparseIndex,
                ..
            }
        ));
        assert_eq!(index.sparse_calls.load(Ordering::SeqCst), 1);
        assert_eq!(reranker.calls.load(Ordering::SeqCst), 0);
        assert!(index.window_filters.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sparse_encoder_failure_aborts_before_merge() {
        let index = Arc::new(ScriptedIndex {
            dense: vec![m("A", 0.8, 5)],
            windows: vec![m("A", 0.0, 5)],
            ..Default::default()
        });
        let reranker = Arc::new(RecordingReranker::new(vec![RerankedResult {
            index: 0,
            relevance: 1.0,
        }]));
        let r = retriever_with_encoder(
            index.clone(),
            reranker.clone(),
            embedder(),
            Arc::new(OfflineEncoder),
            RetrievalParams::default(),
        );

        let err = r.search(&Query::parse("fasting").unwrap()).await.unwrap_err();

        match err {
            SearchError::RetrievalUnavailable { service, reason } => {
                assert_eq!(service, Service::SparseEncoder);
                assert!(reason.contains("refused connection"), "{}", reason);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(index.sparse_calls.load(Ordering::SeqCst), 0);
        assert_eq!(reranker.calls.load(Ordering::SeqCst), 0);
        assert!(index.window_filters.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sparse_failure_cancels_slow_dense_call() {
        let index = Arc::new(ScriptedIndex {
            dense: vec![m("A", 0.8, 5)],
            sparse_down: true,
            ..Default::default()
        });
        let reranker = Arc::new(RecordingReranker::new(Vec::new()));
        let slow = FixedEmbedder {
            dims: 4,
            fail: false,
            delay: Some(Duration::from_secs(5)),
        };
        let r = retriever(index.clone(), reranker.clone(), slow, RetrievalParams::default());

        let started = std::time::Instant::now();
        let err = r.search(&Query::parse("fasting").unwrap()).await.unwrap_err();

        assert!(
            started.elapsed() < Duration::from_secs(1),
            "search waited {:?} for the dense side",
            started.elapsed()
        );
        assert!(matches!(
            err,
            SearchError::RetrievalUnavailable {
                service: Service::SparseIndex,
                ..
            }
        ));
        // The dense embedder never finished, so the dense index was never queried.
        assert_eq!(index.dense_calls.load(Ordering::SeqCst), 0);
        assert_eq!(reranker.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_embedder_failure_is_unavailable() {
        let index = Arc::new(ScriptedIndex::default());
        let reranker = Arc::new(RecordingReranker::new(Vec::new()));
        let failing = FixedEmbedder {
            dims: 4,
            fail: true,
            delay: None,
        };
        let r = retriever(index.clone(), reranker, failing, RetrievalParams::default());
        let err = r.search(&Query::parse("fasting").unwrap()).await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::RetrievalUnavailable {
                service: Service::DenseEmbedder,
                ..
            }
        ));
        assert_eq!(index.dense_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let index = Arc::new(ScriptedIndex::default());
        let reranker = Arc::new(RecordingReranker::new(Vec::new()));
        let slow = FixedEmbedder {
            dims: 4,
            fail: false,
            delay: Some(Duration::from_millis(500)),
        };
        let params = RetrievalParams {
            call_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let r = retriever(index, reranker, slow, params);
        let err = r.search(&Query::parse("fasting").unwrap()).await.unwrap_err();
        match err {
            SearchError::RetrievalUnavailable { service, reason } => {
                assert_eq!(service, Service::DenseEmbedder);
                assert!(reason.contains("timed out"), "{}", reason);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unresolvable_query_skips_sparse_index() {
        let index = Arc::new(ScriptedIndex {
            dense: vec![m("A", 0.8, 5)],
            ..Default::default()
        });
        let reranker = Arc::new(RecordingReranker::new(vec![RerankedResult {
            index: 0,
            relevance: 0.5,
        }]));
        let r = retriever(index.clone(), reranker, embedder(), RetrievalParams::default());

        let hits = r.sparse_search(&Query::parse("zzz qqq").unwrap()).await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(index.sparse_calls.load(Ordering::SeqCst), 0);

        let outcome = r.search(&Query::parse("zzz qqq").unwrap()).await.unwrap();
        assert_eq!(outcome.merged_candidates, 1);
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty_success() {
        let index = Arc::new(ScriptedIndex::default());
        let reranker = Arc::new(RecordingReranker::new(Vec::new()));
        let r = retriever(index, reranker.clone(), embedder(), RetrievalParams::default());
        let outcome = r.search(&Query::parse("fasting").unwrap()).await.unwrap();
        assert!(outcome.is_empty());
        assert_eq!(reranker.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rerank_out_of_range_is_fatal() {
        let index = Arc::new(ScriptedIndex {
            dense: vec![m("A", 0.8, 5)],
            ..Default::default()
        });
        let reranker = Arc::new(RecordingReranker::new(vec![RerankedResult {
            index: 5,
            relevance: 0.9,
        }]));
        let r = retriever(index.clone(), reranker, embedder(), RetrievalParams::default());
        let err = r.search(&Query::parse("fasting").unwrap()).await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::RerankContractViolation { index: 5, len: 1 }
        ));
        assert!(index.window_filters.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rerank_order_drives_expansion_order() {
        let index = Arc::new(ScriptedIndex {
            dense: vec![m("X", 0.9, 2), m("Y", 0.8, 20), m("Z", 0.1, 40)],
            windows: vec![m("X", 0.0, 2), m("Z", 0.0, 40)],
            ..Default::default()
        });
        let reranker = Arc::new(RecordingReranker::new(vec![
            RerankedResult {
                index: 2,
                relevance: 0.9,
            },
            RerankedResult {
                index: 0,
                relevance: 0.4,
            },
        ]));
        let r = retriever(index, reranker, embedder(), RetrievalParams::default());
        let outcome = r.search(&Query::parse("prayer").unwrap()).await.unwrap();
        let contents: Vec<_> = outcome.chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["Z", "X"]);
    }

    #[tokio::test]
    async fn test_in_memory_index_backs_pipeline() {
        let store = Arc::new(InMemoryIndex::new());
        let ns = "quran-english-five-volume-1";
        for (i, text) in ["prayer at dawn", "fasting in ramadan", "charity"].iter().enumerate() {
            let page = i as i64 + 1;
            store
                .upsert(
                    ns,
                    &format!("c{}", page),
                    Some(vec![1.0, 0.0, 0.0, 0.0]),
                    Some(SparseVector {
                        indices: vec![if text.contains("fasting") { 7 } else { 99 }],
                        values: vec![1.0],
                    }),
                    HitMetadata {
                        text: Some(text.to_string()),
                        link: Some(format!("https://x.org/?page={}", page)),
                        page: Some(page),
                        title: None,
                    },
                )
                .unwrap();
        }
        let reranker = Arc::new(RecordingReranker::new(vec![RerankedResult {
            index: 0,
            relevance: 1.0,
        }]));
        let caps = Capabilities {
            dense_embedder: Arc::new(embedder()),
            sparse_encoder: Arc::new(WordEncoder),
            dense_index: store.clone(),
            sparse_index: store,
            reranker,
        };
        let r = HybridRetriever::new(caps, ns, RetrievalParams::default());
        let outcome = r.search(&Query::parse("fasting").unwrap()).await.unwrap();
        assert_eq!(outcome.merged_candidates, 3);
        assert!(!outcome.chunks.is_empty());
    }
}
