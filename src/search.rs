//! Wiring from configuration to a running retrieval pipeline.
//!
//! [`build_capabilities`] turns the config file into the five injected
//! handles, [`build_retriever`] binds them to a namespace, and
//! [`search_commentary`] runs one query and renders the citations. Both
//! the CLI (`csearch search`) and the `search_commentary` tool go through
//! [`search_commentary`], so they always agree on output.

use anyhow::{bail, Context, Result};
use commentary_search_core::format::{CitationFormat, CITATION_SEPARATOR};
use commentary_search_core::models::Query;
use commentary_search_core::pipeline::{Capabilities, HybridRetriever, SearchOutcome};
use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::pinecone::PineconeIndex;
use crate::rerank::create_reranker;
use crate::sparse_encoder::HttpSparseEncoder;

/// Text returned when a search succeeds but finds nothing.
pub const NO_RESULTS: &str = "No relevant commentary found for this query.";

/// Result of one commentary search, as rendered for agents and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct CommentaryResponse {
    pub namespace: String,
    pub citations: Vec<String>,
    /// Citations joined with the separator, or [`NO_RESULTS`].
    pub text: String,
    pub outcome: SearchOutcome,
}

/// Build the remote capability handles described by `config`.
pub fn build_capabilities(config: &Config) -> Result<Capabilities> {
    Ok(Capabilities {
        dense_embedder: create_embedder(&config.embedding).context("dense embedder")?,
        sparse_encoder: Arc::new(HttpSparseEncoder::new(&config.sparse).context("sparse encoder")?),
        dense_index: Arc::new(PineconeIndex::new(&config.dense_index).context("dense index")?),
        sparse_index: Arc::new(PineconeIndex::new(&config.sparse_index).context("sparse index")?),
        reranker: create_reranker(&config.rerank).context("reranker")?,
    })
}

/// Resolve the requested namespace against the configured list.
pub fn resolve_namespace<'a>(config: &'a Config, requested: Option<&'a str>) -> Result<&'a str> {
    let namespace = requested.unwrap_or(config.retrieval.default_namespace.as_str());
    if !config.retrieval.namespaces.iter().any(|n| n == namespace) {
        bail!(
            "Unknown namespace: '{}'. Configured namespaces: {}",
            namespace,
            config.retrieval.namespaces.join(", ")
        );
    }
    Ok(namespace)
}

/// Bind `caps` to a validated namespace.
pub fn build_retriever(
    config: &Config,
    caps: Capabilities,
    namespace: Option<&str>,
) -> Result<HybridRetriever> {
    let namespace = resolve_namespace(config, namespace)?;
    Ok(HybridRetriever::new(
        caps,
        namespace,
        config.retrieval.params(),
    ))
}

/// Run one query and render the citations.
///
/// An empty success yields [`NO_RESULTS`] as text. Every failure, including
/// an invalid query, is returned as an error.
pub async fn search_commentary(
    retriever: &HybridRetriever,
    format: &CitationFormat,
    query: &str,
) -> Result<CommentaryResponse> {
    let query = Query::parse(query)?;
    let outcome = retriever.search(&query).await?;
    let citations = outcome.citations(format);

    tracing::info!(
        namespace = retriever.namespace(),
        candidates = outcome.merged_candidates,
        citations = citations.len(),
        expansion_failures = outcome.expansion_failures.len(),
        "commentary search finished"
    );

    let text = if citations.is_empty() {
        NO_RESULTS.to_string()
    } else {
        citations.join(CITATION_SEPARATOR)
    };

    Ok(CommentaryResponse {
        namespace: retriever.namespace().to_string(),
        citations,
        text,
        outcome,
    })
}

/// `csearch search`: run a query against the configured services and print
/// the result to stdout.
pub async fn run_search(
    config: &Config,
    query: &str,
    namespace: Option<&str>,
    json: bool,
) -> Result<()> {
    let retriever = build_retriever(config, build_capabilities(config)?, namespace)?;
    let response = search_commentary(&retriever, &config.citation.format(), query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response.text);
    }
    Ok(())
}
