//! # Commentary Search Core
//!
//! Transport-free logic for the hybrid retrieval pipeline: data models,
//! capability traits for the external services, sparse vector
//! construction, dense/sparse merge, rerank index mapping, page-window
//! context expansion, and citation formatting.
//!
//! This crate performs no network I/O of its own. Concrete embedders,
//! index clients and rerankers are implemented by the application crate
//! and injected into [`pipeline::HybridRetriever`] as trait objects.
//!
//! ```text
//!  query ─┬─▶ dense embed ─▶ dense index ──┐
//!         └─▶ sparse encode ─▶ sparse index ┴─▶ merge ─▶ rerank ─▶ expand ─▶ format
//! ```

pub mod embedding;
pub mod error;
pub mod format;
pub mod index;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod rerank;
pub mod sparse;
pub mod window;
