//! # Commentary Search
//!
//! Hybrid retrieval over scripture commentary for answer-generating agents.
//!
//! A question is embedded densely and sparsely, both indexes are queried
//! concurrently, the candidates are merged and reranked by a cross-encoder,
//! and each survivor is expanded to its neighbouring pages before being
//! rendered as a citation record.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐   ┌──────────────────────┐   ┌──────────────┐
//! │ Remote        │──▶│ commentary-search-   │──▶│ Citations    │
//! │ capabilities  │   │ core pipeline        │   │ Content/Link │
//! │ embed/index/  │   │ merge+rerank+window  │   └──────┬───────┘
//! │ rerank        │   └──────────────────────┘          │
//! └───────────────┘                          ┌──────────┴─────┐
//!                                            ▼                ▼
//!                                       ┌─────────┐     ┌──────────┐
//!                                       │   CLI   │     │  Agent   │
//!                                       │(csearch)│     │  tools   │
//!                                       └─────────┘     └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`embedding`] | Dense embedding providers (OpenAI, Ollama, Gemini) |
//! | [`sparse_encoder`] | HTTP sparse token-weight client with tokenizer vocabulary |
//! | [`pinecone`] | Dense and sparse index client |
//! | [`rerank`] | Cross-encoder reranking providers |
//! | [`search`] | Capability wiring and citation rendering |
//! | [`traits`] | Agent tool trait, context and registry |
//! | [`verse`] | Verse lookup behind the `find_verse` tool |
//! | [`http`] | Shared retrying JSON client |

pub mod config;
pub mod embedding;
pub mod http;
pub mod pinecone;
pub mod rerank;
pub mod search;
pub mod sparse_encoder;
pub mod traits;
pub mod verse;
