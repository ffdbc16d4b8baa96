//! Agent tool surface.
//!
//! An answer-generating agent discovers tools through a [`ToolRegistry`]
//! and invokes them with JSON parameters. The built-in
//! [`SearchCommentaryTool`] exposes the retrieval pipeline and
//! [`FindVerseTool`] looks up a single verse; custom tools implement
//! [`Tool`] and are registered alongside them.
//!
//! ```text
//! ┌────────────────────────────────────┐
//! │            ToolRegistry            │
//! │  ┌──────────────────┐ ┌──────────┐ │
//! │  │search_commentary │ │find_verse│ │
//! │  └────────┬─────────┘ └────┬─────┘ │
//! └───────────┼────────────────┼───────┘
//!             ▼                ▼
//!   ToolContext ─▶ HybridRetriever (one per namespace)
//!                          VerseClient
//! ```
//!
//! # Usage
//!
//! ```rust
//! use commentary_search::traits::ToolRegistry;
//!
//! let tools = ToolRegistry::with_builtins();
//! assert!(tools.find("search_commentary").is_some());
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use commentary_search_core::pipeline::{Capabilities, HybridRetriever};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;
use crate::search::{build_capabilities, search_commentary, CommentaryResponse};
use crate::verse::{render_verses, VerseClient, VerseRef};

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// A tool that agents can discover and call.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use serde_json::{json, Value};
/// use commentary_search::traits::{Tool, ToolContext};
///
/// pub struct NamespacesTool;
///
/// #[async_trait]
/// impl Tool for NamespacesTool {
///     fn name(&self) -> &str { "list_namespaces" }
///     fn description(&self) -> &str { "List searchable corpora" }
///
///     fn parameters_schema(&self) -> Value {
///         json!({ "type": "object", "properties": {} })
///     }
///
///     async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
///         Ok(json!({ "namespaces": ctx.namespaces() }))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Lowercase identifier with underscores (e.g. `"search_commentary"`).
    fn name(&self) -> &str;

    /// One-line description agents use to decide whether to call the tool.
    fn description(&self) -> &str;

    /// Whether this tool ships with the crate. Defaults to `false`.
    fn is_builtin(&self) -> bool {
        false
    }

    /// OpenAI function-calling JSON Schema for the parameters object.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool. `params` is always a JSON object.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// Shared state handed to every tool invocation.
///
/// Holds one [`HybridRetriever`] per configured namespace, all backed by
/// the same capability handles.
pub struct ToolContext {
    config: Arc<Config>,
    retrievers: HashMap<String, HybridRetriever>,
}

impl ToolContext {
    /// Connect to the services named in `config`.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let caps = build_capabilities(&config)?;
        Ok(Self::with_capabilities(config, caps))
    }

    /// Build a context over already-constructed capability handles.
    pub fn with_capabilities(config: Arc<Config>, caps: Capabilities) -> Self {
        let retrievers = config
            .retrieval
            .namespaces
            .iter()
            .map(|ns| {
                (
                    ns.clone(),
                    HybridRetriever::new(caps.clone(), ns.clone(), config.retrieval.params()),
                )
            })
            .collect();
        Self { config, retrievers }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Configured namespaces, in config order.
    pub fn namespaces(&self) -> Vec<String> {
        self.config.retrieval.namespaces.clone()
    }

    /// The retriever for `namespace`, or for the default namespace.
    pub fn retriever(&self, namespace: Option<&str>) -> Result<&HybridRetriever> {
        let namespace = namespace.unwrap_or(self.config.retrieval.default_namespace.as_str());
        match self.retrievers.get(namespace) {
            Some(r) => Ok(r),
            None => bail!(
                "Unknown namespace: '{}'. Configured namespaces: {}",
                namespace,
                self.config.retrieval.namespaces.join(", ")
            ),
        }
    }

    /// Search one namespace and render citations.
    pub async fn search(&self, query: &str, namespace: Option<&str>) -> Result<CommentaryResponse> {
        let retriever = self.retriever(namespace)?;
        search_commentary(retriever, &self.config.citation.format(), query).await
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tool Implementations
// ═══════════════════════════════════════════════════════════════════════

/// Built-in commentary search tool. Delegates to [`ToolContext::search`].
pub struct SearchCommentaryTool;

#[async_trait]
impl Tool for SearchCommentaryTool {
    fn name(&self) -> &str {
        "search_commentary"
    }

    fn description(&self) -> &str {
        "Search the commentary for passages relevant to a question and return cited excerpts"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "The question to find commentary for" },
                "namespace": { "type": "string", "description": "Corpus to search; defaults to the configured default" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = params["query"].as_str().unwrap_or("");
        if query.trim().is_empty() {
            bail!("query must not be empty");
        }
        let namespace = params["namespace"].as_str();

        let response = ctx.search(query, namespace).await?;
        Ok(serde_json::json!({
            "namespace": response.namespace,
            "citations": response.citations,
            "text": response.text,
        }))
    }
}

/// Built-in verse lookup tool.
///
/// Invalid references fail before any request is sent. A reference the
/// service does not know returns a notice rather than an error.
pub struct FindVerseTool;

#[async_trait]
impl Tool for FindVerseTool {
    fn name(&self) -> &str {
        "find_verse"
    }

    fn description(&self) -> &str {
        "Find a specific verse from the Holy Quran by chapter and verse number"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "chapter": { "type": "string", "description": "The chapter number (1-114)" },
                "verse": { "type": "string", "description": "The verse number within the chapter" }
            },
            "required": ["chapter", "verse"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let reference = VerseRef::from_params(&params["chapter"], &params["verse"])?;
        let client = VerseClient::new(&ctx.config().verse)?;
        let verses = client.fetch(&reference).await?;

        let text = if verses.is_empty() {
            format!(
                "Verse {} not found. Please check the chapter and verse numbers.",
                reference
            )
        } else {
            render_verses(&verses)
        };
        let links: Vec<String> = verses.iter().map(|v| v.link()).collect();
        Ok(serde_json::json!({
            "chapter": reference.chapter,
            "verse": reference.verse,
            "links": links,
            "text": text,
        }))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Registry for built-in and custom tools.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a registry pre-loaded with `search_commentary` and `find_verse`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SearchCommentaryTool));
        registry.register(Box::new(FindVerseTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    /// Find a tool by name.
    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Tool catalog as returned to agents.
    pub fn list(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name(),
                    "description": t.description(),
                    "builtin": t.is_builtin(),
                    "parameters": t.parameters_schema(),
                })
            })
            .collect();
        serde_json::json!({ "tools": tools })
    }

    /// Invoke a tool by name.
    pub async fn call(&self, name: &str, params: Value, ctx: &ToolContext) -> Result<Value> {
        let Some(tool) = self.find(name) else {
            bail!("Unknown tool: {}", name);
        };
        if !params.is_object() {
            bail!("Tool parameters must be a JSON object");
        }
        tool.execute(params, ctx).await
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
