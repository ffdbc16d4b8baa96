//! Citation formatting for the answer generator.
//!
//! Each expanded chunk becomes one record:
//!
//! ```text
//! Content:<text>
//!
//! Link:<link>
//! ```
//!
//! Links address pages with a `page=` query parameter; citations address
//! them with `code=`. The parameter name is rewritten, the value is kept.

use serde::{Deserialize, Serialize};

use crate::models::ExpandedChunk;

/// Separator used when citations are joined into a single tool response.
pub const CITATION_SEPARATOR: &str = "\n\n---\n\n";

/// Query-parameter rewrite applied to citation links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationFormat {
    /// Parameter naming the page in stored links.
    pub page_param: String,
    /// Parameter naming the citation code in emitted links.
    pub code_param: String,
}

impl Default for CitationFormat {
    fn default() -> Self {
        Self {
            page_param: "page".to_string(),
            code_param: "code".to_string(),
        }
    }
}

impl CitationFormat {
    /// Rewrite every `page=` query parameter in `link` to `code=`.
    ///
    /// Only whole parameter names following `?` or `&` are touched, so a
    /// parameter such as `homepage=` is left alone. Path segments and
    /// fragments are never rewritten, even when they contain `page=`.
    pub fn citation_link(&self, link: &str) -> String {
        let Some((base, query)) = link.split_once('?') else {
            return link.to_string();
        };
        let page_key = format!("{}=", self.page_param);
        let rewritten: Vec<String> = query
            .split('&')
            .map(|pair| match pair.strip_prefix(page_key.as_str()) {
                Some(value) => format!("{}={}", self.code_param, value),
                None => pair.to_string(),
            })
            .collect();
        format!("{}?{}", base, rewritten.join("&"))
    }

    /// Format one chunk. A missing link is emitted as an empty field.
    pub fn format_chunk(&self, chunk: &ExpandedChunk) -> String {
        let link = chunk
            .link
            .as_deref()
            .filter(|l| !l.is_empty())
            .map(|l| self.citation_link(l))
            .unwrap_or_default();
        format!("Content:{}\n\nLink:{}", chunk.content, link)
    }

    /// Format every chunk, preserving order.
    pub fn format_all(&self, chunks: &[ExpandedChunk]) -> Vec<String> {
        chunks.iter().map(|c| self.format_chunk(c)).collect()
    }
}
