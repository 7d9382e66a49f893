use serde::{Deserialize, Serialize};

/// Marker prefix for PDF responses; the body is never parsed, only referenced.
pub const PDF_SENTINEL: &str = "PDF_CONTENT_";

/// Marker prefix for content types the crawler does not render.
pub const UNSUPPORTED_SENTINEL: &str = "UNSUPPORTED_CONTENT_";

/// Returns true when a fetched body is a sentinel marker rather than markup.
pub fn is_sentinel(body: &str) -> bool {
    body.starts_with(PDF_SENTINEL) || body.starts_with(UNSUPPORTED_SENTINEL)
}

/// One crawled page. Produced once by the orchestrator and never mutated,
/// even when the fetch failed (content fields stay `None`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    /// Distance from the seed this page was reached from.
    pub depth: usize,
    pub title: Option<String>,
    pub body_text: Option<String>,
    /// Raw markup, or a sentinel marker for PDF/unsupported content.
    pub content: Option<String>,
    pub outbound_links: Vec<String>,
    pub status_code: u16,
}

impl PageRecord {
    pub fn new(url: String) -> Self {
        Self {
            url,
            depth: 0,
            title: None,
            body_text: None,
            content: None,
            outbound_links: Vec::new(),
            status_code: 0,
        }
    }
}
