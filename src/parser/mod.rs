//! Content-type-aware candidate extraction.
//!
//! Routes a fetched parent body to the parser for its `Content-Type`. Each
//! parser implements [`CandidateParser`] and turns raw text into
//! `(url, title)` candidates in document order.
//!
//! # Supported Content Types
//!
//! | Type | Parser |
//! |------|--------|
//! | `text/html`, `application/xhtml+xml` | [`HtmlLinkParser`] |
//! | `audio/x-scpls`, `application/pls+xml` | [`PlsParser`] |
//! | `audio/x-mpegurl`, `application/vnd.apple.mpegurl`, ... | [`M3uParser`] |
//!
//! # Example
//!
//! ```rust
//! use streamtree::mime::MimeType;
//! use streamtree::parser::ParserRouter;
//!
//! let router = ParserRouter::new();
//! let body = "[playlist]\nFile1=http://radio.example.org/live\nNumberOfEntries=1\n";
//! let mime = MimeType::from_header("audio/x-scpls").unwrap();
//! let candidates: Vec<_> = router
//!     .parse(&mime, body, "http://example.org/listen.pls")
//!     .unwrap()
//!     .collect();
//! assert_eq!(candidates[0].url, "http://radio.example.org/live");
//! ```

pub mod html;
pub mod m3u;
pub mod pls;

pub use html::HtmlLinkParser;
pub use m3u::M3uParser;
pub use pls::PlsParser;

use crate::mime::MimeType;

/// A child stream candidate before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Absolute, fragment-free.
    pub url: String,
    /// Link text or playlist title; may be empty.
    pub title: String,
    /// Type to assume when neither the extension nor a HEAD probe can tell.
    pub mime_hint: Option<MimeType>,
}

impl Candidate {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            mime_hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: MimeType) -> Self {
        self.mime_hint = Some(hint);
        self
    }
}

/// Lazy, single-pass sequence of candidates in document order.
pub type Candidates = Box<dyn Iterator<Item = Candidate> + Send>;

/// Extracts candidates from one source format.
///
/// Implementations are stateless and synchronous.
pub trait CandidateParser: Send + Sync {
    /// Short lowercase name for logs (e.g., `"html"`).
    fn name(&self) -> &'static str;

    /// MIME types this parser supports (e.g., `["text/html"]`).
    fn supported_types(&self) -> &[&str];

    /// Extract candidates from `body`.
    ///
    /// `base_url` is the parent's effective URL after redirects; relative
    /// links resolve against it.
    fn parse(&self, body: &str, base_url: &str) -> Candidates;
}

/// Picks the [`CandidateParser`] for a parent's content type.
pub struct ParserRouter {
    parsers: Vec<Box<dyn CandidateParser>>,
}

impl ParserRouter {
    /// Create a router with all built-in parsers.
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(HtmlLinkParser),
                Box::new(PlsParser),
                Box::new(M3uParser),
            ],
        }
    }

    /// Find the parser for `mime`, if any.
    pub fn parser_for(&self, mime: &MimeType) -> Option<&dyn CandidateParser> {
        self.parsers
            .iter()
            .find(|p| mime.is_one_of(p.supported_types()))
            .map(|p| &**p)
    }

    /// Parse `body` with the matching parser. `None` for unsupported types.
    pub fn parse(&self, mime: &MimeType, body: &str, base_url: &str) -> Option<Candidates> {
        self.parser_for(mime).map(|p| p.parse(body, base_url))
    }
}

impl Default for ParserRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve `href` against `base` and drop any fragment.
///
/// Returns `None` for unparseable links and for non-http(s) schemes
/// (`mailto:`, `javascript:`, `data:`).
pub(crate) fn resolve(base: Option<&url::Url>, href: &str) -> Option<String> {
    let href = href.trim();
    let mut resolved = match base {
        Some(base) => base.join(href).ok()?,
        None => url::Url::parse(href).ok()?,
    };
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved.to_string())
}
