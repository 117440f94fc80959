//! Hyperlink extraction from HTML pages.
//!
//! Every `a[href]` becomes a candidate. Links resolve against the page's
//! effective base (a `<base href>` if present, otherwise the URL the page
//! was finally served from), lose their fragment, and are dropped if
//! nothing but the page itself is left. Fragment-only links (`#top`) never
//! reach resolution, so a foreign `<base>` cannot turn them into targets.

use scraper::{Html, Selector};
use tracing::debug;

use super::{resolve, Candidate, CandidateParser, Candidates};
use crate::mime::HTML_TYPES;

/// Extracts `(href, link text)` pairs from HTML.
pub struct HtmlLinkParser;

impl CandidateParser for HtmlLinkParser {
    fn name(&self) -> &'static str {
        "html"
    }

    fn supported_types(&self) -> &[&str] {
        HTML_TYPES
    }

    fn parse(&self, body: &str, base_url: &str) -> Candidates {
        Box::new(extract_links(body, base_url).into_iter())
    }
}

/// Extract link candidates in document order.
///
/// The DOM is not `Send`, so links are collected before the iterator is
/// handed out.
pub fn extract_links(html: &str, page_url: &str) -> Vec<Candidate> {
    let (Ok(anchor), Ok(base_tag)) = (Selector::parse("a[href]"), Selector::parse("base[href]"))
    else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let page = url::Url::parse(page_url).ok();

    let base = document
        .select(&base_tag)
        .next()
        .and_then(|b| b.value().attr("href"))
        .and_then(|href| resolve(page.as_ref(), href))
        .and_then(|href| url::Url::parse(&href).ok())
        .or_else(|| page.clone());

    let page_url = page.as_ref().map_or(page_url, url::Url::as_str);

    let mut links = Vec::new();
    for element in document.select(&anchor) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        // Same-document anchor, whatever `<base>` says
        if href.trim().starts_with('#') {
            debug!(href, "Ignoring fragment-only link");
            continue;
        }
        let Some(url) = resolve(base.as_ref(), href) else {
            debug!(href, "Ignoring unresolvable link");
            continue;
        };
        if url.is_empty() || url == page_url {
            debug!(href, "Ignoring self link");
            continue;
        }

        let title = collapse_whitespace(&element.text().collect::<String>());
        links.push(Candidate::new(url, title));
    }

    debug!(count = links.len(), "Extracted links");
    links
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
