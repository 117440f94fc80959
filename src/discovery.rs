//! Child stream discovery.
//!
//! For one parent stream:
//!
//! 1. **Fetch** the parent and read its `Content-Type`
//! 2. **Parse** the body with the matching [`CandidateParser`](crate::parser::CandidateParser)
//! 3. **Classify** each candidate (extension first, HEAD probe as fallback)
//! 4. **Filter** to candidates nested under the parent URL or playable,
//!    and keep only supported ones
//!
//! Only the parent fetch can fail discovery. Anything that goes wrong with
//! a single candidate drops that candidate and nothing else.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, NetworkError};
use crate::http_client::Transport;
use crate::mime::MimeType;
use crate::parser::{Candidate, ParserRouter};
use crate::stream::Stream;

/// Discovers the children of a stream.
pub struct DiscoveryEngine {
    transport: Arc<dyn Transport>,
    parsers: ParserRouter,
    probe_concurrency: usize,
}

impl DiscoveryEngine {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, &DiscoveryConfig::default())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: &DiscoveryConfig) -> Self {
        Self {
            transport,
            parsers: ParserRouter::new(),
            probe_concurrency: config.probe_concurrency.max(1),
        }
    }

    /// Discover the children of `parent`, in document order.
    ///
    /// A parent with no or an unsupported `Content-Type` has no children;
    /// that is `Ok(vec![])`, not an error.
    #[instrument(skip(self, parent), fields(url = %parent.url))]
    pub async fn discover(&self, parent: &Stream) -> Result<Vec<Stream>, DiscoveryError> {
        url::Url::parse(&parent.url).map_err(|source| DiscoveryError::Parse {
            url: parent.url.clone(),
            source,
        })?;

        let fetched = self.transport.get(&parent.url).await?;
        if !fetched.status.is_success() {
            warn!(status = %fetched.status, "Parent responded with error status");
        }

        let mime = match fetched.mime_type() {
            Some(Ok(mime)) => mime,
            Some(Err(e)) => {
                warn!(error = %e, "Unclassifiable parent Content-Type");
                return Ok(Vec::new());
            }
            None => {
                info!("No Content-Type; nothing to discover");
                return Ok(Vec::new());
            }
        };
        debug!(content_type = %mime, final_url = %fetched.final_url, "Parent fetched");

        // A live stream never ends, so the body is only read once a parser wants it
        let Some(parser) = self.parsers.parser_for(&mime) else {
            info!(content_type = %mime, "No parser for content type");
            return Ok(Vec::new());
        };
        let base_url = fetched.final_url.clone();
        let body = fetched.text().await?;
        let candidates = parser.parse(&body, &base_url);

        // `buffered` keeps input order while probes run concurrently
        let streams: Vec<Stream> = stream::iter(candidates)
            .map(|candidate| self.materialize(parent, candidate))
            .buffered(self.probe_concurrency)
            .filter_map(|stream| async move { stream })
            .collect()
            .await;

        info!(count = streams.len(), "Discovered streams");
        Ok(streams)
    }

    /// Classify a URL: extension guess first, then a HEAD request.
    ///
    /// `Ok(None)` means the URL could not be classified (unknown extension
    /// and no usable `Content-Type` on a successful HEAD).
    #[instrument(skip(self))]
    pub async fn classify(&self, url: &str) -> Result<Option<MimeType>, NetworkError> {
        if let Some(mime) = MimeType::guess_from_url(url) {
            return Ok(Some(mime));
        }

        let head = self.transport.head(url).await?;
        if !head.status.is_success() {
            debug!(status = %head.status, "HEAD not successful");
            return Ok(None);
        }

        match head.mime_type() {
            Some(Ok(mime)) => Ok(Some(mime)),
            Some(Err(e)) => {
                debug!(error = %e, "Invalid Content-Type on HEAD");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Turn a candidate into a child stream, or drop it.
    async fn materialize(&self, parent: &Stream, candidate: Candidate) -> Option<Stream> {
        let nested = is_nested(&parent.url, &candidate.url);

        // Only probe what can still end up in the result
        let mime = match MimeType::guess_from_url(&candidate.url) {
            Some(mime) => Some(mime),
            None if nested || candidate.mime_hint.is_some() => self.probe(&candidate).await,
            None => None,
        };

        let Some(mime) = mime else {
            debug!(url = %candidate.url, "Ignoring URL: unclassified");
            return None;
        };

        if !nested && !mime.is_playable() {
            debug!(url = %candidate.url, %mime, "Ignoring URL: out of scope");
            return None;
        }

        let stream = Stream::child_of(parent, candidate.url, candidate.title, mime);
        if !stream.is_supported() {
            warn!(url = %stream.url, mime = %stream.mime_type, "Ignoring unsupported stream");
            return None;
        }

        debug!(url = %stream.url, mime = %stream.mime_type, "Adding stream");
        Some(stream)
    }

    /// HEAD-probe a candidate, falling back to its hint.
    async fn probe(&self, candidate: &Candidate) -> Option<MimeType> {
        match self.classify(&candidate.url).await {
            Ok(Some(mime)) => Some(mime),
            Ok(None) => candidate.mime_hint.clone(),
            Err(e) => {
                debug!(error = %e, "Probe failed");
                candidate.mime_hint.clone()
            }
        }
    }
}

/// Candidate URL is a strictly longer string extension of the parent URL.
///
/// Plain string prefix, no normalization: `http://x/a` nests
/// `http://x/ab` as well as `http://x/a/b`.
pub fn is_nested(parent_url: &str, url: &str) -> bool {
    url.len() > parent_url.len() && url.starts_with(parent_url)
}
