//! Error taxonomy
//!
//! Network failures on a parent's own content are fatal to that parent's
//! discovery. Classification failures on a single candidate only drop that
//! candidate. Store failures abort a reconciliation without rollback.

use thiserror::Error;

/// Transport-level failure (connection refused, TLS, timeout, redirect loop).
#[derive(Error, Debug)]
#[error("network error fetching {url}: {source}")]
pub struct NetworkError {
    pub url: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl NetworkError {
    pub fn new(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            url: url.into(),
            source: source.into(),
        }
    }
}

/// A content-type string that is not of the form `type/subtype`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid media type: {0:?}")]
pub struct ClassificationError(pub String);

/// Discovery failures for one parent.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] NetworkError),

    #[error("invalid parent URL {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Persistence-layer failure.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("stream {0} not found")]
    NotFound(i64),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Reconciliation failures.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("parent stream {0} has not been persisted")]
    UnsavedParent(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure refreshing one parent during a crawl.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}
