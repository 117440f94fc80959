//! `streamtree` - Media stream discovery and tree reconciliation
//!
//! # Features
//!
//! - **Classification**: media type from file extension, `Content-Type`, or HEAD probe
//! - **Discovery**: child streams from HTML link listings, PLS and M3U playlists
//! - **Reconciliation**: minimal insert/update/delete plan against a persisted tree
//! - **Crawling**: breadth-first refresh of a whole stream tree
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use streamtree::{DiscoveryEngine, HttpTransport, MemoryStore, Reconciler, Stream, StreamStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = DiscoveryEngine::new(Arc::new(HttpTransport::new()?));
//!     let store = Arc::new(MemoryStore::new());
//!
//!     let root = Stream::new("https://radio.example.org/", "radio", "text/html".parse()?);
//!     let id = store.insert(&root).await?;
//!     let root = store.get(id).await?.expect("just inserted");
//!
//!     let children = engine.discover(&root).await?;
//!     let summary = Reconciler::new(store).reconcile(&root, children).await?;
//!     println!("{summary:?}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod discovery;
pub mod error;
pub mod http_client;
pub mod mime;
pub mod parser;
pub mod reconcile;
pub mod store;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use crawler::{CrawlReport, Crawler};
pub use discovery::DiscoveryEngine;
pub use error::{
    ClassificationError, CrawlError, DiscoveryError, NetworkError, ReconcileError, StoreError,
};
pub use http_client::{FetchedResource, HttpTransport, Transport};
pub use mime::MimeType;
pub use parser::{Candidate, CandidateParser, ParserRouter};
pub use reconcile::{diff, ReconcilePlan, ReconcileSummary, Reconciler};
pub use store::{MemoryStore, StreamStore};
pub use stream::{Stream, StreamId, StreamUpdate};

/// Version of streamtree
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
