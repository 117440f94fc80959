//! Breadth-first refresh of a persisted stream tree.
//!
//! Each level's parents are discovered and reconciled concurrently. A
//! parent whose discovery fails keeps its persisted children untouched:
//! reconciliation only ever runs on a successful discovery, even an empty
//! one.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::CrawlConfig;
use crate::discovery::DiscoveryEngine;
use crate::error::{CrawlError, ReconcileError};
use crate::reconcile::{ReconcileSummary, Reconciler};
use crate::store::StreamStore;
use crate::stream::{Stream, StreamId};

/// A parent that could not be refreshed.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlFailure {
    pub url: String,
    pub error: String,
}

/// Outcome of a crawl.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlReport {
    /// Parents refreshed successfully.
    pub refreshed: usize,
    /// Store operations, summed over all parents.
    pub changes: ReconcileSummary,
    pub failures: Vec<CrawlFailure>,
}

impl CrawlReport {
    fn record(&mut self, summary: ReconcileSummary) {
        self.refreshed += 1;
        self.changes.inserted += summary.inserted;
        self.changes.updated += summary.updated;
        self.changes.deleted += summary.deleted;
    }
}

pub struct Crawler {
    discovery: DiscoveryEngine,
    reconciler: Reconciler,
    config: CrawlConfig,
}

impl Crawler {
    pub fn new(discovery: DiscoveryEngine, store: Arc<dyn StreamStore>, config: CrawlConfig) -> Self {
        Self {
            discovery,
            reconciler: Reconciler::new(store),
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn StreamStore> {
        self.reconciler.store()
    }

    /// Refresh `root` and its traversable descendants, `max_depth` levels deep.
    ///
    /// Per-parent failures are collected in the report; only an unsaved
    /// root is an error.
    #[instrument(skip(self, root), fields(root = %root.url))]
    pub async fn refresh(&self, root: &Stream) -> Result<CrawlReport, ReconcileError> {
        if root.id.is_none() {
            return Err(ReconcileError::UnsavedParent(root.url.clone()));
        }

        let mut report = CrawlReport::default();
        // URLs repeat across the tree, ids don't
        let mut seen: HashSet<StreamId> = HashSet::new();
        let mut level = vec![root.clone()];

        for depth in 0..self.config.max_depth {
            level.retain(|parent| parent.id.is_some_and(|id| seen.insert(id)));
            if level.is_empty() {
                break;
            }
            debug!(depth, parents = level.len(), "Refreshing level");

            let outcomes: Vec<(Stream, Result<(ReconcileSummary, Vec<Stream>), CrawlError>)> =
                stream::iter(level)
                    .map(|parent| async move {
                        let outcome = self.refresh_one(&parent).await;
                        (parent, outcome)
                    })
                    .buffer_unordered(self.config.concurrency.max(1))
                    .collect()
                    .await;

            let mut next = Vec::new();
            for (parent, outcome) in outcomes {
                match outcome {
                    Ok((summary, children)) => {
                        report.record(summary);
                        next.extend(children.into_iter().filter(Stream::is_traversable));
                    }
                    Err(e) => {
                        warn!(url = %parent.url, error = %e, "Refresh failed; keeping persisted children");
                        report.failures.push(CrawlFailure {
                            url: parent.url,
                            error: e.to_string(),
                        });
                    }
                }
            }
            level = next;
        }

        info!(
            refreshed = report.refreshed,
            failed = report.failures.len(),
            inserted = report.changes.inserted,
            updated = report.changes.updated,
            deleted = report.changes.deleted,
            "Crawl finished"
        );
        Ok(report)
    }

    /// Discover and reconcile one parent, returning its persisted children.
    pub async fn refresh_one(
        &self,
        parent: &Stream,
    ) -> Result<(ReconcileSummary, Vec<Stream>), CrawlError> {
        let discovered = self.discovery.discover(parent).await?;
        let summary = self.reconciler.reconcile(parent, discovered).await?;

        let parent_id = parent
            .id
            .ok_or_else(|| ReconcileError::UnsavedParent(parent.url.clone()))?;
        let children = self
            .store()
            .query_children(parent_id)
            .await
            .map_err(ReconcileError::from)?;

        Ok((summary, children))
    }
}
