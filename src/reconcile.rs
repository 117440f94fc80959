//! Reconciliation of discovered children against the store.
//!
//! Three phases per parent:
//!
//! 1. **Load** the persisted children, keyed by URL
//! 2. **Diff** them against the discovered list: persisted URLs that were
//!    not discovered are *removed*, discovered URLs already persisted are
//!    *matched*, the rest are *new*
//! 3. **Apply** deletes, then unconditional updates, then inserts
//!
//! Matching is exact string equality on `url`. Deleting a node relies on the
//! store to cascade to its descendants; subtrees under matched nodes are
//! left alone.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::ReconcileError;
use crate::store::StreamStore;
use crate::stream::{Stream, StreamId, StreamUpdate};

/// What a reconciliation will do to one parent's children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    /// Persisted children no longer discovered.
    pub deletes: Vec<Stream>,
    /// Persisted id plus the discovered node that overwrites it.
    pub updates: Vec<(StreamId, Stream)>,
    /// Discovered nodes with no persisted counterpart.
    pub inserts: Vec<Stream>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.updates.is_empty() && self.inserts.is_empty()
    }
}

/// Counts of applied operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// Partition `existing` and `discovered` into a plan.
///
/// Duplicate URLs in `discovered` are not collapsed; each produces its own
/// update or insert, in order.
pub fn diff(existing: Vec<Stream>, discovered: Vec<Stream>) -> ReconcilePlan {
    let wanted: HashSet<&str> = discovered.iter().map(|s| s.url.as_str()).collect();

    let mut by_url: HashMap<String, StreamId> = HashMap::with_capacity(existing.len());
    let mut deletes = Vec::new();
    for stream in existing {
        let Some(id) = stream.id else {
            warn!(url = %stream.url, "Persisted child without id");
            continue;
        };
        if wanted.contains(stream.url.as_str()) {
            if by_url.insert(stream.url.clone(), id).is_some() {
                warn!(url = %stream.url, "Duplicate persisted child URL");
            }
        } else {
            deletes.push(stream);
        }
    }

    let mut updates = Vec::new();
    let mut inserts = Vec::new();
    for mut stream in discovered {
        if let Some(&id) = by_url.get(&stream.url) {
            stream.id = Some(id);
            updates.push((id, stream));
        } else {
            stream.id = None;
            inserts.push(stream);
        }
    }

    ReconcilePlan {
        deletes,
        updates,
        inserts,
    }
}

/// Applies discovered child lists to a [`StreamStore`].
///
/// Reconciliations of the same parent are serialized; different parents
/// run independently.
pub struct Reconciler {
    store: Arc<dyn StreamStore>,
    locks: Mutex<HashMap<StreamId, Arc<Mutex<()>>>>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn StreamStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn StreamStore> {
        &self.store
    }

    /// Make the persisted children of `parent` match `discovered`.
    ///
    /// Discovered nodes are re-parented onto `parent` first. Store errors
    /// abort the pass; operations already applied stay applied.
    #[instrument(skip(self, parent, discovered), fields(parent = %parent.url, discovered = discovered.len()))]
    pub async fn reconcile(
        &self,
        parent: &Stream,
        discovered: Vec<Stream>,
    ) -> Result<ReconcileSummary, ReconcileError> {
        let parent_id = parent
            .id
            .ok_or_else(|| ReconcileError::UnsavedParent(parent.url.clone()))?;

        let lock = self.lock_for(parent_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.apply_locked(parent, parent_id, discovered).await
        };
        self.release(parent_id, lock).await;

        result
    }

    async fn apply_locked(
        &self,
        parent: &Stream,
        parent_id: StreamId,
        discovered: Vec<Stream>,
    ) -> Result<ReconcileSummary, ReconcileError> {
        let existing = self.store.query_children(parent_id).await?;

        let discovered = discovered
            .into_iter()
            .map(|mut s| {
                s.parent_id = Some(parent_id);
                // A root that never got a base is its own
                s.base_id = parent.base_id.or(Some(parent_id));
                s
            })
            .collect();

        let plan = diff(existing, discovered);
        debug!(
            deletes = plan.deletes.len(),
            updates = plan.updates.len(),
            inserts = plan.inserts.len(),
            "Reconcile plan"
        );

        let mut summary = ReconcileSummary::default();

        for stream in &plan.deletes {
            if let Some(id) = stream.id {
                self.store.delete(id).await?;
                debug!(id, url = %stream.url, "Deleted");
                summary.deleted += 1;
            }
        }

        for (id, stream) in &plan.updates {
            self.store.update(*id, &StreamUpdate::from(stream)).await?;
            summary.updated += 1;
        }

        for stream in &plan.inserts {
            let id = self.store.insert(stream).await?;
            debug!(id, url = %stream.url, "Inserted");
            summary.inserted += 1;
        }

        info!(
            inserted = summary.inserted,
            updated = summary.updated,
            deleted = summary.deleted,
            "Reconciled"
        );
        Ok(summary)
    }

    async fn lock_for(&self, parent_id: StreamId) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(parent_id)
            .or_default()
            .clone()
    }

    /// Drop the lock entry once nobody else holds or waits on it.
    async fn release(&self, parent_id: StreamId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // map + ours
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&parent_id);
        }
    }
}
