//! Persistence contract.
//!
//! The engine only needs four primitives. `delete` must cascade to the
//! deleted node's persisted descendants; reconciliation relies on that and
//! never walks grandchildren itself.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::stream::{Stream, StreamId, StreamUpdate};

/// Stream persistence consumed by reconciliation and crawling.
#[async_trait]
pub trait StreamStore: Send + Sync {
    /// Persisted children of `parent_id`, in insertion order.
    async fn query_children(&self, parent_id: StreamId) -> Result<Vec<Stream>, StoreError>;

    /// Persist a new node and return its identity.
    ///
    /// A node without `base_id` becomes the root of its own tree. Inserting
    /// a URL that already exists under the same parent overwrites that
    /// node instead.
    async fn insert(&self, stream: &Stream) -> Result<StreamId, StoreError>;

    /// Overwrite title, media type and timestamp of an existing node.
    async fn update(&self, id: StreamId, fields: &StreamUpdate) -> Result<(), StoreError>;

    /// Remove a node and all of its persisted descendants.
    async fn delete(&self, id: StreamId) -> Result<(), StoreError>;

    /// Look up a single node.
    async fn get(&self, id: StreamId) -> Result<Option<Stream>, StoreError>;
}

#[derive(Default)]
struct Inner {
    next_id: StreamId,
    rows: BTreeMap<StreamId, Stream>,
}

/// In-memory [`StreamStore`] with cascading delete.
///
/// Ids are handed out sequentially from 1, so iteration order is insertion
/// order.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted nodes.
    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// All nodes, in insertion order.
    pub async fn all(&self) -> Vec<Stream> {
        self.inner.read().await.rows.values().cloned().collect()
    }
}

#[async_trait]
impl StreamStore for MemoryStore {
    async fn query_children(&self, parent_id: StreamId) -> Result<Vec<Stream>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .values()
            .filter(|s| s.parent_id == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn insert(&self, stream: &Stream) -> Result<StreamId, StoreError> {
        let mut inner = self.inner.write().await;

        // (parent_id, url) is unique: a second insert replaces the fields
        if let Some(parent_id) = stream.parent_id {
            let existing = inner
                .rows
                .values_mut()
                .find(|s| s.parent_id == Some(parent_id) && s.url == stream.url);
            if let Some(row) = existing {
                StreamUpdate::from(stream).apply_to(row);
                let id = row.id.ok_or(StoreError::Backend("row without id".into()))?;
                debug!(id, url = %stream.url, "Replaced stream");
                return Ok(id);
            }
        }

        inner.next_id += 1;
        let id = inner.next_id;

        let mut row = stream.clone();
        row.id = Some(id);
        row.base_id = row.base_id.or(Some(id));
        inner.rows.insert(id, row);

        debug!(id, url = %stream.url, "Inserted stream");
        Ok(id)
    }

    async fn update(&self, id: StreamId, fields: &StreamUpdate) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let row = inner.rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        fields.apply_to(row);
        Ok(())
    }

    async fn delete(&self, id: StreamId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.rows.remove(&id).is_none() {
            return Err(StoreError::NotFound(id));
        }

        let mut pending = vec![id];
        while let Some(parent) = pending.pop() {
            let children: Vec<StreamId> = inner
                .rows
                .values()
                .filter(|s| s.parent_id == Some(parent))
                .filter_map(|s| s.id)
                .collect();
            for child in children {
                inner.rows.remove(&child);
                pending.push(child);
            }
        }

        debug!(id, "Deleted stream");
        Ok(())
    }

    async fn get(&self, id: StreamId) -> Result<Option<Stream>, StoreError> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }
}
