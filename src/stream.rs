//! Stream tree nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mime::MimeType;

/// Identity assigned by the store.
pub type StreamId = i64;

/// One node of a discovered stream tree.
///
/// `id` stays `None` until the store persists the node. `base_id` names the
/// root of the tree and is copied unchanged to every descendant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub id: Option<StreamId>,
    pub base_id: Option<StreamId>,
    pub parent_id: Option<StreamId>,
    /// Absolute, fragment-free. Unique among siblings.
    pub url: String,
    pub title: String,
    pub mime_type: MimeType,
    pub updated: DateTime<Utc>,
}

impl Stream {
    /// A new root node.
    pub fn new(url: impl Into<String>, title: impl Into<String>, mime_type: MimeType) -> Self {
        Self {
            id: None,
            base_id: None,
            parent_id: None,
            url: url.into(),
            title: title.into(),
            mime_type,
            updated: Utc::now(),
        }
    }

    /// A child of `parent`, inheriting its tree and timestamp.
    ///
    /// An empty `title` falls back to the URL.
    pub fn child_of(
        parent: &Stream,
        url: impl Into<String>,
        title: impl Into<String>,
        mime_type: MimeType,
    ) -> Self {
        let url = url.into();
        let title = title.into();
        let title = if title.trim().is_empty() {
            url.clone()
        } else {
            title
        };

        Self {
            id: None,
            base_id: parent.base_id,
            parent_id: parent.id,
            url,
            title,
            mime_type,
            updated: parent.updated,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_playable(&self) -> bool {
        self.mime_type.is_playable()
    }

    /// Lists further streams (web page or playlist).
    pub fn is_traversable(&self) -> bool {
        self.mime_type.is_traversable()
    }

    /// Either playable or traversable. Unsupported nodes are never kept.
    pub fn is_supported(&self) -> bool {
        self.is_playable() || self.is_traversable()
    }

    /// Set `title` and bump `updated`.
    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated = Utc::now();
    }
}

/// Fields a reconciliation overwrites on an existing node.
///
/// `url`, `id`, `parent_id` and `base_id` are never part of an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamUpdate {
    pub title: String,
    pub mime_type: MimeType,
    pub updated: DateTime<Utc>,
}

impl StreamUpdate {
    pub fn apply_to(&self, stream: &mut Stream) {
        stream.title.clone_from(&self.title);
        stream.mime_type = self.mime_type.clone();
        stream.updated = self.updated;
    }
}

impl From<&Stream> for StreamUpdate {
    fn from(stream: &Stream) -> Self {
        Self {
            title: stream.title.clone(),
            mime_type: stream.mime_type.clone(),
            updated: stream.updated,
        }
    }
}
