//! NavigationStore Trait - Persistence Abstraction for the Navigation Tree
//!
//! The tree never talks to the database directly. Everything it needs from
//! persistent storage is expressed by this trait: read all rows once at
//! startup, then apply a stream of small, idempotent writes.
//!
//! # Row model
//!
//! One row per non-root node: `(id, title, parent, position, is_composite)`.
//! The root row is implicit; its id appears only as the `parent` of
//! top-level rows.
//!
//! # Idempotence
//!
//! Every [`StoreWrite`] can be applied any number of times with the same
//! end state. Writes are retried or replayed freely.

use crate::db::error::StoreError;
use crate::db::events::NavigationEvent;
use crate::models::{NavigationId, NavigationNode};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored row, exactly as read from the database
///
/// Ids are kept as raw strings; validation happens when the tree is
/// rebuilt so that a bad row can be reported and skipped instead of
/// failing the whole load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationRecord {
    pub id: String,
    pub title: String,
    pub parent: String,
    pub position: i64,
    pub is_composite: bool,
    pub modified_at: Option<DateTime<Utc>>,
}

impl NavigationRecord {
    /// Row for a freshly built node
    pub fn new(
        id: NavigationId,
        title: impl Into<String>,
        parent: NavigationId,
        position: i64,
        is_composite: bool,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.into(),
            parent: parent.to_string(),
            position,
            is_composite,
            modified_at: None,
        }
    }
}

/// A single idempotent mutation of the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    /// Insert the row, or overwrite every column if it already exists
    Upsert {
        id: NavigationId,
        title: String,
        parent: NavigationId,
        position: i64,
        is_composite: bool,
    },
    UpdateTitle {
        id: NavigationId,
        title: String,
    },
    UpdatePosition {
        id: NavigationId,
        position: i64,
    },
    UpdateParent {
        id: NavigationId,
        parent: NavigationId,
        position: i64,
    },
    /// Delete the row and every row below it
    DeleteSubtree {
        id: NavigationId,
    },
}

impl StoreWrite {
    /// Full row write for a node already linked under `parent`
    pub fn upsert(node: &NavigationNode, parent: NavigationId) -> Self {
        Self::Upsert {
            id: node.id(),
            title: node.title().to_string(),
            parent,
            position: node.position(),
            is_composite: node.is_composite(),
        }
    }

    /// Id of the row the write targets
    pub fn target(&self) -> NavigationId {
        match self {
            StoreWrite::Upsert { id, .. }
            | StoreWrite::UpdateTitle { id, .. }
            | StoreWrite::UpdatePosition { id, .. }
            | StoreWrite::UpdateParent { id, .. }
            | StoreWrite::DeleteSubtree { id } => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StoreWrite::Upsert { .. } => "upsert",
            StoreWrite::UpdateTitle { .. } => "update_title",
            StoreWrite::UpdatePosition { .. } => "update_position",
            StoreWrite::UpdateParent { .. } => "update_parent",
            StoreWrite::DeleteSubtree { .. } => "delete_subtree",
        }
    }
}

impl From<&NavigationEvent> for StoreWrite {
    fn from(event: &NavigationEvent) -> Self {
        match event {
            NavigationEvent::NodeInserted {
                id,
                parent,
                title,
                position,
                is_composite,
            } => StoreWrite::Upsert {
                id: *id,
                title: title.clone(),
                parent: *parent,
                position: *position,
                is_composite: *is_composite,
            },
            NavigationEvent::TitleChanged { id, title } => StoreWrite::UpdateTitle {
                id: *id,
                title: title.clone(),
            },
            NavigationEvent::PositionChanged { id, position } => StoreWrite::UpdatePosition {
                id: *id,
                position: *position,
            },
            NavigationEvent::ParentChanged {
                id,
                new_parent,
                position,
                ..
            } => StoreWrite::UpdateParent {
                id: *id,
                parent: *new_parent,
                position: *position,
            },
            NavigationEvent::NodeRemoved { id, .. } => StoreWrite::DeleteSubtree { id: *id },
        }
    }
}

/// Abstraction over navigation persistence backends
///
/// Implementations must be shareable across tasks; writes are issued one
/// at a time by the write queue, reads only during load.
#[async_trait]
pub trait NavigationStore: Send + Sync {
    /// Read every stored row, in no particular order
    async fn load_all(&self) -> Result<Vec<NavigationRecord>, StoreError>;

    /// Apply one write, returning the number of rows affected
    async fn apply(&self, write: &StoreWrite) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_to_write_mapping() {
        let id = NavigationId::new();
        let parent = NavigationId::new();

        let write = StoreWrite::from(&NavigationEvent::NodeInserted {
            id,
            parent,
            title: "Inbox".into(),
            position: 3,
            is_composite: false,
        });
        assert_eq!(
            write,
            StoreWrite::Upsert {
                id,
                title: "Inbox".into(),
                parent,
                position: 3,
                is_composite: false
            }
        );

        let write = StoreWrite::from(&NavigationEvent::ParentChanged {
            id,
            old_parent: NavigationId::USER_ROOT,
            new_parent: parent,
            position: -1,
        });
        assert_eq!(
            write,
            StoreWrite::UpdateParent {
                id,
                parent,
                position: -1
            }
        );

        let write = StoreWrite::from(&NavigationEvent::NodeRemoved { id, parent });
        assert_eq!(write, StoreWrite::DeleteSubtree { id });
        assert_eq!(write.target(), id);
        assert_eq!(write.kind(), "delete_subtree");
    }

    #[test]
    fn test_title_and_position_events_map_to_narrow_updates() {
        let id = NavigationId::new();
        assert_eq!(
            StoreWrite::from(&NavigationEvent::TitleChanged {
                id,
                title: "Renamed".into()
            }),
            StoreWrite::UpdateTitle {
                id,
                title: "Renamed".into()
            }
        );
        assert_eq!(
            StoreWrite::from(&NavigationEvent::PositionChanged { id, position: 9 }),
            StoreWrite::UpdatePosition { id, position: 9 }
        );
    }

    #[test]
    fn test_record_uses_canonical_id_strings() {
        let id = NavigationId::new();
        let record = NavigationRecord::new(id, "Work", NavigationId::USER_ROOT, 0, true);
        assert_eq!(record.id, id.to_string());
        assert_eq!(record.parent, "00000000-0000-0000-0000-000000000001");
        assert!(record.modified_at.is_none());
    }
}
