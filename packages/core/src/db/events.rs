//! Navigation Events
//!
//! Events emitted by [`NavigationTree`](crate::models::NavigationTree) after
//! each mutation. They follow the observer pattern: the persistence layer
//! (and anything else interested) registers a [`NavigationObserver`] and
//! receives every change in the order the in-memory state changed.
//!
//! # Event Flow
//!
//! 1. A tree mutation completes (insert, move, title or position change)
//! 2. The tree hands the resulting events to each observer, in order
//! 3. `PersistenceSync` turns each event into a store write and queues it

use crate::models::NavigationId;
use serde::Serialize;

/// Changes to the navigation hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum NavigationEvent {
    /// A new node was linked under `parent`
    #[serde(rename = "node:inserted", rename_all = "camelCase")]
    NodeInserted {
        id: NavigationId,
        parent: NavigationId,
        title: String,
        position: i64,
        is_composite: bool,
    },

    /// A node's title was reassigned
    #[serde(rename = "node:title", rename_all = "camelCase")]
    TitleChanged { id: NavigationId, title: String },

    /// A node's position among its siblings changed
    #[serde(rename = "node:position", rename_all = "camelCase")]
    PositionChanged { id: NavigationId, position: i64 },

    /// A node moved to a new parent (or to a new slot under the same parent)
    #[serde(rename = "node:parent", rename_all = "camelCase")]
    ParentChanged {
        id: NavigationId,
        old_parent: NavigationId,
        new_parent: NavigationId,
        position: i64,
    },

    /// A node and all of its descendants were removed
    #[serde(rename = "node:removed", rename_all = "camelCase")]
    NodeRemoved {
        id: NavigationId,
        parent: NavigationId,
    },
}

impl NavigationEvent {
    /// Get a string representation of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            NavigationEvent::NodeInserted { .. } => "node:inserted",
            NavigationEvent::TitleChanged { .. } => "node:title",
            NavigationEvent::PositionChanged { .. } => "node:position",
            NavigationEvent::ParentChanged { .. } => "node:parent",
            NavigationEvent::NodeRemoved { .. } => "node:removed",
        }
    }

    /// Id of the node the event is about
    pub fn node_id(&self) -> NavigationId {
        match self {
            NavigationEvent::NodeInserted { id, .. }
            | NavigationEvent::TitleChanged { id, .. }
            | NavigationEvent::PositionChanged { id, .. }
            | NavigationEvent::ParentChanged { id, .. }
            | NavigationEvent::NodeRemoved { id, .. } => *id,
        }
    }
}

/// Receives tree mutations
///
/// Observers are called synchronously on the thread that mutated the tree,
/// after the mutation is complete. Implementations should hand work off
/// (for example to a [`WriteQueue`](crate::operations::WriteQueue)) rather
/// than block.
pub trait NavigationObserver: Send + Sync {
    fn on_event(&self, event: &NavigationEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The JSON shape is flat: the tag is merged with the camelCase fields
    #[test]
    fn test_navigation_event_serialization_contract() {
        let id = NavigationId::new();
        let event = NavigationEvent::ParentChanged {
            id,
            old_parent: NavigationId::USER_ROOT,
            new_parent: NavigationId::USER_ROOT,
            position: 3,
        };

        let parsed: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(parsed.get("type").unwrap(), "node:parent");
        assert_eq!(parsed.get("id").unwrap(), &serde_json::json!(id.to_string()));
        assert_eq!(
            parsed.get("oldParent").unwrap(),
            "00000000-0000-0000-0000-000000000001"
        );
        assert_eq!(parsed.get("position").unwrap(), 3);
        assert!(parsed.get("old_parent").is_none());
    }

    #[test]
    fn test_event_type_matches_serialized_tag() {
        let event = NavigationEvent::TitleChanged {
            id: NavigationId::new(),
            title: "Reading".to_string(),
        };
        let parsed = serde_json::to_value(&event).unwrap();
        assert_eq!(parsed.get("type").unwrap(), event.event_type());
    }
}
