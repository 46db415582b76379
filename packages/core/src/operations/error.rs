//! Error types for navigation tree operations
//!
//! Every variant is a contract violation: the caller asked for something the
//! tree cannot represent (children under a leaf, a cycle, a duplicate sibling
//! position). None of them are recoverable by retrying.

use crate::models::NavigationId;
use thiserror::Error;

/// Errors that can occur while mutating a [`NavigationTree`](crate::models::NavigationTree)
///
/// # Examples
///
/// ```rust
/// use mynotes_core::models::{NavigationNode, NavigationTree};
/// use mynotes_core::operations::TreeOperationError;
///
/// let mut tree = NavigationTree::new(NavigationNode::root());
/// let list = NavigationNode::leaf("Groceries");
/// let list_id = list.id();
/// tree.insert(tree.root_id(), list, 0).unwrap();
///
/// let err = tree.insert(list_id, NavigationNode::leaf("Milk"), 0).unwrap_err();
/// assert!(matches!(err, TreeOperationError::NotAContainer { .. }));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeOperationError {
    /// Referenced node does not exist in the tree
    #[error("Node '{node_id}' does not exist")]
    NodeNotFound { node_id: NavigationId },

    /// Target parent is a leaf
    #[error("Node '{node_id}' is a leaf and cannot own children")]
    NotAContainer { node_id: NavigationId },

    /// The root is never moved or removed
    #[error("The root node cannot be moved or removed")]
    RootImmovable,

    /// Moving a node under itself or one of its descendants
    #[error("Cannot move node '{node_id}' under its own descendant '{target_id}'")]
    CircularMove {
        node_id: NavigationId,
        target_id: NavigationId,
    },

    /// A node with this id is already linked into the tree
    #[error("Node '{node_id}' is already part of the tree")]
    DuplicateId { node_id: NavigationId },

    /// Only detached, childless, non-root nodes can be inserted
    #[error("Node '{node_id}' cannot be inserted: {reason}")]
    InvalidNode { node_id: NavigationId, reason: String },

    /// Insertion index beyond the end of the sibling list
    #[error("Index {index} is out of bounds for {len} sibling(s)")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Two siblings would share a position
    #[error("Position {position} is already taken among the siblings of '{parent_id}'")]
    DuplicatePosition {
        parent_id: NavigationId,
        position: i64,
    },

    /// Position arithmetic would leave the i64 range
    #[error("Sibling positions exhausted the integer range")]
    PositionOverflow,
}

impl TreeOperationError {
    pub fn node_not_found(node_id: NavigationId) -> Self {
        Self::NodeNotFound { node_id }
    }

    pub fn not_a_container(node_id: NavigationId) -> Self {
        Self::NotAContainer { node_id }
    }

    pub fn invalid_node(node_id: NavigationId, reason: impl Into<String>) -> Self {
        Self::InvalidNode {
            node_id,
            reason: reason.into(),
        }
    }
}
