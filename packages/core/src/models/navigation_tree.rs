//! Navigation Tree
//!
//! The in-memory hierarchy shown in the navigation pane. The tree owns every
//! node in an id-keyed arena; containers keep their child ids sorted by
//! position. All mutations go through the tree so it can keep the sibling
//! position invariant and tell observers about each change.
//!
//! # Ordering
//!
//! Sibling positions are assigned by
//! [`SiblingOrderCalculator`](crate::operations::SiblingOrderCalculator).
//! An insert may renumber a few neighbours; each renumbered neighbour is
//! reported as its own `PositionChanged` event, before the event for the
//! inserted or moved node.
//!
//! # Examples
//!
//! ```rust
//! use mynotes_core::models::{NavigationNode, NavigationTree};
//!
//! let mut tree = NavigationTree::new(NavigationNode::root());
//! let work = NavigationNode::composite("Work");
//! let work_id = work.id();
//! tree.insert(tree.root_id(), work, 0).unwrap();
//!
//! let todo = NavigationNode::leaf("Todo");
//! let todo_id = todo.id();
//! tree.insert(work_id, todo, 0).unwrap();
//!
//! assert_eq!(tree.parent_of(todo_id).map(|p| p.id()), Some(work_id));
//! ```

use crate::db::{NavigationEvent, NavigationObserver};
use crate::models::{IconRef, NavigationId, NavigationNode};
use crate::operations::{SiblingOrderCalculator, SiblingPlacement, TreeOperationError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Parent and adjacent siblings of a node
#[derive(Debug, Clone, Copy)]
pub struct NodeRelations<'a> {
    pub parent: &'a NavigationNode,
    pub previous: Option<&'a NavigationNode>,
    pub next: Option<&'a NavigationNode>,
}

/// Rooted navigation hierarchy
pub struct NavigationTree {
    root_id: NavigationId,
    nodes: HashMap<NavigationId, NavigationNode>,
    observers: Vec<Arc<dyn NavigationObserver>>,
}

impl fmt::Debug for NavigationTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationTree")
            .field("root_id", &self.root_id)
            .field("nodes", &self.nodes.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for NavigationTree {
    fn default() -> Self {
        Self::new(NavigationNode::root())
    }
}

impl NavigationTree {
    /// Create a tree around an explicitly constructed root
    ///
    /// # Panics
    ///
    /// Panics if `root` is not a detached node of kind `Root`; passing any
    /// other node is a programming error.
    pub fn new(root: NavigationNode) -> Self {
        assert!(
            root.is_root() && root.parent.is_none() && root.children.is_empty(),
            "NavigationTree::new requires a detached root node"
        );
        let root_id = root.id;
        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);
        Self {
            root_id,
            nodes,
            observers: Vec::new(),
        }
    }

    /// Register an observer for all subsequent mutations
    pub fn subscribe(&mut self, observer: Arc<dyn NavigationObserver>) {
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    //
    // QUERIES
    //

    pub fn root_id(&self) -> NavigationId {
        self.root_id
    }

    pub fn root(&self) -> &NavigationNode {
        &self.nodes[&self.root_id]
    }

    pub fn get(&self, id: NavigationId) -> Option<&NavigationNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NavigationId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds nothing but the root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Depth-first search from the root; returns the first match
    pub fn find_node<F>(&self, predicate: F) -> Option<&NavigationNode>
    where
        F: Fn(&NavigationNode) -> bool,
    {
        self.depth_first().find(|node| predicate(*node))
    }

    /// Pre-order traversal from the root, children in sibling order
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            tree: self,
            stack: vec![self.root_id],
        }
    }

    /// Children of `id` in sibling order (empty for leaves and unknown ids)
    pub fn children(&self, id: NavigationId) -> impl Iterator<Item = &NavigationNode> + '_ {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(move |child| self.nodes.get(child))
    }

    /// All descendants of `id` in pre-order, excluding `id` itself
    pub fn descendants(&self, id: NavigationId) -> Vec<NavigationId> {
        let mut out = Vec::new();
        let mut stack: Vec<NavigationId> = match self.nodes.get(&id) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// The container whose children include `id`; `None` for the root
    pub fn parent_of(&self, id: NavigationId) -> Option<&NavigationNode> {
        self.nodes
            .get(&id)
            .and_then(|node| node.parent)
            .and_then(|parent| self.nodes.get(&parent))
    }

    /// Index of `id` among its siblings
    pub fn index_of(&self, id: NavigationId) -> Option<usize> {
        self.parent_of(id)?
            .children
            .iter()
            .position(|child| *child == id)
    }

    pub fn previous_sibling(&self, id: NavigationId) -> Option<&NavigationNode> {
        self.relations(id)?.previous
    }

    pub fn next_sibling(&self, id: NavigationId) -> Option<&NavigationNode> {
        self.relations(id)?.next
    }

    /// Parent, previous and next sibling in one lookup
    pub fn relations(&self, id: NavigationId) -> Option<NodeRelations<'_>> {
        let parent = self.parent_of(id)?;
        let index = parent.children.iter().position(|child| *child == id)?;
        let previous = index
            .checked_sub(1)
            .and_then(|i| parent.children.get(i))
            .and_then(|sibling| self.nodes.get(sibling));
        let next = parent
            .children
            .get(index + 1)
            .and_then(|sibling| self.nodes.get(sibling));
        Some(NodeRelations {
            parent,
            previous,
            next,
        })
    }

    /// Positions of the children of `parent_id`, in sibling order
    pub fn child_positions(&self, parent_id: NavigationId) -> Vec<i64> {
        self.children(parent_id).map(|child| child.position).collect()
    }

    /// Whether `ancestor` lies on the parent chain of `id`
    pub fn is_ancestor(&self, ancestor: NavigationId, id: NavigationId) -> bool {
        let mut current = self.nodes.get(&id).and_then(|node| node.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes.get(&parent).and_then(|node| node.parent);
        }
        false
    }

    //
    // MUTATIONS
    //

    /// Insert a detached node under `parent_id` at sibling `index`
    ///
    /// The node's position is assigned here; neighbours may be renumbered.
    pub fn insert(
        &mut self,
        parent_id: NavigationId,
        mut node: NavigationNode,
        index: usize,
    ) -> Result<(), TreeOperationError> {
        if node.is_root() {
            return Err(TreeOperationError::invalid_node(node.id, "a root cannot be inserted"));
        }
        if node.parent.is_some() || !node.children.is_empty() {
            return Err(TreeOperationError::invalid_node(
                node.id,
                "node is already linked to a hierarchy",
            ));
        }
        if self.nodes.contains_key(&node.id) {
            return Err(TreeOperationError::DuplicateId { node_id: node.id });
        }

        let placement = self.plan_placement(parent_id, None, index)?;

        let mut events = Vec::new();
        self.apply_placement(parent_id, node.id, &placement, &mut events);

        node.parent = Some(parent_id);
        node.position = placement.position;
        events.push(NavigationEvent::NodeInserted {
            id: node.id,
            parent: parent_id,
            title: node.title.clone(),
            position: node.position,
            is_composite: node.is_composite(),
        });
        tracing::debug!(
            "Inserted node '{}' under '{}' at index {} (position {}, {} sibling(s) shifted)",
            node.id,
            parent_id,
            index,
            placement.position,
            placement.shift_count()
        );
        self.nodes.insert(node.id, node);

        self.debug_check_siblings(parent_id);
        self.notify(&events);
        Ok(())
    }

    /// Insert a detached node next to `anchor`, the way add-list and
    /// add-group place new entries
    ///
    /// - leaf anchor: directly after it, among its siblings
    /// - group (or root) anchor: after its last child
    /// - no anchor: at the end of the top level
    ///
    /// Returns the parent the node ended up under.
    pub fn insert_relative(
        &mut self,
        anchor: Option<NavigationId>,
        node: NavigationNode,
    ) -> Result<NavigationId, TreeOperationError> {
        let anchor_id = anchor.unwrap_or(self.root_id);
        let anchor = self
            .nodes
            .get(&anchor_id)
            .ok_or_else(|| TreeOperationError::node_not_found(anchor_id))?;

        let (parent_id, index) = if anchor.is_container() {
            (anchor_id, anchor.children.len())
        } else {
            match (anchor.parent, self.index_of(anchor_id)) {
                (Some(parent_id), Some(index)) => (parent_id, index + 1),
                _ => return Err(TreeOperationError::node_not_found(anchor_id)),
            }
        };

        self.insert(parent_id, node, index)?;
        Ok(parent_id)
    }

    /// Move `id` under `new_parent` at `new_index`
    ///
    /// `new_index` indexes the target's children as they are once `id` has
    /// been detached. Observers only see the finished move.
    pub fn move_node(
        &mut self,
        id: NavigationId,
        new_parent: NavigationId,
        new_index: usize,
    ) -> Result<(), TreeOperationError> {
        if id == self.root_id {
            return Err(TreeOperationError::RootImmovable);
        }
        let (old_parent, old_position) = {
            let node = self
                .nodes
                .get(&id)
                .ok_or_else(|| TreeOperationError::node_not_found(id))?;
            (node.parent.unwrap_or(self.root_id), node.position)
        };
        if new_parent == id || self.is_ancestor(id, new_parent) {
            return Err(TreeOperationError::CircularMove {
                node_id: id,
                target_id: new_parent,
            });
        }

        let placement = self.plan_placement(new_parent, Some(id), new_index)?;

        if old_parent == new_parent
            && placement.position == old_position
            && placement.shift_count() == 0
            && self.index_of(id) == Some(placement.index)
        {
            return Ok(());
        }

        // Detach and re-link without notifying in between
        if let Some(parent) = self.nodes.get_mut(&old_parent) {
            parent.children.retain(|child| *child != id);
        }

        let mut events = Vec::new();
        self.apply_placement(new_parent, id, &placement, &mut events);

        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = Some(new_parent);
            node.position = placement.position;
        }
        events.push(NavigationEvent::ParentChanged {
            id,
            old_parent,
            new_parent,
            position: placement.position,
        });
        tracing::debug!(
            "Moved node '{}' from '{}' to '{}' at index {}",
            id,
            old_parent,
            new_parent,
            new_index
        );

        self.debug_check_siblings(new_parent);
        self.notify(&events);
        Ok(())
    }

    /// Reassign a node's title
    pub fn set_title(
        &mut self,
        id: NavigationId,
        title: impl Into<String>,
    ) -> Result<(), TreeOperationError> {
        let root_id = self.root_id;
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| TreeOperationError::node_not_found(id))?;
        let title = title.into();
        if node.title == title {
            return Ok(());
        }
        node.title = title.clone();

        // The root has no stored row
        if id != root_id {
            self.notify(&[NavigationEvent::TitleChanged { id, title }]);
        }
        Ok(())
    }

    /// Reassign a node's icon (kept in memory only)
    pub fn set_icon(
        &mut self,
        id: NavigationId,
        icon: Option<IconRef>,
    ) -> Result<(), TreeOperationError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| TreeOperationError::node_not_found(id))?;
        node.icon = icon;
        Ok(())
    }

    /// Explicitly reorder a node by assigning its position
    ///
    /// The position must not be held by another sibling.
    pub fn set_position(
        &mut self,
        id: NavigationId,
        position: i64,
    ) -> Result<(), TreeOperationError> {
        if id == self.root_id {
            return Err(TreeOperationError::RootImmovable);
        }
        let node = self
            .nodes
            .get(&id)
            .ok_or_else(|| TreeOperationError::node_not_found(id))?;
        if node.position == position {
            return Ok(());
        }
        let parent_id = node.parent.unwrap_or(self.root_id);
        if self
            .children(parent_id)
            .any(|sibling| sibling.id != id && sibling.position == position)
        {
            return Err(TreeOperationError::DuplicatePosition {
                parent_id,
                position,
            });
        }

        if let Some(node) = self.nodes.get_mut(&id) {
            node.position = position;
        }
        self.sort_children(parent_id);

        self.debug_check_siblings(parent_id);
        self.notify(&[NavigationEvent::PositionChanged { id, position }]);
        Ok(())
    }

    /// Remove a node and its whole subtree; returns the removed ids
    pub fn remove(&mut self, id: NavigationId) -> Result<Vec<NavigationId>, TreeOperationError> {
        if id == self.root_id {
            return Err(TreeOperationError::RootImmovable);
        }
        let parent_id = self
            .nodes
            .get(&id)
            .ok_or_else(|| TreeOperationError::node_not_found(id))?
            .parent
            .unwrap_or(self.root_id);

        let mut removed = vec![id];
        removed.extend(self.descendants(id));

        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.retain(|child| *child != id);
        }
        for removed_id in &removed {
            self.nodes.remove(removed_id);
        }
        tracing::debug!(
            "Removed node '{}' and {} descendant(s)",
            id,
            removed.len() - 1
        );

        self.notify(&[NavigationEvent::NodeRemoved {
            id,
            parent: parent_id,
        }]);
        Ok(removed)
    }

    //
    // RESTORE (used while rebuilding from storage; no events)
    //

    /// Link a stored node under `parent_id` keeping its stored position
    ///
    /// Callers link siblings in ascending position order with unique
    /// positions.
    pub(crate) fn restore_child(
        &mut self,
        parent_id: NavigationId,
        mut node: NavigationNode,
    ) -> Result<(), TreeOperationError> {
        if self.nodes.contains_key(&node.id) {
            return Err(TreeOperationError::DuplicateId { node_id: node.id });
        }
        let parent = self
            .nodes
            .get_mut(&parent_id)
            .ok_or_else(|| TreeOperationError::node_not_found(parent_id))?;
        if !parent.is_container() {
            return Err(TreeOperationError::not_a_container(parent_id));
        }
        parent.children.push(node.id);
        node.parent = Some(parent_id);
        self.nodes.insert(node.id, node);
        Ok(())
    }

    /// Position one past the last child of `parent_id`
    pub(crate) fn tail_position(&self, parent_id: NavigationId) -> Result<i64, TreeOperationError> {
        let positions = self.child_positions(parent_id);
        SiblingOrderCalculator::place(&positions, positions.len()).map(|p| p.position)
    }

    //
    // INTERNALS
    //

    /// Validate the target and compute a placement without mutating anything
    fn plan_placement(
        &self,
        parent_id: NavigationId,
        excluding: Option<NavigationId>,
        index: usize,
    ) -> Result<SiblingPlacement, TreeOperationError> {
        let parent = self
            .nodes
            .get(&parent_id)
            .ok_or_else(|| TreeOperationError::node_not_found(parent_id))?;
        if !parent.is_container() {
            return Err(TreeOperationError::not_a_container(parent_id));
        }
        let positions: Vec<i64> = parent
            .children
            .iter()
            .filter(|child| Some(**child) != excluding)
            .filter_map(|child| self.nodes.get(child))
            .map(|child| child.position)
            .collect();
        SiblingOrderCalculator::place(&positions, index)
    }

    /// Shift neighbours and link `child_id` at the planned index
    fn apply_placement(
        &mut self,
        parent_id: NavigationId,
        child_id: NavigationId,
        placement: &SiblingPlacement,
        events: &mut Vec<NavigationEvent>,
    ) {
        let shifted: Vec<NavigationId> = self
            .nodes
            .get(&parent_id)
            .map(|parent| parent.children[placement.shifted.clone()].to_vec())
            .unwrap_or_default();

        for sibling_id in shifted {
            if let Some(sibling) = self.nodes.get_mut(&sibling_id) {
                sibling.position += placement.delta;
                events.push(NavigationEvent::PositionChanged {
                    id: sibling_id,
                    position: sibling.position,
                });
            }
        }

        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.insert(placement.index, child_id);
        }
    }

    fn sort_children(&mut self, parent_id: NavigationId) {
        let Some(parent) = self.nodes.get_mut(&parent_id) else {
            return;
        };
        let mut children = std::mem::take(&mut parent.children);
        children.sort_by_key(|child| {
            self.nodes
                .get(child)
                .map(|node| (node.position, *child))
                .unwrap_or((i64::MAX, *child))
        });
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children = children;
        }
    }

    fn debug_check_siblings(&self, parent_id: NavigationId) {
        debug_assert!(
            SiblingOrderCalculator::is_strictly_ascending(&self.child_positions(parent_id)),
            "duplicate or unsorted sibling positions under '{}': {:?}",
            parent_id,
            self.child_positions(parent_id)
        );
    }

    fn notify(&self, events: &[NavigationEvent]) {
        for event in events {
            for observer in &self.observers {
                observer.on_event(event);
            }
        }
    }
}

/// Pre-order iterator over a [`NavigationTree`]
pub struct DepthFirst<'a> {
    tree: &'a NavigationTree,
    stack: Vec<NavigationId>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = &'a NavigationNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if let Some(node) = self.tree.nodes.get(&id) {
                self.stack.extend(node.children.iter().rev().copied());
                return Some(node);
            }
        }
        None
    }
}
