//! Navigation Node Model
//!
//! A navigation node is an entry in the user's navigation pane: either a
//! composite group that owns ordered children, a leaf list, or the single
//! implicit root. Structural links (`parent`, `children`) are owned and
//! maintained by [`NavigationTree`](super::NavigationTree); a freshly created
//! node is detached until inserted.

use crate::models::NavigationId;
use serde::{Deserialize, Serialize};

/// Opaque reference to a display glyph (symbol name, font glyph, asset key)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconRef(pub String);

impl IconRef {
    pub fn new(glyph: impl Into<String>) -> Self {
        Self(glyph.into())
    }
}

/// Closed set of node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavigationNodeKind {
    /// The singleton container at the top of the tree
    Root,
    /// A user group that owns ordered children
    Composite,
    /// A user list without children
    Leaf,
}

impl NavigationNodeKind {
    /// Whether nodes of this kind own a children collection
    pub fn is_container(self) -> bool {
        match self {
            NavigationNodeKind::Root | NavigationNodeKind::Composite => true,
            NavigationNodeKind::Leaf => false,
        }
    }
}

/// A node of the navigation hierarchy
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationNode {
    pub(crate) id: NavigationId,
    pub(crate) title: String,
    pub(crate) icon: Option<IconRef>,
    pub(crate) position: i64,
    pub(crate) kind: NavigationNodeKind,
    pub(crate) parent: Option<NavigationId>,
    /// Child ids in ascending position order (always empty for leaves)
    pub(crate) children: Vec<NavigationId>,
}

impl NavigationNode {
    /// Create the root node with its reserved identity
    pub fn root() -> Self {
        Self::detached(NavigationId::USER_ROOT, String::new(), NavigationNodeKind::Root)
    }

    /// Create a new group node with a random id
    pub fn composite(title: impl Into<String>) -> Self {
        Self::detached(NavigationId::new(), title.into(), NavigationNodeKind::Composite)
    }

    /// Create a new list node with a random id
    pub fn leaf(title: impl Into<String>) -> Self {
        Self::detached(NavigationId::new(), title.into(), NavigationNodeKind::Leaf)
    }

    /// Rebuild a node from stored values (position is taken as-is)
    pub fn restore(id: NavigationId, title: String, position: i64, is_composite: bool) -> Self {
        let kind = if is_composite {
            NavigationNodeKind::Composite
        } else {
            NavigationNodeKind::Leaf
        };
        let mut node = Self::detached(id, title, kind);
        node.position = position;
        node
    }

    fn detached(id: NavigationId, title: String, kind: NavigationNodeKind) -> Self {
        Self {
            id,
            title,
            icon: None,
            position: 0,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Builder-style icon assignment for nodes that are not yet inserted
    pub fn with_icon(mut self, icon: IconRef) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn id(&self) -> NavigationId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn icon(&self) -> Option<&IconRef> {
        self.icon.as_ref()
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn kind(&self) -> NavigationNodeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<NavigationId> {
        self.parent
    }

    /// Child ids in sibling order; empty for leaves
    pub fn child_ids(&self) -> &[NavigationId] {
        &self.children
    }

    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, NavigationNodeKind::Root)
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, NavigationNodeKind::Composite)
    }
}
