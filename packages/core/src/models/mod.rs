//! Data Models
//!
//! This module contains the navigation data structures:
//!
//! - `NavigationId` - Opaque node identity with a reserved well-known range
//! - `NavigationNode` - Root, group (composite) or list (leaf) entry
//! - `NavigationTree` - The rooted hierarchy and its structural queries

mod navigation_id;
mod navigation_node;
mod navigation_tree;

pub use navigation_id::{InvalidNavigationId, NavigationId};
pub use navigation_node::{IconRef, NavigationNode, NavigationNodeKind};
pub use navigation_tree::{DepthFirst, NavigationTree, NodeRelations};
