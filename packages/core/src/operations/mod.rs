//! Navigation Operations
//!
//! Building blocks used by the tree and the persistence layer:
//!
//! - [`sibling_order`] - integer position assignment with bounded rebalancing
//! - [`write_queue`] - single-consumer FIFO queue that serializes store writes
//! - [`error`] - contract violations raised by tree operations

pub mod error;
pub mod sibling_order;
pub mod write_queue;

pub use error::TreeOperationError;
pub use sibling_order::{SiblingOrderCalculator, SiblingPlacement};
pub use write_queue::{WriteError, WriteHandle, WriteQueue};
