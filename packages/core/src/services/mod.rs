//! Services
//!
//! - `PersistenceSync` - Loads the navigation tree from storage and keeps the
//!   store updated as the tree changes
//!
//! Services coordinate between the database layer and the in-memory tree.

pub mod error;
pub mod persistence_sync;

pub use error::SyncError;
pub use persistence_sync::{LoadReport, PersistenceSync};
