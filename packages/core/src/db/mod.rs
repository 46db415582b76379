//! Database Layer
//!
//! This module handles navigation persistence using libsql:
//!
//! - Database initialization and connection management
//! - The [`NavigationStore`] abstraction and its libsql implementation
//! - Tree change events consumed by the persistence layer
//!
//! # Architecture
//!
//! Storage is one flat table with one row per non-root node. The tree is
//! rebuilt in memory at startup and kept in sync afterwards through small
//! idempotent writes (see [`StoreWrite`]).

mod database;
mod error;
pub mod events;
mod libsql_store;
mod navigation_store;

pub use database::{DatabaseService, DEFAULT_BUSY_TIMEOUT_MS, NAVIGATION_TABLE};
pub use error::{DatabaseError, StoreError};
pub use events::{NavigationEvent, NavigationObserver};
pub use libsql_store::LibsqlNavigationStore;
pub use navigation_store::{NavigationRecord, NavigationStore, StoreWrite};
