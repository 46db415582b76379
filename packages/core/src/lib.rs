//! MyNotes Navigation Core
//!
//! This crate provides the navigation hierarchy behind the MyNotes sidebar:
//! an in-memory tree of groups and lists, integer sibling ordering with
//! bounded renumbering, and asynchronous persistence to an embedded database.
//!
//! # Architecture
//!
//! - **In-memory tree is authoritative**: every mutation applies to memory
//!   first and is persisted afterwards through an event observer
//! - **Serialized writes**: one background worker applies store writes in
//!   the order the tree changed
//! - **libsql**: Embedded SQLite-compatible database
//! - **Self-repairing load**: dangling parents and duplicate positions are
//!   fixed and written back at startup
//!
//! # Modules
//!
//! - [`models`] - Identifiers, nodes and the navigation tree
//! - [`operations`] - Sibling ordering and the write queue
//! - [`db`] - Database layer with libsql integration
//! - [`services`] - Load and synchronization between tree and store
//! - [`config`] - Database location and connection settings

pub mod config;
pub mod db;
pub mod models;
pub mod operations;
pub mod services;

// Re-export commonly used types
pub use config::NavigationConfig;
pub use models::*;
pub use services::{LoadReport, PersistenceSync, SyncError};
