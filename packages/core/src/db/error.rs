//! Errors raised while opening the navigation database and while reading or
//! writing `navigation_entities` rows.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the embedded libsql database itself
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Opening the file or a connection to it failed
    #[error("Cannot open navigation database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Schema creation or a PRAGMA failed
    #[error("Navigation schema setup failed: {0}")]
    InitializationFailed(String),

    /// The database file is not writable
    #[error("Navigation database is read-only: {path}")]
    PermissionDenied { path: PathBuf },

    /// The database directory could not be created
    #[error("Cannot create navigation database directory: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    #[error("libsql error: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// A navigation statement failed; `context` names the statement
    #[error("Navigation statement failed: {context}")]
    SqlExecutionError { context: String },
}

impl DatabaseError {
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }
}

/// Errors returned by [`NavigationStore`](crate::db::NavigationStore) implementations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying database failure
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// A stored row could not be converted
    #[error("Corrupt navigation row: {0}")]
    Corrupt(String),

    /// The operation was abandoned before it touched the store
    #[error("Store operation cancelled")]
    Cancelled,
}

impl StoreError {
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}
