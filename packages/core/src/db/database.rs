//! Navigation database handle
//!
//! Wraps a local libsql file holding the `navigation_entities` table. Opening
//! is idempotent: the directory, table and parent index are created when
//! missing, and the journal is switched to WAL. There are no foreign keys,
//! since rows with a dangling parent must stay loadable for repair.
//!
//! Async callers take connections through `connect_with_timeout()`, which
//! sets `busy_timeout` so a locked file is retried instead of failing with
//! `SQLITE_BUSY`.
//!
//! ```no_run
//! # use mynotes_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = DatabaseService::open(PathBuf::from("./data/data.db"), 2000).await?;
//! let conn = db.connect_with_timeout().await?;
//! # drop(conn);
//! db.close().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Default busy timeout applied to every async connection
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Name of the table holding one row per non-root navigation node
pub const NAVIGATION_TABLE: &str = "navigation_entities";

/// Shared handle to the navigation database file
#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub db: Arc<Database>,
    pub db_path: PathBuf,

    busy_timeout_ms: u64,
}

impl DatabaseService {
    /// Open (or create) the database with the default busy timeout
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        Self::open(db_path, DEFAULT_BUSY_TIMEOUT_MS).await
    }

    /// Open (or create) the database at `db_path`, creating missing parent
    /// directories and the navigation schema
    pub async fn open(db_path: PathBuf, busy_timeout_ms: u64) -> Result<Self, DatabaseError> {
        // Only new files need the post-schema checkpoint
        let is_new_database = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
            busy_timeout_ms,
        };

        service.initialize_schema(is_new_database).await?;
        tracing::info!(
            "Navigation database ready at {} (new: {})",
            service.db_path.display(),
            is_new_database
        );

        Ok(service)
    }

    pub fn busy_timeout_ms(&self) -> u64 {
        self.busy_timeout_ms
    }

    // PRAGMAs return rows, so they run through query()
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Create the navigation table and its index
    ///
    /// # Schema
    ///
    /// - `navigation_entities`: `(id, title, parent, position, is_composite, modified_at)`
    /// - `idx_navigation_parent`: children lookups
    async fn initialize_schema(&self, is_new_database: bool) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    parent TEXT NOT NULL,
                    position INTEGER NOT NULL,
                    is_composite INTEGER NOT NULL,
                    modified_at DATETIME DEFAULT CURRENT_TIMESTAMP
                )",
                NAVIGATION_TABLE
            ),
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create {} table: {}",
                NAVIGATION_TABLE, e
            ))
        })?;

        conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_navigation_parent ON {}(parent)",
                NAVIGATION_TABLE
            ),
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create index 'idx_navigation_parent': {}",
                e
            ))
        })?;

        // Flush the schema of a fresh file so a quick reopen sees the table
        if is_new_database {
            self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
                .await?;
        }

        Ok(())
    }

    /// Get a synchronous connection
    ///
    /// Only for single-threaded code that does not hold the connection
    /// across await points. Prefer [`connect_with_timeout`](Self::connect_with_timeout).
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get an async connection with the busy timeout configured
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;
        self.execute_pragma(&conn, &format!("PRAGMA busy_timeout = {}", self.busy_timeout_ms))
            .await?;
        Ok(conn)
    }

    /// Checkpoint the WAL so every write is in the main database file
    pub async fn close(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
            .await?;
        tracing::debug!("Navigation database checkpointed");
        Ok(())
    }
}
