//! LibsqlNavigationStore - NavigationStore Implementation for libsql
//!
//! Wraps a [`DatabaseService`] and maps each [`StoreWrite`] to a single SQL
//! statement against the `navigation_entities` table.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mynotes_core::db::{DatabaseService, LibsqlNavigationStore, NavigationStore};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/data.db")).await?);
//!     let store: Arc<dyn NavigationStore> = Arc::new(LibsqlNavigationStore::new(db));
//!
//!     let rows = store.load_all().await?;
//!     println!("{} navigation rows", rows.len());
//!     Ok(())
//! }
//! ```

use crate::db::database::NAVIGATION_TABLE;
use crate::db::error::{DatabaseError, StoreError};
use crate::db::navigation_store::{NavigationRecord, NavigationStore, StoreWrite};
use crate::db::DatabaseService;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::Row;
use std::sync::Arc;

/// libsql-backed navigation persistence
pub struct LibsqlNavigationStore {
    db: Arc<DatabaseService>,
}

impl LibsqlNavigationStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Arc<DatabaseService> {
        &self.db
    }

    /// Parse timestamp from database - handles both SQLite and RFC3339 formats
    ///
    /// SQLite CURRENT_TIMESTAMP returns: "YYYY-MM-DD HH:MM:SS"
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        Err(StoreError::corrupt(format!(
            "Unable to parse timestamp '{}' as SQLite or RFC3339 format",
            s
        )))
    }

    /// Convert a libsql row to a record
    ///
    /// Expected columns (in order): id, title, parent, position,
    /// is_composite, modified_at (nullable).
    fn row_to_record(row: &Row) -> Result<NavigationRecord, StoreError> {
        let column = |name: &str, e: libsql::Error| {
            StoreError::corrupt(format!("Failed to read column '{}': {}", name, e))
        };

        let id: String = row.get(0).map_err(|e| column("id", e))?;
        let title: String = row.get(1).map_err(|e| column("title", e))?;
        let parent: String = row.get(2).map_err(|e| column("parent", e))?;
        let position: i64 = row.get(3).map_err(|e| column("position", e))?;
        let is_composite: i64 = row.get(4).map_err(|e| column("is_composite", e))?;
        let modified_at: Option<String> = row.get(5).map_err(|e| column("modified_at", e))?;

        let modified_at = match modified_at {
            Some(raw) => Some(Self::parse_timestamp(&raw)?),
            None => None,
        };

        Ok(NavigationRecord {
            id,
            title,
            parent,
            position,
            is_composite: is_composite != 0,
            modified_at,
        })
    }

    fn sql_error(write: &StoreWrite, e: libsql::Error) -> StoreError {
        StoreError::Database(DatabaseError::sql_execution(format!(
            "Failed to apply {} for '{}': {}",
            write.kind(),
            write.target(),
            e
        )))
    }
}

#[async_trait]
impl NavigationStore for LibsqlNavigationStore {
    async fn load_all(&self) -> Result<Vec<NavigationRecord>, StoreError> {
        let conn = self.db.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT id, title, parent, position, is_composite, modified_at FROM {}",
                NAVIGATION_TABLE
            ))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare load query: {}", e))
            })?;

        let mut rows = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute load query: {}", e))
        })?;

        let mut records = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to read row: {}", e)))?
        {
            records.push(Self::row_to_record(&row)?);
        }

        tracing::debug!("Loaded {} navigation row(s)", records.len());
        Ok(records)
    }

    async fn apply(&self, write: &StoreWrite) -> Result<u64, StoreError> {
        let conn = self.db.connect_with_timeout().await?;

        let affected = match write {
            StoreWrite::Upsert {
                id,
                title,
                parent,
                position,
                is_composite,
            } => conn
                .execute(
                    &format!(
                        "INSERT INTO {} (id, title, parent, position, is_composite, modified_at)
                         VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
                         ON CONFLICT(id) DO UPDATE SET
                            title = excluded.title,
                            parent = excluded.parent,
                            position = excluded.position,
                            is_composite = excluded.is_composite,
                            modified_at = CURRENT_TIMESTAMP",
                        NAVIGATION_TABLE
                    ),
                    (
                        id.to_string(),
                        title.as_str(),
                        parent.to_string(),
                        *position,
                        *is_composite as i64,
                    ),
                )
                .await
                .map_err(|e| Self::sql_error(write, e))?,

            StoreWrite::UpdateTitle { id, title } => conn
                .execute(
                    &format!(
                        "UPDATE {} SET title = ?, modified_at = CURRENT_TIMESTAMP WHERE id = ?",
                        NAVIGATION_TABLE
                    ),
                    (title.as_str(), id.to_string()),
                )
                .await
                .map_err(|e| Self::sql_error(write, e))?,

            StoreWrite::UpdatePosition { id, position } => conn
                .execute(
                    &format!(
                        "UPDATE {} SET position = ?, modified_at = CURRENT_TIMESTAMP WHERE id = ?",
                        NAVIGATION_TABLE
                    ),
                    (*position, id.to_string()),
                )
                .await
                .map_err(|e| Self::sql_error(write, e))?,

            StoreWrite::UpdateParent {
                id,
                parent,
                position,
            } => conn
                .execute(
                    &format!(
                        "UPDATE {} SET parent = ?, position = ?, modified_at = CURRENT_TIMESTAMP
                         WHERE id = ?",
                        NAVIGATION_TABLE
                    ),
                    (parent.to_string(), *position, id.to_string()),
                )
                .await
                .map_err(|e| Self::sql_error(write, e))?,

            // UNION (not UNION ALL) stops on cyclic parent chains
            StoreWrite::DeleteSubtree { id } => conn
                .execute(
                    &format!(
                        "WITH RECURSIVE subtree(id) AS (
                            SELECT ?
                            UNION
                            SELECT n.id FROM {table} n JOIN subtree s ON n.parent = s.id
                         )
                         DELETE FROM {table} WHERE id IN (SELECT id FROM subtree)",
                        table = NAVIGATION_TABLE
                    ),
                    [id.to_string()],
                )
                .await
                .map_err(|e| Self::sql_error(write, e))?,
        };

        tracing::debug!(
            "Applied {} for '{}' ({} row(s))",
            write.kind(),
            write.target(),
            affected
        );
        Ok(affected)
    }
}
