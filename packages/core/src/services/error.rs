//! Service Layer Error Types

use crate::db::StoreError;
use crate::operations::TreeOperationError;
use thiserror::Error;

/// Errors raised while rebuilding the tree from storage
///
/// Inconsistent rows are repaired rather than reported here; these errors
/// mean the load itself could not complete.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Reading rows from the store failed
    #[error("Failed to read navigation rows: {0}")]
    Store(#[from] StoreError),

    /// The rows could not be linked into a tree
    #[error("Failed to rebuild navigation tree: {0}")]
    Tree(#[from] TreeOperationError),
}
