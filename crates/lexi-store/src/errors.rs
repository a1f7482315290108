//! Error types for the persistence layer.
//!
//! [`StoreError`] is returned by every store operation. Lookup misses are
//! not errors: `get_*` methods return `Ok(None)`. The `*NotFound` variants
//! cover writes that reference a missing parent or target row.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON serialization/deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// A write referenced a course that does not exist.
    #[error("course not found: {0}")]
    CourseNotFound(String),

    /// A write referenced a book that does not exist.
    #[error("book not found: {0}")]
    BookNotFound(String),

    /// A write referenced a unit that does not exist.
    #[error("unit not found: {0}")]
    UnitNotFound(String),

    /// A stored row failed to decode into its domain type.
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;
