//! Error types for the SQLite store.

use thiserror::Error;

/// Errors that can occur during `SqliteStore` operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite reported an error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// Another tag already uses this name, ignoring case.
    #[error("Tag name already in use: {0}")]
    DuplicateTagName(String),

    /// A stored timestamp is outside the supported range.
    #[error("Invalid stored timestamp: {0}")]
    Timestamp(i64),

    /// The current time cannot be represented in the timestamp column.
    #[error("Clock out of range")]
    ClockOutOfRange,

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether this error reports a tag name collision.
    #[must_use]
    pub const fn is_duplicate_tag_name(&self) -> bool {
        matches!(self, Self::DuplicateTagName(_))
    }

    pub(crate) fn from_tag_write(err: rusqlite::Error, name: &str) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(failure, _) if failure.code == rusqlite::ErrorCode::ConstraintViolation => {
                Self::DuplicateTagName(name.to_owned())
            }
            other => Self::Sql(other),
        }
    }
}
