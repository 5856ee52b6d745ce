use thiserror::Error;

/// Rejected user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Ticket title is empty or whitespace.
    #[error("title must not be empty")]
    EmptyTitle,
    /// Ticket title exceeds the column width.
    #[error("title must be at most {max} characters (got {len})")]
    TitleTooLong {
        /// Maximum accepted length.
        max: usize,
        /// Length of the rejected title.
        len: usize,
    },
    /// Tag name is empty or whitespace.
    #[error("tag name must not be empty")]
    EmptyTagName,
    /// Tag name exceeds the column width.
    #[error("tag name must be at most {max} characters (got {len})")]
    TagNameTooLong {
        /// Maximum accepted length.
        max: usize,
        /// Length of the rejected name.
        len: usize,
    },
    /// Tag colour is not a `#RRGGBB` hex string.
    #[error("color must look like #RRGGBB (got '{0}')")]
    InvalidColor(String),
    /// Status filter token is not one of `all`, `open`, `completed`.
    #[error("status must be one of all, open, completed (got '{0}')")]
    InvalidStatus(String),
}
