//! Service-level errors and their HTTP status mapping.

use thiserror::Error;
use ticketdesk_core::{TagId, TicketId, ValidationError};

/// Message returned to clients in place of internal error details.
pub const INTERNAL_ERROR_DETAIL: &str = "Internal server error";

/// Errors surfaced by [`crate::service::TicketService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Target ticket does not exist.
    #[error("Ticket not found")]
    TicketNotFound(TicketId),
    /// Target tag does not exist.
    #[error("Tag not found")]
    TagNotFound(TagId),
    /// Another tag already uses the name (ignoring case).
    #[error("Tag '{0}' already exists")]
    DuplicateTag(String),
    /// A batch request carried no ids.
    #[error("No ticket IDs provided")]
    EmptyBatch,
    /// Backing store returned an error.
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
    /// The blocking worker running the operation panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Worker(String),
}

/// Result alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 422,
            Self::TicketNotFound(_) | Self::TagNotFound(_) => 404,
            Self::DuplicateTag(_) | Self::EmptyBatch => 400,
            Self::Store(_) | Self::Worker(_) => 500,
        }
    }

    /// Whether the error is an internal failure whose details must not reach clients.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }

    /// Client-facing message; internal details are masked.
    #[must_use]
    pub fn detail(&self) -> String {
        if self.is_internal() {
            INTERNAL_ERROR_DETAIL.to_owned()
        } else {
            self.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ServiceError::from(ValidationError::EmptyTitle).status_code(), 422);
        assert_eq!(
            ServiceError::from(ValidationError::InvalidStatus("x".into())).status_code(),
            422
        );
        assert_eq!(ServiceError::TicketNotFound(TicketId(1)).status_code(), 404);
        assert_eq!(ServiceError::TagNotFound(TagId(1)).status_code(), 404);
        assert_eq!(ServiceError::DuplicateTag("bug".into()).status_code(), 400);
        assert_eq!(ServiceError::EmptyBatch.status_code(), 400);
        assert_eq!(ServiceError::Store(anyhow::anyhow!("disk full")).status_code(), 500);
    }

    #[test]
    fn internal_details_are_masked() {
        let err = ServiceError::Store(anyhow::anyhow!("database is locked"));
        assert_eq!(err.detail(), INTERNAL_ERROR_DETAIL);
        assert_eq!(
            ServiceError::DuplicateTag("bug".into()).detail(),
            "Tag 'bug' already exists"
        );
        assert_eq!(ServiceError::EmptyBatch.detail(), "No ticket IDs provided");
    }
}
