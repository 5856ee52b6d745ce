//! Client-side contract for the ticket REST API.

use thiserror::Error;
use ticketdesk_core::wire::HealthResponse;
use ticketdesk_core::{
    BatchOutcome, NewTag, NewTicket, Tag, TagId, TagUpdate, TagWithCount, Ticket, TicketId, TicketQuery,
    TicketUpdate,
};

/// Transport-level classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The server answered with a non-success status.
    Status(u16),
    /// No response was received.
    Network,
    /// The request exceeded the configured timeout.
    Timeout,
    /// The response body could not be decoded.
    Decode,
}

/// Error presented to the user after a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{title}: {message}")]
pub struct ApiError {
    /// Classification used for retry decisions.
    pub kind: ApiErrorKind,
    /// Short heading such as `Not Found`.
    pub title: String,
    /// Message suitable for display.
    pub message: String,
}

/// Result alias for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

const DEFAULT_MESSAGE: &str = "An unexpected error occurred";

impl ApiError {
    /// Build from an HTTP status and the server's `detail`, if any.
    ///
    /// Some statuses replace the server's message with a fixed one.
    #[must_use]
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        let message = detail.unwrap_or_else(|| DEFAULT_MESSAGE.to_owned());
        let (title, message) = match status {
            400 => ("Bad Request".to_owned(), message),
            401 => ("Unauthorized".to_owned(), "Please log in to continue".to_owned()),
            403 => (
                "Forbidden".to_owned(),
                "You do not have permission to perform this action".to_owned(),
            ),
            404 => (
                "Not Found".to_owned(),
                "The requested resource was not found".to_owned(),
            ),
            409 => ("Conflict".to_owned(), message),
            422 => ("Validation Error".to_owned(), message),
            429 => (
                "Too Many Requests".to_owned(),
                "Please slow down and try again later".to_owned(),
            ),
            500 => (
                "Server Error".to_owned(),
                "An internal server error occurred. Please try again later.".to_owned(),
            ),
            503 => (
                "Service Unavailable".to_owned(),
                "The service is temporarily unavailable. Please try again later.".to_owned(),
            ),
            other => (format!("Error {other}"), message),
        };
        Self {
            kind: ApiErrorKind::Status(status),
            title,
            message,
        }
    }

    /// No response was received.
    #[must_use]
    pub fn network() -> Self {
        Self {
            kind: ApiErrorKind::Network,
            title: "Network Error".to_owned(),
            message: "Unable to connect to the server. Please check your internet connection.".to_owned(),
        }
    }

    /// The request timed out.
    #[must_use]
    pub fn timeout() -> Self {
        Self {
            kind: ApiErrorKind::Timeout,
            title: "Request Timeout".to_owned(),
            message: "The request took too long. Please try again.".to_owned(),
        }
    }

    /// The response could not be decoded.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Decode,
            title: "Error".to_owned(),
            message: message.into(),
        }
    }

    /// HTTP status, when the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self.kind {
            ApiErrorKind::Status(status) => Some(status),
            _ => None,
        }
    }

    /// Whether repeating the request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self.kind {
            ApiErrorKind::Network | ApiErrorKind::Timeout => true,
            ApiErrorKind::Status(status) => status == 429 || status >= 500,
            ApiErrorKind::Decode => false,
        }
    }
}

/// Every operation the ticket backend exposes.
///
/// Implemented over HTTP by [`crate::http_client::HttpTicketClient`] and
/// in-process by [`crate::local::LocalTicketApi`].
#[allow(async_fn_in_trait)]
pub trait TicketApi {
    /// `GET /health`.
    async fn health(&self) -> ApiResult<HealthResponse>;
    /// `GET /api/tickets`.
    async fn list_tickets(&self, query: &TicketQuery) -> ApiResult<Vec<Ticket>>;
    /// `GET /api/tickets/{id}`.
    async fn get_ticket(&self, id: TicketId) -> ApiResult<Ticket>;
    /// `POST /api/tickets`.
    async fn create_ticket(&self, new: &NewTicket) -> ApiResult<Ticket>;
    /// `PUT /api/tickets/{id}`.
    async fn update_ticket(&self, id: TicketId, update: &TicketUpdate) -> ApiResult<Ticket>;
    /// `DELETE /api/tickets/{id}`.
    async fn delete_ticket(&self, id: TicketId) -> ApiResult<()>;
    /// `PATCH /api/tickets/{id}/complete`.
    async fn toggle_ticket(&self, id: TicketId) -> ApiResult<Ticket>;
    /// `POST /api/tickets/{id}/tags`.
    async fn add_tags(&self, id: TicketId, tags: &[TagId]) -> ApiResult<Ticket>;
    /// `DELETE /api/tickets/{id}/tags/{tag_id}`.
    async fn remove_tag(&self, id: TicketId, tag: TagId) -> ApiResult<Ticket>;
    /// `POST /api/tickets/batch/status`.
    async fn batch_update_status(&self, ids: &[TicketId], is_completed: bool) -> ApiResult<BatchOutcome>;
    /// `POST /api/tickets/batch/delete`.
    async fn batch_delete(&self, ids: &[TicketId]) -> ApiResult<BatchOutcome>;
    /// `GET /api/tags`.
    async fn list_tags(&self, search: Option<&str>) -> ApiResult<Vec<TagWithCount>>;
    /// `GET /api/tags/{id}`.
    async fn get_tag(&self, id: TagId) -> ApiResult<Tag>;
    /// `POST /api/tags`.
    async fn create_tag(&self, new: &NewTag) -> ApiResult<Tag>;
    /// `PUT /api/tags/{id}`.
    async fn update_tag(&self, id: TagId, update: &TagUpdate) -> ApiResult<Tag>;
    /// `DELETE /api/tags/{id}`.
    async fn delete_tag(&self, id: TagId) -> ApiResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(400, "Bad Request", "Tag 'bug' already exists")]
    #[case(401, "Unauthorized", "Please log in to continue")]
    #[case(403, "Forbidden", "You do not have permission to perform this action")]
    #[case(404, "Not Found", "The requested resource was not found")]
    #[case(409, "Conflict", "Tag 'bug' already exists")]
    #[case(422, "Validation Error", "Tag 'bug' already exists")]
    #[case(429, "Too Many Requests", "Please slow down and try again later")]
    #[case(500, "Server Error", "An internal server error occurred. Please try again later.")]
    #[case(
        503,
        "Service Unavailable",
        "The service is temporarily unavailable. Please try again later."
    )]
    #[case(418, "Error 418", "Tag 'bug' already exists")]
    fn titles_and_messages_by_status(#[case] status: u16, #[case] title: &str, #[case] message: &str) {
        let err = ApiError::from_status(status, Some("Tag 'bug' already exists".into()));
        assert_eq!(err.title, title);
        assert_eq!(err.message, message);
        assert_eq!(err.status(), Some(status));
    }

    #[test]
    fn missing_detail_uses_generic_message() {
        let err = ApiError::from_status(400, None);
        assert_eq!(err.message, "An unexpected error occurred");
    }

    #[rstest]
    #[case(ApiError::network(), true)]
    #[case(ApiError::timeout(), true)]
    #[case(ApiError::from_status(500, None), true)]
    #[case(ApiError::from_status(502, None), true)]
    #[case(ApiError::from_status(429, None), true)]
    #[case(ApiError::from_status(404, None), false)]
    #[case(ApiError::from_status(422, None), false)]
    #[case(ApiError::decode("bad json"), false)]
    fn retryable_errors(#[case] err: ApiError, #[case] retryable: bool) {
        assert_eq!(err.is_retryable(), retryable);
    }
}
