use serde::{Deserialize, Serialize};

use crate::id::{TagId, TicketId};
use crate::tag::TagWithCount;
use crate::ticket::Ticket;

/// Body of `POST /api/tickets/batch/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateStatusRequest {
    /// Tickets to update.
    pub ticket_ids: Vec<TicketId>,
    /// Target completion flag.
    pub is_completed: bool,
}

/// Body of `POST /api/tickets/batch/delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteRequest {
    /// Tickets to delete.
    pub ticket_ids: Vec<TicketId>,
}

/// Body of `POST /api/tickets/{id}/tags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTagsRequest {
    /// Tags to attach.
    pub tag_ids: Vec<TagId>,
}

/// Ticket list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketsListResponse {
    /// Matching tickets, most recently updated first.
    pub tickets: Vec<Ticket>,
    /// Number of tickets returned.
    pub total: u64,
}

impl From<Vec<Ticket>> for TicketsListResponse {
    fn from(tickets: Vec<Ticket>) -> Self {
        let total = tickets.len() as u64;
        Self { tickets, total }
    }
}

/// Tag list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagsListResponse {
    /// Tags ordered by name.
    pub tags: Vec<TagWithCount>,
}

/// Error body returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Message suitable for display.
    pub detail: String,
}

/// `GET /health` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `healthy` when served.
    pub status: String,
}

/// `GET /` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootResponse {
    /// Service name.
    pub message: String,
    /// Always `running` when served.
    pub status: String,
}
