//! Domain types, filters and selection state for ticketdesk.

/// Batch actions and their outcomes.
pub mod batch;
/// Validation failures for user-supplied input.
pub mod error;
/// Ticket list filters.
pub mod filter;
/// Identifier types.
pub mod id;
/// Client-side ticket selection.
pub mod selection;
/// Tag records and inputs.
pub mod tag;
/// Case-insensitive text search.
pub mod text_matcher;
/// Ticket records and inputs.
pub mod ticket;
/// Request and response envelopes shared by the server and its clients.
pub mod wire;

pub use batch::{BatchAction, BatchOutcome};
pub use error::ValidationError;
pub use filter::{StatusFilter, TagToken, TicketFilter, TicketQuery, parse_tag_tokens};
pub use id::{TagId, TicketId};
pub use selection::Selection;
pub use tag::{NewTag, Tag, TagUpdate, TagWithCount};
pub use text_matcher::TextMatcher;
pub use ticket::{NewTicket, TagRef, Ticket, TicketUpdate, compare_recent_first};
