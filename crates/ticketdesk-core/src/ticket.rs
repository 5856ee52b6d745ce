use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ValidationError;
use crate::id::{TagId, TicketId};

/// Maximum ticket title length in characters.
pub const TITLE_MAX_LEN: usize = 200;

/// Tag as embedded in a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    /// Tag identifier.
    pub id: TagId,
    /// Display name.
    pub name: String,
    /// Optional `#RRGGBB` colour.
    pub color: Option<String>,
}

/// Ticket with its tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Ticket identifier.
    pub id: TicketId,
    /// Short title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Completion flag.
    pub is_completed: bool,
    /// Creation time in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Time of the most recent write in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Attached tags, ordered by name.
    #[serde(default)]
    pub tags: Vec<TagRef>,
}

impl Ticket {
    /// Whether the ticket carries the given tag.
    #[must_use]
    pub fn has_tag(&self, tag: TagId) -> bool {
        self.tags.iter().any(|t| t.id == tag)
    }
}

/// Listing order: most recently updated first, newer ids first on ties.
#[must_use]
pub fn compare_recent_first(a: &Ticket, b: &Ticket) -> Ordering {
    b.updated_at.cmp(&a.updated_at).then_with(|| b.id.cmp(&a.id))
}

/// Input for creating a ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    /// Title (trimmed on validation).
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tags to attach; unknown ids are ignored.
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
}

impl NewTicket {
    /// Build a request with just a title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Validate and normalize the request.
    ///
    /// # Errors
    /// Returns an error if the title is blank or too long.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.title = validate_title(&self.title)?;
        Ok(self)
    }
}

/// Partial update of a ticket; `None` fields stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketUpdate {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New completion flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl TicketUpdate {
    /// Update that only sets the completion flag.
    #[must_use]
    pub const fn completion(is_completed: bool) -> Self {
        Self {
            title: None,
            description: None,
            is_completed: Some(is_completed),
        }
    }

    /// True when no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.is_completed.is_none()
    }

    /// Validate and normalize the update.
    ///
    /// # Errors
    /// Returns an error if a provided title is blank or too long.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if let Some(title) = self.title.as_deref() {
            self.title = Some(validate_title(title)?);
        }
        Ok(self)
    }
}

fn validate_title(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let len = trimmed.chars().count();
    if len > TITLE_MAX_LEN {
        return Err(ValidationError::TitleTooLong {
            max: TITLE_MAX_LEN,
            len,
        });
    }
    Ok(trimmed.to_owned())
}
