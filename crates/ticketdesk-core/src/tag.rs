use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ValidationError;
use crate::id::TagId;
use crate::ticket::TagRef;

/// Maximum tag name length in characters.
pub const TAG_NAME_MAX_LEN: usize = 50;

/// Stored tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Tag identifier.
    pub id: TagId,
    /// Display name, unique ignoring case.
    pub name: String,
    /// Optional `#RRGGBB` colour.
    pub color: Option<String>,
    /// Creation time in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&Tag> for TagRef {
    fn from(tag: &Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name.clone(),
            color: tag.color.clone(),
        }
    }
}

/// Tag together with the number of tickets carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagWithCount {
    /// Tag identifier.
    pub id: TagId,
    /// Display name.
    pub name: String,
    /// Optional colour.
    pub color: Option<String>,
    /// Number of tickets tagged with this tag.
    pub ticket_count: u64,
}

/// Input for creating a tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTag {
    /// Name (trimmed on validation).
    pub name: String,
    /// Optional colour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl NewTag {
    /// Build a request with a name and no colour.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
        }
    }

    /// Validate and normalize the request.
    ///
    /// # Errors
    /// Returns an error if the name is blank or too long, or the colour is malformed.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.name = validate_name(&self.name)?;
        if let Some(color) = self.color.as_deref() {
            validate_color(color)?;
        }
        Ok(self)
    }
}

/// Partial update of a tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUpdate {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New colour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl TagUpdate {
    /// Validate and normalize the update.
    ///
    /// # Errors
    /// Returns an error if a provided name or colour is invalid.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if let Some(name) = self.name.as_deref() {
            self.name = Some(validate_name(name)?);
        }
        if let Some(color) = self.color.as_deref() {
            validate_color(color)?;
        }
        Ok(self)
    }
}

fn validate_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTagName);
    }
    let len = trimmed.chars().count();
    if len > TAG_NAME_MAX_LEN {
        return Err(ValidationError::TagNameTooLong {
            max: TAG_NAME_MAX_LEN,
            len,
        });
    }
    Ok(trimmed.to_owned())
}

/// Check that `color` is a `#RRGGBB` hex string.
///
/// # Errors
/// Returns [`ValidationError::InvalidColor`] otherwise.
pub fn validate_color(color: &str) -> Result<(), ValidationError> {
    let valid = color
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidColor(color.to_owned()))
    }
}
