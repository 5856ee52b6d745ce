use std::collections::BTreeSet;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::TagId;
use crate::text_matcher::TextMatcher;
use crate::ticket::Ticket;

/// Completion status filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    /// Every ticket.
    #[default]
    All,
    /// Tickets that are not completed.
    Open,
    /// Completed tickets.
    Completed,
}

impl StatusFilter {
    /// Query-string token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Open => "open",
            Self::Completed => "completed",
        }
    }

    /// Whether a ticket with the given completion flag passes.
    #[must_use]
    pub const fn accepts(self, is_completed: bool) -> bool {
        match self {
            Self::All => true,
            Self::Open => !is_completed,
            Self::Completed => is_completed,
        }
    }
}

impl Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "open" => Ok(Self::Open),
            "completed" => Ok(Self::Completed),
            _ => Err(ValidationError::InvalidStatus(s.to_owned())),
        }
    }
}

/// A tag reference in a list filter: either an id or a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagToken {
    /// Numeric tag id.
    Id(TagId),
    /// Tag name, matched ignoring case.
    Name(String),
}

impl Display for TagToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => id.fmt(f),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Split a comma-separated tag list such as `"1,bug, ios"`.
///
/// All-digit pieces become ids, anything else a name; empty pieces are skipped.
#[must_use]
pub fn parse_tag_tokens(raw: &str) -> Vec<TagToken> {
    raw.split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(|piece| {
            if piece.bytes().all(|b| b.is_ascii_digit()) {
                piece
                    .parse()
                    .map_or_else(|_| TagToken::Name(piece.to_owned()), |id| TagToken::Id(TagId(id)))
            } else {
                TagToken::Name(piece.to_owned())
            }
        })
        .collect()
}

/// User-facing ticket list filter. Also serves as the list cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TicketQuery {
    /// Free-text search, `None` when blank.
    pub search: Option<String>,
    /// Tag tokens, matched with OR.
    pub tags: Vec<TagToken>,
    /// Completion status.
    pub status: StatusFilter,
}

impl TicketQuery {
    /// Create an unfiltered query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search text; whitespace-only inputs become `None`.
    #[must_use]
    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search.and_then(|raw| {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        });
        self
    }

    /// Replace the tag tokens.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<TagToken>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the status filter.
    #[must_use]
    pub const fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    /// Whether the query filters nothing.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.search.is_none() && self.tags.is_empty() && self.status == StatusFilter::All
    }

    /// Render as URL query parameters, omitting defaults.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if !self.tags.is_empty() {
            let joined = self
                .tags
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("tags", joined));
        }
        if self.status != StatusFilter::All {
            pairs.push(("status", self.status.as_str().to_owned()));
        }
        pairs
    }
}

/// Ticket filter with tag tokens resolved to ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    /// Text matcher over title and description.
    pub text: Option<TextMatcher>,
    /// Accepted tag ids (any of). `None` disables tag filtering.
    pub tags: Option<BTreeSet<TagId>>,
    /// Completion status.
    pub status: StatusFilter,
}

impl TicketFilter {
    /// Build from a query whose tag tokens resolved to `tags`.
    ///
    /// Pass `None` when the query carried no tag tokens.
    #[must_use]
    pub fn from_query(query: &TicketQuery, tags: Option<BTreeSet<TagId>>) -> Self {
        Self {
            text: query.search.as_deref().and_then(TextMatcher::new),
            tags,
            status: query.status,
        }
    }

    /// Whether the ticket passes every clause.
    #[must_use]
    pub fn matches(&self, ticket: &Ticket) -> bool {
        if !self.status.accepts(ticket.is_completed) {
            return false;
        }
        if let Some(text) = &self.text
            && !text.matches(ticket)
        {
            return false;
        }
        match &self.tags {
            None => true,
            Some(wanted) => ticket.tags.iter().any(|tag| wanted.contains(&tag.id)),
        }
    }
}
