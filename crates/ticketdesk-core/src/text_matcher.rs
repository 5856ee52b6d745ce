use crate::ticket::Ticket;

/// Case-insensitive substring matcher over ticket text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextMatcher {
    needle: String,
}

impl TextMatcher {
    /// Normalize a query string into a matcher. Returns `None` for blank inputs.
    #[must_use]
    pub fn new(query: &str) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            needle: trimmed.to_lowercase(),
        })
    }

    /// The normalized needle.
    #[must_use]
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Whether the title or description contains the query.
    #[must_use]
    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.matches_field(&ticket.title)
            || ticket
                .description
                .as_deref()
                .is_some_and(|description| self.matches_field(description))
    }

    /// Whether a single field contains the query.
    #[must_use]
    pub fn matches_field(&self, value: &str) -> bool {
        value.to_lowercase().contains(&self.needle)
    }
}
