use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Mutation applied to every selected ticket in one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchAction {
    /// Set `is_completed = true`.
    MarkComplete,
    /// Set `is_completed = false`.
    MarkIncomplete,
    /// Delete the tickets.
    Delete,
}

impl BatchAction {
    /// Target completion flag for status updates, `None` for deletes.
    #[must_use]
    pub const fn completion(self) -> Option<bool> {
        match self {
            Self::MarkComplete => Some(true),
            Self::MarkIncomplete => Some(false),
            Self::Delete => None,
        }
    }
}

impl Display for BatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MarkComplete => "mark complete",
            Self::MarkIncomplete => "mark incomplete",
            Self::Delete => "delete",
        })
    }
}

/// Result of a batch mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    /// Whether the request was applied.
    pub success: bool,
    /// Number of existing tickets that were affected.
    pub affected_count: u64,
    /// Human-readable summary.
    pub message: String,
}

impl BatchOutcome {
    /// Outcome of a status update.
    #[must_use]
    pub fn status_updated(affected_count: u64, is_completed: bool) -> Self {
        let status = if is_completed { "completed" } else { "open" };
        Self {
            success: true,
            affected_count,
            message: format!("Successfully updated {affected_count} ticket(s) to {status}"),
        }
    }

    /// Outcome of a delete.
    #[must_use]
    pub fn deleted(affected_count: u64) -> Self {
        Self {
            success: true,
            affected_count,
            message: format!("Successfully deleted {affected_count} ticket(s)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            BatchOutcome::status_updated(3, true).message,
            "Successfully updated 3 ticket(s) to completed"
        );
        assert_eq!(
            BatchOutcome::status_updated(1, false).message,
            "Successfully updated 1 ticket(s) to open"
        );
        assert_eq!(BatchOutcome::deleted(0).message, "Successfully deleted 0 ticket(s)");
    }

    #[test]
    fn outcome_wire_shape() {
        let json = serde_json::to_value(BatchOutcome::deleted(2))
            .unwrap_or_else(|err| panic!("serialize outcome: {err}"));
        assert_eq!(json["affectedCount"], 2);
        assert_eq!(json["success"], true);
    }
}
