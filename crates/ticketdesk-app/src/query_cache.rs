//! Client-side cache of query results keyed by what was asked for.

use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use ticketdesk_core::{Tag, TagId, TagWithCount, Ticket, TicketId, TicketQuery};
use tokio::time::Instant;

/// Identity of a cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// A filtered ticket list.
    TicketList(TicketQuery),
    /// A single ticket.
    Ticket(TicketId),
    /// The tag list, optionally searched.
    TagList(Option<String>),
    /// A single tag.
    Tag(TagId),
}

/// Prefix used to invalidate groups of keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope {
    /// Every ticket list and single-ticket key.
    AllTickets,
    /// One single-ticket key.
    Ticket(TicketId),
    /// Every tag list and single-tag key.
    AllTags,
    /// One single-tag key.
    Tag(TagId),
}

impl QueryScope {
    /// Scopes invalidated after any mutation. Tag counts derive from tickets,
    /// and tickets embed tags, so both families go stale together.
    pub const AFTER_MUTATION: [Self; 2] = [Self::AllTickets, Self::AllTags];

    /// Whether `key` falls under this scope.
    #[must_use]
    pub fn covers(self, key: &QueryKey) -> bool {
        match (self, key) {
            (Self::AllTickets, QueryKey::TicketList(_) | QueryKey::Ticket(_))
            | (Self::AllTags, QueryKey::TagList(_) | QueryKey::Tag(_)) => true,
            (Self::Ticket(id), QueryKey::Ticket(other)) => id == *other,
            (Self::Tag(id), QueryKey::Tag(other)) => id == *other,
            _ => false,
        }
    }
}

/// Cached query result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryData {
    /// Result of a ticket list query.
    Tickets(Vec<Ticket>),
    /// Result of a single-ticket query.
    Ticket(Ticket),
    /// Result of a tag list query.
    Tags(Vec<TagWithCount>),
    /// Result of a single-tag query.
    Tag(Tag),
}

#[derive(Debug)]
struct Entry {
    data: QueryData,
    fetched_at: Instant,
    invalidated: bool,
}

/// LRU-bounded query cache with staleness tracking.
///
/// An entry is fresh until it is invalidated or older than the stale time.
/// Stale entries are kept so callers can still show the last known data
/// while a refetch is in flight.
#[derive(Debug)]
pub struct QueryCache {
    entries: LruCache<QueryKey, Entry>,
    stale_time: Duration,
}

impl QueryCache {
    /// Create a cache holding at most `capacity` queries.
    #[must_use]
    pub fn new(capacity: NonZeroUsize, stale_time: Duration) -> Self {
        Self {
            entries: LruCache::new(capacity),
            stale_time,
        }
    }

    /// Fresh data for `key`, if any.
    pub fn get(&mut self, key: &QueryKey) -> Option<&QueryData> {
        let stale_time = self.stale_time;
        self.entries
            .get(key)
            .filter(|entry| !entry.invalidated && entry.fetched_at.elapsed() < stale_time)
            .map(|entry| &entry.data)
    }

    /// Last known data for `key`, fresh or not.
    #[must_use]
    pub fn peek(&self, key: &QueryKey) -> Option<&QueryData> {
        self.entries.peek(key).map(|entry| &entry.data)
    }

    /// Whether `key` is cached but no longer fresh.
    #[must_use]
    pub fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        self.entries
            .peek(key)
            .map(|entry| entry.invalidated || entry.fetched_at.elapsed() >= self.stale_time)
    }

    /// Store freshly fetched data.
    pub fn insert(&mut self, key: QueryKey, data: QueryData) {
        self.entries.put(
            key,
            Entry {
                data,
                fetched_at: Instant::now(),
                invalidated: false,
            },
        );
    }

    /// Mark every key under `scope` stale. Returns how many entries were marked.
    pub fn invalidate(&mut self, scope: QueryScope) -> usize {
        let mut marked = 0;
        for (key, entry) in &mut self.entries {
            if scope.covers(key) && !entry.invalidated {
                entry.invalidated = true;
                marked += 1;
            }
        }
        marked
    }

    /// Mark every ticket and tag key stale.
    pub fn invalidate_after_mutation(&mut self) -> usize {
        QueryScope::AFTER_MUTATION
            .into_iter()
            .map(|scope| self.invalidate(scope))
            .sum()
    }

    /// Number of cached queries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
