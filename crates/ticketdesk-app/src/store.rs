//! Storage abstraction consumed by [`crate::service::TicketService`].

use std::collections::BTreeSet;

use anyhow::Error;
use ticketdesk_core::{NewTag, NewTicket, Tag, TagId, TagToken, TagUpdate, TagWithCount, Ticket, TicketId, TicketUpdate};
use ticketdesk_store_sqlite::{SqliteStore, StoreError};

/// Minimal storage contract required by the service layer.
///
/// Inputs are already validated. Lookups that miss return `None` or `false`
/// instead of an error so the service decides how to report them.
pub trait TicketStore {
    /// Error type bubbled up from the backing store.
    type Error: Into<Error>;

    /// Every ticket, most recently updated first.
    ///
    /// # Errors
    /// Returns a store-specific error when listing fails.
    fn list_tickets(&self) -> Result<Vec<Ticket>, Self::Error>;

    /// Load a single ticket.
    ///
    /// # Errors
    /// Returns a store-specific error when the read fails.
    fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, Self::Error>;

    /// Persist a new ticket.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    fn insert_ticket(&self, new: &NewTicket) -> Result<Ticket, Self::Error>;

    /// Apply a partial update.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    fn update_ticket(&self, id: TicketId, update: &TicketUpdate) -> Result<Option<Ticket>, Self::Error>;

    /// Flip the completion flag.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    fn toggle_ticket(&self, id: TicketId) -> Result<Option<Ticket>, Self::Error>;

    /// Delete a ticket.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    fn delete_ticket(&self, id: TicketId) -> Result<bool, Self::Error>;

    /// Attach tags to a ticket.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    fn add_tags(&self, id: TicketId, tags: &[TagId]) -> Result<Option<Ticket>, Self::Error>;

    /// Detach a tag from a ticket.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    fn remove_tag(&self, id: TicketId, tag: TagId) -> Result<Option<Ticket>, Self::Error>;

    /// Set the completion flag on many tickets atomically; returns how many existed.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    fn set_completed(&self, ids: &[TicketId], is_completed: bool) -> Result<u64, Self::Error>;

    /// Delete many tickets atomically; returns how many existed.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    fn delete_tickets(&self, ids: &[TicketId]) -> Result<u64, Self::Error>;

    /// Tags with ticket counts ordered by name.
    ///
    /// # Errors
    /// Returns a store-specific error when listing fails.
    fn list_tags(&self, search: Option<&str>) -> Result<Vec<TagWithCount>, Self::Error>;

    /// Load a single tag.
    ///
    /// # Errors
    /// Returns a store-specific error when the read fails.
    fn get_tag(&self, id: TagId) -> Result<Option<Tag>, Self::Error>;

    /// Look a tag up by name ignoring case.
    ///
    /// # Errors
    /// Returns a store-specific error when the read fails.
    fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, Self::Error>;

    /// Persist a new tag.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    fn insert_tag(&self, new: &NewTag) -> Result<Tag, Self::Error>;

    /// Apply a partial tag update.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    fn update_tag(&self, id: TagId, update: &TagUpdate) -> Result<Option<Tag>, Self::Error>;

    /// Delete a tag.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    fn delete_tag(&self, id: TagId) -> Result<bool, Self::Error>;

    /// Whether `err` reports that a tag name is already in use.
    fn is_tag_name_conflict(err: &Self::Error) -> bool;

    /// Resolve filter tokens to existing tag ids.
    ///
    /// # Errors
    /// Returns a store-specific error when a lookup fails.
    fn resolve_tag_tokens(&self, tokens: &[TagToken]) -> Result<BTreeSet<TagId>, Self::Error>;
}

impl TicketStore for SqliteStore {
    type Error = StoreError;

    fn list_tickets(&self) -> Result<Vec<Ticket>, Self::Error> {
        Self::list_tickets(self)
    }

    fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, Self::Error> {
        Self::get_ticket(self, id)
    }

    fn insert_ticket(&self, new: &NewTicket) -> Result<Ticket, Self::Error> {
        Self::insert_ticket(self, new)
    }

    fn update_ticket(&self, id: TicketId, update: &TicketUpdate) -> Result<Option<Ticket>, Self::Error> {
        Self::update_ticket(self, id, update)
    }

    fn toggle_ticket(&self, id: TicketId) -> Result<Option<Ticket>, Self::Error> {
        Self::toggle_ticket(self, id)
    }

    fn delete_ticket(&self, id: TicketId) -> Result<bool, Self::Error> {
        Self::delete_ticket(self, id)
    }

    fn add_tags(&self, id: TicketId, tags: &[TagId]) -> Result<Option<Ticket>, Self::Error> {
        Self::add_tags(self, id, tags)
    }

    fn remove_tag(&self, id: TicketId, tag: TagId) -> Result<Option<Ticket>, Self::Error> {
        Self::remove_tag(self, id, tag)
    }

    fn set_completed(&self, ids: &[TicketId], is_completed: bool) -> Result<u64, Self::Error> {
        Self::set_completed(self, ids, is_completed)
    }

    fn delete_tickets(&self, ids: &[TicketId]) -> Result<u64, Self::Error> {
        Self::delete_tickets(self, ids)
    }

    fn list_tags(&self, search: Option<&str>) -> Result<Vec<TagWithCount>, Self::Error> {
        Self::list_tags(self, search)
    }

    fn get_tag(&self, id: TagId) -> Result<Option<Tag>, Self::Error> {
        Self::get_tag(self, id)
    }

    fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, Self::Error> {
        Self::find_tag_by_name(self, name)
    }

    fn insert_tag(&self, new: &NewTag) -> Result<Tag, Self::Error> {
        Self::insert_tag(self, new)
    }

    fn update_tag(&self, id: TagId, update: &TagUpdate) -> Result<Option<Tag>, Self::Error> {
        Self::update_tag(self, id, update)
    }

    fn delete_tag(&self, id: TagId) -> Result<bool, Self::Error> {
        Self::delete_tag(self, id)
    }

    fn is_tag_name_conflict(err: &Self::Error) -> bool {
        err.is_duplicate_tag_name()
    }

    fn resolve_tag_tokens(&self, tokens: &[TagToken]) -> Result<BTreeSet<TagId>, Self::Error> {
        Self::resolve_tag_tokens(self, tokens)
    }
}
