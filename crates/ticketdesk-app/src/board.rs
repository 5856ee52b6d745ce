//! Page state for a filtered ticket list with a batch selection.

use std::time::Duration;

use thiserror::Error;
use ticketdesk_core::{BatchAction, BatchOutcome, Selection, Ticket, TicketId, TicketQuery};
use tracing::{debug, info, warn};

use crate::api::{ApiError, TicketApi};
use crate::debounce::Debouncer;
use crate::query_client::QueryClient;

/// Errors raised by [`TicketBoard`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// A batch action was requested with nothing selected.
    #[error("No tickets selected")]
    EmptySelection,
    /// The ticket is not in the current list.
    #[error("ticket {0} is not in the current list")]
    NotVisible(TicketId),
    /// The backend rejected the request.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result alias for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

/// The visible ticket list for a query, plus which of those tickets are selected.
///
/// The selection only ever holds visible ids: every reload drops ids that
/// fell out of the list.
pub struct TicketBoard<A> {
    client: QueryClient<A>,
    query: TicketQuery,
    visible: Vec<Ticket>,
    selection: Selection,
    search: Debouncer<String>,
}

impl<A> TicketBoard<A> {
    /// Create an empty board. Call [`TicketBoard::load`] to fetch tickets.
    pub fn new(client: QueryClient<A>, debounce: Duration) -> Self {
        Self {
            client,
            query: TicketQuery::new(),
            visible: Vec::new(),
            selection: Selection::new(),
            search: Debouncer::new(debounce),
        }
    }

    /// Current query.
    pub const fn query(&self) -> &TicketQuery {
        &self.query
    }

    /// Tickets in the current list, most recently updated first.
    pub fn visible(&self) -> &[Ticket] {
        &self.visible
    }

    /// Current selection.
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Underlying query client.
    pub const fn client(&self) -> &QueryClient<A> {
        &self.client
    }

    fn visible_ids(&self) -> impl Iterator<Item = TicketId> + '_ {
        self.visible.iter().map(|ticket| ticket.id)
    }

    fn is_visible(&self, id: TicketId) -> bool {
        self.visible.iter().any(|ticket| ticket.id == id)
    }

    fn replace_visible(&mut self, tickets: Vec<Ticket>) -> Vec<TicketId> {
        self.visible = tickets;
        let visible: Vec<TicketId> = self.visible_ids().collect();
        let orphaned = self.selection.reconcile(visible);
        if !orphaned.is_empty() {
            debug!(count = orphaned.len(), "dropped selection entries no longer visible");
        }
        orphaned
    }

    /// Select a visible ticket. Returns whether it was newly selected.
    ///
    /// # Errors
    /// Returns [`BoardError::NotVisible`] for ids outside the current list.
    pub fn select(&mut self, id: TicketId) -> BoardResult<bool> {
        if !self.is_visible(id) {
            return Err(BoardError::NotVisible(id));
        }
        Ok(self.selection.select(id))
    }

    /// Deselect a ticket. Returns whether it was selected.
    pub fn deselect(&mut self, id: TicketId) -> bool {
        self.selection.deselect(id)
    }

    /// Flip a visible ticket's selection. Returns the new membership.
    ///
    /// # Errors
    /// Returns [`BoardError::NotVisible`] for ids outside the current list.
    pub fn toggle(&mut self, id: TicketId) -> BoardResult<bool> {
        if !self.is_visible(id) {
            return Err(BoardError::NotVisible(id));
        }
        Ok(self.selection.toggle(id))
    }

    /// Select every visible ticket.
    pub fn select_all(&mut self) {
        let visible: Vec<TicketId> = self.visible_ids().collect();
        self.selection.select_all(visible);
    }

    /// Clear the selection.
    pub fn deselect_all(&mut self) {
        self.selection.deselect_all();
    }

    /// Select exactly the visible tickets matching `predicate`.
    pub fn select_where(&mut self, predicate: impl FnMut(&Ticket) -> bool) {
        self.selection.select_where(&self.visible, predicate);
    }

    /// Select exactly the visible completed tickets.
    pub fn select_completed(&mut self) {
        self.select_where(|ticket| ticket.is_completed);
    }

    /// Select exactly the visible open tickets.
    pub fn select_incomplete(&mut self) {
        self.select_where(|ticket| !ticket.is_completed);
    }

    /// Select the visible tickets that are not selected, and deselect the rest.
    pub fn invert_selection(&mut self) {
        let visible: Vec<TicketId> = self.visible_ids().collect();
        self.selection.invert(visible);
    }

    /// Whether the list is non-empty and fully selected.
    #[must_use]
    pub fn is_all_selected(&self) -> bool {
        self.selection.is_all_selected(self.visible_ids())
    }

    /// Selected tickets in list order.
    #[must_use]
    pub fn selected_tickets(&self) -> Vec<&Ticket> {
        self.visible
            .iter()
            .filter(|ticket| self.selection.contains(ticket.id))
            .collect()
    }

    /// Record search input. It is applied once the debounce period passes.
    pub fn input_search(&mut self, text: impl Into<String>) {
        self.search.push(text.into());
    }

    /// Whether search input is waiting to be applied.
    #[must_use]
    pub const fn has_pending_search(&self) -> bool {
        self.search.is_pending()
    }
}

impl<A: TicketApi> TicketBoard<A> {
    /// Fetch the list for the current query, from cache when fresh.
    /// Returns the ids dropped from the selection.
    ///
    /// # Errors
    /// Returns the API error; the list and selection are unchanged.
    pub async fn load(&mut self) -> BoardResult<Vec<TicketId>> {
        let tickets = self.client.tickets(&self.query).await?;
        Ok(self.replace_visible(tickets))
    }

    /// Fetch the list for the current query from the backend.
    /// Returns the ids dropped from the selection.
    ///
    /// # Errors
    /// Returns the API error; the list and selection are unchanged.
    pub async fn refresh(&mut self) -> BoardResult<Vec<TicketId>> {
        let tickets = self.client.refetch_tickets(&self.query).await?;
        Ok(self.replace_visible(tickets))
    }

    /// Switch to `query` and load its list. Returns the ids dropped from the selection.
    ///
    /// # Errors
    /// Returns the API error; the previous query, list and selection are kept.
    pub async fn set_query(&mut self, query: TicketQuery) -> BoardResult<Vec<TicketId>> {
        let previous = std::mem::replace(&mut self.query, query);
        let loaded = self.load().await;
        if loaded.is_err() {
            self.query = previous;
        }
        loaded
    }

    /// Apply pending search input if its debounce period has passed.
    /// Returns `None` when nothing was applied.
    ///
    /// # Errors
    /// Returns the API error from loading the new list.
    pub async fn poll_search(&mut self) -> BoardResult<Option<Vec<TicketId>>> {
        match self.search.poll() {
            Some(text) => self.apply_search(text).await.map(Some),
            None => Ok(None),
        }
    }

    /// Wait for pending search input to settle and apply it.
    /// Returns `None` when nothing was pending.
    ///
    /// # Errors
    /// Returns the API error from loading the new list.
    pub async fn settle_search(&mut self) -> BoardResult<Option<Vec<TicketId>>> {
        match self.search.settled().await {
            Some(text) => self.apply_search(text).await.map(Some),
            None => Ok(None),
        }
    }

    async fn apply_search(&mut self, text: String) -> BoardResult<Vec<TicketId>> {
        let query = self.query.clone().with_search(Some(text));
        self.set_query(query).await
    }

    /// Apply `action` to every selected ticket in one request.
    ///
    /// On success the selection is cleared and the list reloaded. On failure
    /// the selection is left as it was.
    ///
    /// # Errors
    /// Returns [`BoardError::EmptySelection`] without sending anything when
    /// nothing is selected, or the API error from the batch request.
    pub async fn apply_batch(&mut self, action: BatchAction) -> BoardResult<BatchOutcome> {
        if self.selection.is_empty() {
            return Err(BoardError::EmptySelection);
        }
        let ids = self.selection.to_vec();
        let result = match action.completion() {
            Some(is_completed) => self.client.batch_update_status(&ids, is_completed).await,
            None => self.client.batch_delete(&ids).await,
        };
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%action, selected = ids.len(), error = %err, "batch action failed");
                return Err(err.into());
            }
        };
        info!(%action, affected = outcome.affected_count, "batch action applied");
        self.selection.deselect_all();
        if let Err(err) = self.refresh().await {
            warn!(error = %err, "reload after batch action failed");
        }
        Ok(outcome)
    }
}
