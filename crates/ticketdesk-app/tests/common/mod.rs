#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use ticketdesk_app::{
    ApiError, ApiResult, ClientConfig, LocalTicketApi, QueryClient, SharedTicketService, TicketApi,
    TicketService,
};
use ticketdesk_core::wire::HealthResponse;
use ticketdesk_core::{
    BatchOutcome, NewTag, NewTicket, Tag, TagId, TagUpdate, TagWithCount, Ticket, TicketId, TicketQuery,
    TicketUpdate,
};
use ticketdesk_store_sqlite::SqliteStore;

/// In-process API that counts list calls and can be told to fail.
pub struct FlakyApi {
    pub inner: LocalTicketApi<SqliteStore>,
    pub list_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
    /// Number of upcoming list calls answered with 503.
    pub failing_lists: AtomicUsize,
    /// Answer every mutation with 500.
    pub failing_mutations: AtomicBool,
}

impl FlakyApi {
    pub fn new() -> Self {
        let store = SqliteStore::open_in_memory().unwrap_or_else(|err| panic!("open store: {err}"));
        Self {
            inner: LocalTicketApi::new(SharedTicketService::new(TicketService::new(store))),
            list_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
            failing_lists: AtomicUsize::new(0),
            failing_mutations: AtomicBool::new(false),
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn fail_lists(&self, count: usize) {
        self.failing_lists.store(count, Ordering::SeqCst);
    }

    pub fn fail_mutations(&self, fail: bool) {
        self.failing_mutations.store(fail, Ordering::SeqCst);
    }

    fn mutation_gate(&self) -> ApiResult<()> {
        if self.failing_mutations.load(Ordering::SeqCst) {
            Err(ApiError::from_status(500, None))
        } else {
            Ok(())
        }
    }
}

impl TicketApi for FlakyApi {
    async fn health(&self) -> ApiResult<HealthResponse> {
        self.inner.health().await
    }

    async fn list_tickets(&self, query: &TicketQuery) -> ApiResult<Vec<Ticket>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_lists
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ApiError::from_status(503, None));
        }
        self.inner.list_tickets(query).await
    }

    async fn get_ticket(&self, id: TicketId) -> ApiResult<Ticket> {
        self.inner.get_ticket(id).await
    }

    async fn create_ticket(&self, new: &NewTicket) -> ApiResult<Ticket> {
        self.mutation_gate()?;
        self.inner.create_ticket(new).await
    }

    async fn update_ticket(&self, id: TicketId, update: &TicketUpdate) -> ApiResult<Ticket> {
        self.mutation_gate()?;
        self.inner.update_ticket(id, update).await
    }

    async fn delete_ticket(&self, id: TicketId) -> ApiResult<()> {
        self.mutation_gate()?;
        self.inner.delete_ticket(id).await
    }

    async fn toggle_ticket(&self, id: TicketId) -> ApiResult<Ticket> {
        self.mutation_gate()?;
        self.inner.toggle_ticket(id).await
    }

    async fn add_tags(&self, id: TicketId, tags: &[TagId]) -> ApiResult<Ticket> {
        self.mutation_gate()?;
        self.inner.add_tags(id, tags).await
    }

    async fn remove_tag(&self, id: TicketId, tag: TagId) -> ApiResult<Ticket> {
        self.mutation_gate()?;
        self.inner.remove_tag(id, tag).await
    }

    async fn batch_update_status(&self, ids: &[TicketId], is_completed: bool) -> ApiResult<BatchOutcome> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.mutation_gate()?;
        self.inner.batch_update_status(ids, is_completed).await
    }

    async fn batch_delete(&self, ids: &[TicketId]) -> ApiResult<BatchOutcome> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.mutation_gate()?;
        self.inner.batch_delete(ids).await
    }

    async fn list_tags(&self, search: Option<&str>) -> ApiResult<Vec<TagWithCount>> {
        self.inner.list_tags(search).await
    }

    async fn get_tag(&self, id: TagId) -> ApiResult<Tag> {
        self.inner.get_tag(id).await
    }

    async fn create_tag(&self, new: &NewTag) -> ApiResult<Tag> {
        self.mutation_gate()?;
        self.inner.create_tag(new).await
    }

    async fn update_tag(&self, id: TagId, update: &TagUpdate) -> ApiResult<Tag> {
        self.mutation_gate()?;
        self.inner.update_tag(id, update).await
    }

    async fn delete_tag(&self, id: TagId) -> ApiResult<()> {
        self.mutation_gate()?;
        self.inner.delete_tag(id).await
    }
}

/// Client settings with no retry delay.
pub fn fast_config(retries: u32) -> ClientConfig {
    ClientConfig {
        retries,
        retry_delay_ms: 0,
        ..ClientConfig::default()
    }
}

pub fn client(retries: u32) -> QueryClient<FlakyApi> {
    QueryClient::new(FlakyApi::new(), &fast_config(retries))
}

/// Seed tickets through the in-process API, bypassing the query client.
pub async fn seed(api: &FlakyApi, titles: &[(&str, bool)]) -> Vec<Ticket> {
    let mut created = Vec::new();
    for (title, completed) in titles {
        let mut ticket = api
            .inner
            .create_ticket(&NewTicket::titled(*title))
            .await
            .unwrap_or_else(|err| panic!("create {title}: {err}"));
        if *completed {
            ticket = api
                .inner
                .toggle_ticket(ticket.id)
                .await
                .unwrap_or_else(|err| panic!("toggle {title}: {err}"));
        }
        created.push(ticket);
    }
    created
}
