//! Read-through queries and invalidating mutations over a [`TicketApi`].

use std::future::Future;
use std::num::NonZeroUsize;
use std::time::Duration;

use ticketdesk_core::{
    BatchOutcome, NewTag, NewTicket, Tag, TagId, TagUpdate, TagWithCount, Ticket, TicketId, TicketQuery,
    TicketUpdate,
};
use tracing::debug;

use crate::api::{ApiResult, TicketApi};
use crate::config::ClientConfig;
use crate::query_cache::{QueryCache, QueryData, QueryKey, QueryScope};

/// Query client: caches reads, retries failed reads, and invalidates every
/// ticket and tag query after a successful write.
///
/// Failed writes leave the cache untouched and are never retried.
pub struct QueryClient<A> {
    api: A,
    cache: QueryCache,
    retries: u32,
    retry_delay: Duration,
}

impl<A> QueryClient<A> {
    /// Wrap `api` with a cache configured from `config`.
    pub fn new(api: A, config: &ClientConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            api,
            cache: QueryCache::new(capacity, config.stale_time()),
            retries: config.retries,
            retry_delay: config.retry_delay(),
        }
    }

    /// The wrapped API.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// The query cache.
    pub const fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Mark queries under `scope` stale.
    pub fn invalidate(&mut self, scope: QueryScope) -> usize {
        self.cache.invalidate(scope)
    }
}

async fn with_retries<T, F, Fut>(retries: u32, delay: Duration, mut attempt: F) -> ApiResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let mut remaining = retries;
    loop {
        match attempt().await {
            Err(err) if remaining > 0 && err.is_retryable() => {
                remaining -= 1;
                debug!(error = %err, remaining, "retrying query");
                tokio::time::sleep(delay).await;
            }
            result => return result,
        }
    }
}

impl<A: TicketApi> QueryClient<A> {
    /// Tickets matching `query`, from cache when fresh.
    ///
    /// # Errors
    /// Returns the last error once retries are exhausted.
    pub async fn tickets(&mut self, query: &TicketQuery) -> ApiResult<Vec<Ticket>> {
        let key = QueryKey::TicketList(query.clone());
        if let Some(QueryData::Tickets(tickets)) = self.cache.get(&key) {
            return Ok(tickets.clone());
        }
        self.fetch_tickets(key, query).await
    }

    /// Tickets matching `query`, always from the API.
    ///
    /// # Errors
    /// Returns the last error once retries are exhausted.
    pub async fn refetch_tickets(&mut self, query: &TicketQuery) -> ApiResult<Vec<Ticket>> {
        self.fetch_tickets(QueryKey::TicketList(query.clone()), query).await
    }

    async fn fetch_tickets(&mut self, key: QueryKey, query: &TicketQuery) -> ApiResult<Vec<Ticket>> {
        let api = &self.api;
        let tickets = with_retries(self.retries, self.retry_delay, move || api.list_tickets(query)).await?;
        self.cache.insert(key, QueryData::Tickets(tickets.clone()));
        Ok(tickets)
    }

    /// A single ticket, from cache when fresh.
    ///
    /// # Errors
    /// Returns the last error once retries are exhausted.
    pub async fn ticket(&mut self, id: TicketId) -> ApiResult<Ticket> {
        let key = QueryKey::Ticket(id);
        if let Some(QueryData::Ticket(ticket)) = self.cache.get(&key) {
            return Ok(ticket.clone());
        }
        let api = &self.api;
        let ticket = with_retries(self.retries, self.retry_delay, move || api.get_ticket(id)).await?;
        self.cache.insert(key, QueryData::Ticket(ticket.clone()));
        Ok(ticket)
    }

    /// Tags with counts, from cache when fresh.
    ///
    /// # Errors
    /// Returns the last error once retries are exhausted.
    pub async fn tags(&mut self, search: Option<&str>) -> ApiResult<Vec<TagWithCount>> {
        let key = QueryKey::TagList(search.map(str::to_owned));
        if let Some(QueryData::Tags(tags)) = self.cache.get(&key) {
            return Ok(tags.clone());
        }
        let api = &self.api;
        let tags = with_retries(self.retries, self.retry_delay, move || api.list_tags(search)).await?;
        self.cache.insert(key, QueryData::Tags(tags.clone()));
        Ok(tags)
    }

    /// A single tag, from cache when fresh.
    ///
    /// # Errors
    /// Returns the last error once retries are exhausted.
    pub async fn tag(&mut self, id: TagId) -> ApiResult<Tag> {
        let key = QueryKey::Tag(id);
        if let Some(QueryData::Tag(tag)) = self.cache.get(&key) {
            return Ok(tag.clone());
        }
        let api = &self.api;
        let tag = with_retries(self.retries, self.retry_delay, move || api.get_tag(id)).await?;
        self.cache.insert(key, QueryData::Tag(tag.clone()));
        Ok(tag)
    }

    fn settle<T>(&mut self, result: ApiResult<T>) -> ApiResult<T> {
        if result.is_ok() {
            let marked = self.cache.invalidate_after_mutation();
            debug!(marked, "invalidated queries after mutation");
        }
        result
    }

    /// Create a ticket.
    ///
    /// # Errors
    /// Returns the API error; the cache is left untouched.
    pub async fn create_ticket(&mut self, new: &NewTicket) -> ApiResult<Ticket> {
        let result = self.api.create_ticket(new).await;
        self.settle(result)
    }

    /// Update a ticket.
    ///
    /// # Errors
    /// Returns the API error; the cache is left untouched.
    pub async fn update_ticket(&mut self, id: TicketId, update: &TicketUpdate) -> ApiResult<Ticket> {
        let result = self.api.update_ticket(id, update).await;
        self.settle(result)
    }

    /// Delete a ticket.
    ///
    /// # Errors
    /// Returns the API error; the cache is left untouched.
    pub async fn delete_ticket(&mut self, id: TicketId) -> ApiResult<()> {
        let result = self.api.delete_ticket(id).await;
        self.settle(result)
    }

    /// Toggle completion.
    ///
    /// # Errors
    /// Returns the API error; the cache is left untouched.
    pub async fn toggle_ticket(&mut self, id: TicketId) -> ApiResult<Ticket> {
        let result = self.api.toggle_ticket(id).await;
        self.settle(result)
    }

    /// Attach tags.
    ///
    /// # Errors
    /// Returns the API error; the cache is left untouched.
    pub async fn add_tags(&mut self, id: TicketId, tags: &[TagId]) -> ApiResult<Ticket> {
        let result = self.api.add_tags(id, tags).await;
        self.settle(result)
    }

    /// Detach a tag.
    ///
    /// # Errors
    /// Returns the API error; the cache is left untouched.
    pub async fn remove_tag(&mut self, id: TicketId, tag: TagId) -> ApiResult<Ticket> {
        let result = self.api.remove_tag(id, tag).await;
        self.settle(result)
    }

    /// Batch status update in one request.
    ///
    /// # Errors
    /// Returns the API error; the cache is left untouched.
    pub async fn batch_update_status(&mut self, ids: &[TicketId], is_completed: bool) -> ApiResult<BatchOutcome> {
        let result = self.api.batch_update_status(ids, is_completed).await;
        self.settle(result)
    }

    /// Batch delete in one request.
    ///
    /// # Errors
    /// Returns the API error; the cache is left untouched.
    pub async fn batch_delete(&mut self, ids: &[TicketId]) -> ApiResult<BatchOutcome> {
        let result = self.api.batch_delete(ids).await;
        self.settle(result)
    }

    /// Create a tag.
    ///
    /// # Errors
    /// Returns the API error; the cache is left untouched.
    pub async fn create_tag(&mut self, new: &NewTag) -> ApiResult<Tag> {
        let result = self.api.create_tag(new).await;
        self.settle(result)
    }

    /// Update a tag.
    ///
    /// # Errors
    /// Returns the API error; the cache is left untouched.
    pub async fn update_tag(&mut self, id: TagId, update: &TagUpdate) -> ApiResult<Tag> {
        let result = self.api.update_tag(id, update).await;
        self.settle(result)
    }

    /// Delete a tag.
    ///
    /// # Errors
    /// Returns the API error; the cache is left untouched.
    pub async fn delete_tag(&mut self, id: TagId) -> ApiResult<()> {
        let result = self.api.delete_tag(id).await;
        self.settle(result)
    }
}
