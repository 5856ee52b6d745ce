//! [`TicketApi`] served in-process by a [`SharedTicketService`].

use ticketdesk_core::wire::HealthResponse;
use ticketdesk_core::{
    BatchOutcome, NewTag, NewTicket, Tag, TagId, TagUpdate, TagWithCount, Ticket, TicketId, TicketQuery,
    TicketUpdate,
};

use crate::api::{ApiError, ApiResult, TicketApi};
use crate::async_service::SharedTicketService;
use crate::error::ServiceError;
use crate::store::TicketStore;

/// Runs API calls directly against a store, with the same error mapping a
/// remote client would see.
pub struct LocalTicketApi<S> {
    service: SharedTicketService<S>,
}

impl<S> Clone for LocalTicketApi<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<S> LocalTicketApi<S> {
    /// Wrap a shared service.
    pub const fn new(service: SharedTicketService<S>) -> Self {
        Self { service }
    }
}

fn to_api_error(err: ServiceError) -> ApiError {
    ApiError::from_status(err.status_code(), Some(err.detail()))
}

impl<S> TicketApi for LocalTicketApi<S>
where
    S: TicketStore + Send + Sync + 'static,
{
    async fn health(&self) -> ApiResult<HealthResponse> {
        Ok(HealthResponse {
            status: "healthy".to_owned(),
        })
    }

    async fn list_tickets(&self, query: &TicketQuery) -> ApiResult<Vec<Ticket>> {
        let query = query.clone();
        self.service
            .run(move |svc| svc.list_tickets(&query))
            .await
            .map_err(to_api_error)
    }

    async fn get_ticket(&self, id: TicketId) -> ApiResult<Ticket> {
        self.service
            .run(move |svc| svc.get_ticket(id))
            .await
            .map_err(to_api_error)
    }

    async fn create_ticket(&self, new: &NewTicket) -> ApiResult<Ticket> {
        let new = new.clone();
        self.service
            .run(move |svc| svc.create_ticket(new))
            .await
            .map_err(to_api_error)
    }

    async fn update_ticket(&self, id: TicketId, update: &TicketUpdate) -> ApiResult<Ticket> {
        let update = update.clone();
        self.service
            .run(move |svc| svc.update_ticket(id, update))
            .await
            .map_err(to_api_error)
    }

    async fn delete_ticket(&self, id: TicketId) -> ApiResult<()> {
        self.service
            .run(move |svc| svc.delete_ticket(id))
            .await
            .map_err(to_api_error)
    }

    async fn toggle_ticket(&self, id: TicketId) -> ApiResult<Ticket> {
        self.service
            .run(move |svc| svc.toggle_ticket(id))
            .await
            .map_err(to_api_error)
    }

    async fn add_tags(&self, id: TicketId, tags: &[TagId]) -> ApiResult<Ticket> {
        let tags = tags.to_vec();
        self.service
            .run(move |svc| svc.add_tags(id, &tags))
            .await
            .map_err(to_api_error)
    }

    async fn remove_tag(&self, id: TicketId, tag: TagId) -> ApiResult<Ticket> {
        self.service
            .run(move |svc| svc.remove_tag(id, tag))
            .await
            .map_err(to_api_error)
    }

    async fn batch_update_status(&self, ids: &[TicketId], is_completed: bool) -> ApiResult<BatchOutcome> {
        let ids = ids.to_vec();
        self.service
            .run(move |svc| svc.batch_update_status(&ids, is_completed))
            .await
            .map_err(to_api_error)
    }

    async fn batch_delete(&self, ids: &[TicketId]) -> ApiResult<BatchOutcome> {
        let ids = ids.to_vec();
        self.service
            .run(move |svc| svc.batch_delete(&ids))
            .await
            .map_err(to_api_error)
    }

    async fn list_tags(&self, search: Option<&str>) -> ApiResult<Vec<TagWithCount>> {
        let search = search.map(str::to_owned);
        self.service
            .run(move |svc| svc.list_tags(search.as_deref()))
            .await
            .map_err(to_api_error)
    }

    async fn get_tag(&self, id: TagId) -> ApiResult<Tag> {
        self.service
            .run(move |svc| svc.get_tag(id))
            .await
            .map_err(to_api_error)
    }

    async fn create_tag(&self, new: &NewTag) -> ApiResult<Tag> {
        let new = new.clone();
        self.service
            .run(move |svc| svc.create_tag(new))
            .await
            .map_err(to_api_error)
    }

    async fn update_tag(&self, id: TagId, update: &TagUpdate) -> ApiResult<Tag> {
        let update = update.clone();
        self.service
            .run(move |svc| svc.update_tag(id, update))
            .await
            .map_err(to_api_error)
    }

    async fn delete_tag(&self, id: TagId) -> ApiResult<()> {
        self.service
            .run(move |svc| svc.delete_tag(id))
            .await
            .map_err(to_api_error)
    }
}
