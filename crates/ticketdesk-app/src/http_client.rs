//! [`TicketApi`] over HTTP.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use ticketdesk_core::wire::{
    AddTagsRequest, BatchDeleteRequest, BatchUpdateStatusRequest, ErrorBody, HealthResponse, TagsListResponse,
    TicketsListResponse,
};
use ticketdesk_core::{
    BatchOutcome, NewTag, NewTicket, Tag, TagId, TagUpdate, TagWithCount, Ticket, TicketId, TicketQuery,
    TicketUpdate,
};
use tracing::{debug, warn};

use crate::api::{ApiError, ApiResult, TicketApi};
use crate::config::ClientConfig;

/// HTTP client for the ticket backend.
#[derive(Debug, Clone)]
pub struct HttpTicketClient {
    client: Client,
    base_url: String,
}

impl HttpTicketClient {
    /// Build a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { client, base_url })
    }

    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn from_config(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.api_url.clone(), config.timeout())
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = self.execute(request).await?;
        response.json::<T>().await.map_err(transport_error)
    }

    async fn send_empty(&self, request: RequestBuilder) -> ApiResult<()> {
        self.execute(request).await.map(drop)
    }

    async fn execute(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "api response");
        if status.is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    warn!(error = %err, "api request failed");
    if err.is_timeout() {
        ApiError::timeout()
    } else if err.is_decode() {
        ApiError::decode(err.to_string())
    } else {
        ApiError::network()
    }
}

async fn error_from_response(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.bytes().await.unwrap_or_default();
    let detail = serde_json::from_slice::<ErrorBody>(&body).map_or_else(
        |_| {
            let text = String::from_utf8_lossy(&body).trim().to_owned();
            (!text.is_empty()).then_some(text)
        },
        |parsed| Some(parsed.detail),
    );
    warn!(status, detail = detail.as_deref().unwrap_or(""), "api error");
    ApiError::from_status(status, detail)
}

impl TicketApi for HttpTicketClient {
    async fn health(&self) -> ApiResult<HealthResponse> {
        self.send(self.client.get(self.url("/health"))).await
    }

    async fn list_tickets(&self, query: &TicketQuery) -> ApiResult<Vec<Ticket>> {
        let request = self
            .client
            .get(self.url("/api/tickets"))
            .query(&query.to_query_pairs());
        let response: TicketsListResponse = self.send(request).await?;
        Ok(response.tickets)
    }

    async fn get_ticket(&self, id: TicketId) -> ApiResult<Ticket> {
        self.send(self.client.get(self.url(&format!("/api/tickets/{id}"))))
            .await
    }

    async fn create_ticket(&self, new: &NewTicket) -> ApiResult<Ticket> {
        self.send(self.client.post(self.url("/api/tickets")).json(new))
            .await
    }

    async fn update_ticket(&self, id: TicketId, update: &TicketUpdate) -> ApiResult<Ticket> {
        self.send(
            self.client
                .put(self.url(&format!("/api/tickets/{id}")))
                .json(update),
        )
        .await
    }

    async fn delete_ticket(&self, id: TicketId) -> ApiResult<()> {
        self.send_empty(self.client.delete(self.url(&format!("/api/tickets/{id}"))))
            .await
    }

    async fn toggle_ticket(&self, id: TicketId) -> ApiResult<Ticket> {
        self.send(
            self.client
                .patch(self.url(&format!("/api/tickets/{id}/complete"))),
        )
        .await
    }

    async fn add_tags(&self, id: TicketId, tags: &[TagId]) -> ApiResult<Ticket> {
        let body = AddTagsRequest { tag_ids: tags.to_vec() };
        self.send(
            self.client
                .post(self.url(&format!("/api/tickets/{id}/tags")))
                .json(&body),
        )
        .await
    }

    async fn remove_tag(&self, id: TicketId, tag: TagId) -> ApiResult<Ticket> {
        self.send(
            self.client
                .delete(self.url(&format!("/api/tickets/{id}/tags/{tag}"))),
        )
        .await
    }

    async fn batch_update_status(&self, ids: &[TicketId], is_completed: bool) -> ApiResult<BatchOutcome> {
        let body = BatchUpdateStatusRequest {
            ticket_ids: ids.to_vec(),
            is_completed,
        };
        self.send(
            self.client
                .post(self.url("/api/tickets/batch/status"))
                .json(&body),
        )
        .await
    }

    async fn batch_delete(&self, ids: &[TicketId]) -> ApiResult<BatchOutcome> {
        let body = BatchDeleteRequest {
            ticket_ids: ids.to_vec(),
        };
        self.send(
            self.client
                .post(self.url("/api/tickets/batch/delete"))
                .json(&body),
        )
        .await
    }

    async fn list_tags(&self, search: Option<&str>) -> ApiResult<Vec<TagWithCount>> {
        let mut request = self.client.get(self.url("/api/tags"));
        if let Some(search) = search {
            request = request.query(&[("search", search)]);
        }
        let response: TagsListResponse = self.send(request).await?;
        Ok(response.tags)
    }

    async fn get_tag(&self, id: TagId) -> ApiResult<Tag> {
        self.send(self.client.get(self.url(&format!("/api/tags/{id}"))))
            .await
    }

    async fn create_tag(&self, new: &NewTag) -> ApiResult<Tag> {
        self.send(self.client.post(self.url("/api/tags")).json(new))
            .await
    }

    async fn update_tag(&self, id: TagId, update: &TagUpdate) -> ApiResult<Tag> {
        self.send(
            self.client
                .put(self.url(&format!("/api/tags/{id}")))
                .json(update),
        )
        .await
    }

    async fn delete_tag(&self, id: TagId) -> ApiResult<()> {
        self.send_empty(self.client.delete(self.url(&format!("/api/tags/{id}"))))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiErrorKind;

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = HttpTicketClient::new("http://localhost:8000/", Duration::from_secs(1))
            .unwrap_or_else(|err| panic!("client: {err}"));
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/health"), "http://localhost:8000/health");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        // Port 9 (discard) on loopback is closed on test machines.
        let client = HttpTicketClient::new("http://127.0.0.1:9", Duration::from_secs(5))
            .unwrap_or_else(|err| panic!("client: {err}"));
        let err = client
            .health()
            .await
            .err()
            .unwrap_or_else(|| panic!("request must fail"));
        assert_eq!(err.kind, ApiErrorKind::Network);
        assert!(err.is_retryable());
    }
}
