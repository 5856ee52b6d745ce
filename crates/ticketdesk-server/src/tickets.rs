use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use ticketdesk_core::wire::{AddTagsRequest, BatchDeleteRequest, BatchUpdateStatusRequest, TicketsListResponse};
use ticketdesk_core::{
    BatchOutcome, NewTicket, StatusFilter, TagId, Ticket, TicketId, TicketQuery, TicketUpdate, parse_tag_tokens,
};

use crate::AppState;
use crate::error::{AppError, Json, Path, Query};

/// Query string of `GET /api/tickets`.
#[derive(Debug, Default, Deserialize)]
pub struct ListTicketsParams {
    search: Option<String>,
    tags: Option<String>,
    status: Option<String>,
}

impl ListTicketsParams {
    fn into_query(self) -> Result<TicketQuery, AppError> {
        let status = match self.status.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw.parse::<StatusFilter>()?,
            _ => StatusFilter::All,
        };
        let tags = self.tags.as_deref().map(parse_tag_tokens).unwrap_or_default();
        Ok(TicketQuery::new()
            .with_search(self.search)
            .with_tags(tags)
            .with_status(status))
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListTicketsParams>,
) -> Result<Json<TicketsListResponse>, AppError> {
    let query = params.into_query()?;
    let tickets = state.service.run(move |svc| svc.list_tickets(&query)).await?;
    Ok(Json(tickets.into()))
}

pub async fn create(
    State(state): State<AppState>,
    Json(new): Json<NewTicket>,
) -> Result<(StatusCode, Json<Ticket>), AppError> {
    let ticket = state.service.run(move |svc| svc.create_ticket(new)).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Ticket>, AppError> {
    let id = TicketId(id);
    Ok(Json(state.service.run(move |svc| svc.get_ticket(id)).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<TicketUpdate>,
) -> Result<Json<Ticket>, AppError> {
    let id = TicketId(id);
    Ok(Json(state.service.run(move |svc| svc.update_ticket(id, update)).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode, AppError> {
    let id = TicketId(id);
    state.service.run(move |svc| svc.delete_ticket(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Ticket>, AppError> {
    let id = TicketId(id);
    Ok(Json(state.service.run(move |svc| svc.toggle_ticket(id)).await?))
}

pub async fn add_tags(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<AddTagsRequest>,
) -> Result<Json<Ticket>, AppError> {
    let id = TicketId(id);
    Ok(Json(
        state
            .service
            .run(move |svc| svc.add_tags(id, &body.tag_ids))
            .await?,
    ))
}

pub async fn remove_tag(
    State(state): State<AppState>,
    Path((id, tag)): Path<(i64, i64)>,
) -> Result<Json<Ticket>, AppError> {
    let (id, tag) = (TicketId(id), TagId(tag));
    Ok(Json(state.service.run(move |svc| svc.remove_tag(id, tag)).await?))
}

pub async fn batch_status(
    State(state): State<AppState>,
    Json(body): Json<BatchUpdateStatusRequest>,
) -> Result<Json<BatchOutcome>, AppError> {
    Ok(Json(
        state
            .service
            .run(move |svc| svc.batch_update_status(&body.ticket_ids, body.is_completed))
            .await?,
    ))
}

pub async fn batch_delete(
    State(state): State<AppState>,
    Json(body): Json<BatchDeleteRequest>,
) -> Result<Json<BatchOutcome>, AppError> {
    Ok(Json(
        state
            .service
            .run(move |svc| svc.batch_delete(&body.ticket_ids))
            .await?,
    ))
}
