use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use ticketdesk_core::wire::TagsListResponse;
use ticketdesk_core::{NewTag, Tag, TagId, TagUpdate};

use crate::AppState;
use crate::error::{AppError, Json, Path, Query};

/// Query string of `GET /api/tags`.
#[derive(Debug, Default, Deserialize)]
pub struct ListTagsParams {
    search: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListTagsParams>,
) -> Result<Json<TagsListResponse>, AppError> {
    let tags = state
        .service
        .run(move |svc| svc.list_tags(params.search.as_deref()))
        .await?;
    Ok(Json(TagsListResponse { tags }))
}

pub async fn create(
    State(state): State<AppState>,
    Json(new): Json<NewTag>,
) -> Result<(StatusCode, Json<Tag>), AppError> {
    let tag = state.service.run(move |svc| svc.create_tag(new)).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Tag>, AppError> {
    let id = TagId(id);
    Ok(Json(state.service.run(move |svc| svc.get_tag(id)).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<TagUpdate>,
) -> Result<Json<Tag>, AppError> {
    let id = TagId(id);
    Ok(Json(state.service.run(move |svc| svc.update_tag(id, update)).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode, AppError> {
    let id = TagId(id);
    state.service.run(move |svc| svc.delete_tag(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
