//! HTTP error responses and request extractors that report failures as `{"detail": ...}`.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use ticketdesk_app::ServiceError;
use ticketdesk_core::ValidationError;
use ticketdesk_core::wire::ErrorBody;
use tracing::error;

/// Error returned by handlers.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    detail: String,
}

impl AppError {
    /// Error with an explicit status and message.
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Status code sent to the client.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Message sent to the client.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        if err.is_internal() {
            error!(error = %err, "request failed");
        }
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.detail())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        ServiceError::from(err).into()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, axum::Json(ErrorBody { detail: self.detail })).into_response()
    }
}

/// JSON body extractor and response.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Path parameter extractor.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

/// Query string extractor.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);
