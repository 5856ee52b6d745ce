//! REST API for ticketdesk built on axum.

use std::future::Future;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::{get, patch, post};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use ticketdesk_app::{ServerConfig, SharedTicketService, TicketService};
use ticketdesk_core::wire::{HealthResponse, RootResponse};
use ticketdesk_store_sqlite::SqliteStore;

pub mod error;
mod tags;
mod tickets;

use error::{AppError, Json};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    service: SharedTicketService<SqliteStore>,
}

impl AppState {
    /// State backed by `store`.
    #[must_use]
    pub fn new(store: SqliteStore) -> Self {
        Self {
            service: SharedTicketService::new(TicketService::new(store)),
        }
    }
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Ticket Manager API".to_owned(),
        status: "running".to_owned(),
    })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_owned(),
    })
}

async fn not_found() -> AppError {
    AppError::new(StatusCode::NOT_FOUND, "Not Found")
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).with_context(|| format!("invalid allowed origin '{origin}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Build the application router.
///
/// # Errors
/// Returns an error if an allowed origin is not a valid header value.
pub fn router(state: AppState, config: &ServerConfig) -> Result<Router> {
    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/tickets", get(tickets::list).post(tickets::create))
        .route("/api/tickets/", get(tickets::list).post(tickets::create))
        .route("/api/tickets/batch/status", post(tickets::batch_status))
        .route("/api/tickets/batch/delete", post(tickets::batch_delete))
        .route(
            "/api/tickets/{id}",
            get(tickets::get).put(tickets::update).delete(tickets::delete),
        )
        .route("/api/tickets/{id}/complete", patch(tickets::toggle))
        .route("/api/tickets/{id}/tags", post(tickets::add_tags))
        .route("/api/tickets/{id}/tags/{tag_id}", axum::routing::delete(tickets::remove_tag))
        .route("/api/tags", get(tags::list).post(tags::create))
        .route("/api/tags/", get(tags::list).post(tags::create))
        .route(
            "/api/tags/{id}",
            get(tags::get).put(tags::update).delete(tags::delete),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.allowed_origins)?)
        .with_state(state);
    Ok(router)
}

/// Open the configured database and serve until Ctrl-C.
///
/// # Errors
/// Returns an error if the database cannot be opened, the address cannot be
/// bound, or the server fails.
pub async fn serve(config: &ServerConfig) -> Result<()> {
    let store = SqliteStore::open(&config.database)
        .with_context(|| format!("failed to open database {}", config.database.display()))?;
    let app = router(AppState::new(store), config)?;
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    serve_on(listener, app, shutdown_signal()).await
}

/// Serve `app` on an already bound listener until `shutdown` resolves.
///
/// # Errors
/// Returns an error if the server fails.
pub async fn serve_on<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    match listener.local_addr() {
        Ok(addr) => info!(%addr, "listening"),
        Err(err) => warn!(error = %err, "could not determine local address"),
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;
    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}
