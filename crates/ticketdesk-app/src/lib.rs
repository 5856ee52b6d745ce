//! Application layer logic for ticketdesk.
//!
//! This crate provides the service used by the HTTP server, the client-side
//! API contract with its HTTP and in-process implementations, query caching,
//! and the board that drives selection and batch actions.

pub mod api;
pub mod async_service;
pub mod board;
pub mod config;
pub mod debounce;
pub mod error;
pub mod http_client;
pub mod local;
pub mod query_cache;
pub mod query_client;
pub mod service;
pub mod store;

// Re-exports for convenience
pub use api::{ApiError, ApiErrorKind, ApiResult, TicketApi};
pub use async_service::SharedTicketService;
pub use board::{BoardError, BoardResult, TicketBoard};
pub use config::{ClientConfig, Config, ServerConfig};
pub use debounce::Debouncer;
pub use error::{ServiceError, ServiceResult};
pub use http_client::HttpTicketClient;
pub use local::LocalTicketApi;
pub use query_cache::{QueryCache, QueryData, QueryKey, QueryScope};
pub use query_client::QueryClient;
pub use service::TicketService;
pub use store::TicketStore;
