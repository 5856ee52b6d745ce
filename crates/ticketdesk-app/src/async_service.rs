//! Async adapter over the blocking service for use from tokio tasks.

use std::sync::Arc;

use crate::error::{ServiceError, ServiceResult};
use crate::service::TicketService;
use crate::store::TicketStore;

/// Cloneable handle that runs [`TicketService`] calls on the blocking pool.
///
/// The SQLite store performs synchronous I/O, so async callers (the HTTP
/// server and the in-process client) must not call it on a runtime worker.
pub struct SharedTicketService<S> {
    inner: Arc<TicketService<S>>,
}

impl<S> Clone for SharedTicketService<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> SharedTicketService<S>
where
    S: TicketStore + Send + Sync + 'static,
{
    /// Wrap a service.
    pub fn new(service: TicketService<S>) -> Self {
        Self {
            inner: Arc::new(service),
        }
    }

    /// Run `op` against the service on the blocking pool.
    ///
    /// # Errors
    /// Returns the operation's error, or [`ServiceError::Worker`] if the
    /// blocking task panicked or was cancelled.
    pub async fn run<T, F>(&self, op: F) -> ServiceResult<T>
    where
        F: FnOnce(&TicketService<S>) -> ServiceResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let service = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&service))
            .await
            .map_err(|e| ServiceError::Worker(format!("task join error: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketdesk_core::{NewTicket, TicketId};
    use ticketdesk_store_sqlite::SqliteStore;

    fn shared() -> SharedTicketService<SqliteStore> {
        let store = SqliteStore::open_in_memory().unwrap_or_else(|err| panic!("open store: {err}"));
        SharedTicketService::new(TicketService::new(store))
    }

    #[tokio::test]
    async fn runs_operations_off_the_runtime() {
        let service = shared();
        let created = service
            .run(|svc| svc.create_ticket(NewTicket::titled("async")))
            .await
            .unwrap_or_else(|err| panic!("create: {err}"));

        let clone = service.clone();
        let fetched = clone
            .run(move |svc| svc.get_ticket(created.id))
            .await
            .unwrap_or_else(|err| panic!("get: {err}"));
        assert_eq!(fetched.title, "async");
    }

    #[tokio::test]
    async fn propagates_service_errors() {
        let result = shared().run(|svc| svc.get_ticket(TicketId(1))).await;
        assert!(matches!(result, Err(ServiceError::TicketNotFound(TicketId(1)))));
    }
}
