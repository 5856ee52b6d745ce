use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::TempDir;
use ticketdesk_app::{ClientConfig, HttpTicketClient, QueryClient, ServerConfig, TicketBoard};
use ticketdesk_server::{AppState, router, serve_on};
use ticketdesk_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A server bound to a loopback port over a database in a temp directory.
pub struct TestServer {
    // Owns the database directory for the server's lifetime.
    _temp: TempDir,
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<()>>>,
}

impl TestServer {
    /// Start a server on `127.0.0.1:0`.
    ///
    /// # Errors
    ///
    /// Returns an error when the database cannot be created or the port cannot be bound.
    pub async fn start() -> Result<Self> {
        let temp = tempfile::tempdir().context("failed to create temp dir")?;
        let database = temp.path().join("tickets.db");
        let store = SqliteStore::open(&database).context("failed to open store")?;
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            database,
            ..ServerConfig::default()
        };
        let app = router(AppState::new(store), &config)?;
        let listener = TcpListener::bind((config.host.as_str(), 0))
            .await
            .context("failed to bind loopback port")?;
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(serve_on(listener, app, async move {
            let _ = rx.await;
        }));
        Ok(Self {
            _temp: temp,
            addr,
            shutdown: Some(tx),
            task: Some(task),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client settings pointing at this server, with no retry delay.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.base_url(),
            timeout_secs: 5,
            retry_delay_ms: 0,
            ..ClientConfig::default()
        }
    }

    /// HTTP client for this server.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn http(&self) -> Result<HttpTicketClient> {
        Ok(HttpTicketClient::from_config(&self.client_config())?)
    }

    /// Board over a fresh query client.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn board(&self) -> Result<TicketBoard<HttpTicketClient>> {
        let config = self.client_config();
        let client = QueryClient::new(self.http()?, &config);
        Ok(TicketBoard::new(client, Duration::from_millis(50)))
    }

    /// Stop the server and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns an error when the server task failed.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.task.take() {
            Some(task) => task.await.context("server task panicked")?,
            None => Ok(()),
        }
    }
}
