use std::{
    collections::HashSet,
    fs,
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

const LOCAL_CONFIG_FILE: &str = "ticketdesk.toml";

/// Environment variable overriding `server.database`.
pub const ENV_DATABASE: &str = "TICKETDESK_DATABASE";
/// Environment variable overriding `server.host`.
pub const ENV_HOST: &str = "TICKETDESK_HOST";
/// Environment variable overriding `server.port`.
pub const ENV_PORT: &str = "TICKETDESK_PORT";
/// Environment variable overriding `client.api_url`.
pub const ENV_API_URL: &str = "TICKETDESK_API_URL";

/// Top-level configuration loaded from `ticketdesk.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Client settings.
    #[serde(default)]
    pub client: ClientConfig,
}

/// `[server]` block.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// SQLite database path.
    pub database: PathBuf,
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            database: PathBuf::from("ticketdesk.db"),
            allowed_origins: vec!["http://localhost:5173".into(), "http://127.0.0.1:5173".into()],
        }
    }
}

impl ServerConfig {
    /// Socket address to bind.
    ///
    /// # Errors
    /// Returns an error if `host` is not an IP address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("invalid server host '{}'", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// `[client]` block.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the ticket API.
    pub api_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Extra attempts for failed queries. Mutations are never retried.
    pub retries: u32,
    /// Delay between query attempts in milliseconds.
    pub retry_delay_ms: u64,
    /// How long a cached query stays fresh, in seconds.
    pub stale_time_secs: u64,
    /// Maximum number of cached queries.
    pub cache_capacity: usize,
    /// Quiet period before search input is applied, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".into(),
            timeout_secs: 30,
            retries: 1,
            retry_delay_ms: 1_000,
            stale_time_secs: 300,
            cache_capacity: 64,
            debounce_ms: 300,
        }
    }
}

impl ClientConfig {
    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay between query attempts.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Freshness window for cached queries.
    #[must_use]
    pub const fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_time_secs)
    }

    /// Search debounce period.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Per-user configuration file: `~/.config/ticketdesk/config.toml` on Linux.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ticketdesk").join("config.toml"))
}

impl Config {
    /// Load configuration and apply environment overrides.
    ///
    /// An explicit `path` must exist. Without one, `ticketdesk.toml` in the
    /// working directory is tried, then the per-user file, then defaults.
    ///
    /// # Errors
    /// Returns an error if a file cannot be read or parsed, an override is
    /// malformed, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let candidates = std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE)).chain(default_config_path());
                let mut found = None;
                for candidate in candidates {
                    if candidate.exists() {
                        found = Some(Self::from_file(&candidate)?);
                        break;
                    }
                }
                found.unwrap_or_default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file without applying overrides.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self =
            toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `TICKETDESK_*` overrides using `lookup` to read variables.
    ///
    /// # Errors
    /// Returns an error if `TICKETDESK_PORT` is not a port number.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(database) = lookup(ENV_DATABASE) {
            self.server.database = PathBuf::from(database);
        }
        if let Some(host) = lookup(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("{ENV_PORT} must be a port number (got '{port}')"))?;
        }
        if let Some(url) = lookup(ENV_API_URL) {
            self.client.api_url = url;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.server.bind_addr()?;
        if self.server.database.as_os_str().is_empty() {
            bail!("server.database must not be empty");
        }
        let mut seen = HashSet::new();
        for origin in &self.server.allowed_origins {
            if !seen.insert(origin.as_str()) {
                bail!("duplicate allowed origin '{origin}'");
            }
        }
        let url = self.client.api_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("client.api_url must start with http:// or https:// (got '{url}')");
        }
        if self.client.timeout_secs == 0 {
            bail!("client.timeout_secs must be positive");
        }
        if self.client.cache_capacity == 0 {
            bail!("client.cache_capacity must be positive");
        }
        Ok(())
    }
}
