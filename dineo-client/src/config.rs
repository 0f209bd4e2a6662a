//! Client configuration

use shared::order::StatusVariant;
use std::path::PathBuf;
use std::time::Duration;

/// Default status poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Default connectivity ping interval
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(15);

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (e.g., "https://project.example.co")
    pub base_url: String,

    /// Anonymous API key sent as `apikey` and bearer token
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Durable session store file; `None` keeps the session in memory
    pub store_path: Option<PathBuf>,

    /// Status poll interval
    pub poll_interval: Duration,

    /// Connectivity ping interval
    pub ping_interval: Duration,

    /// Which lifecycle the backend runs
    pub status_variant: StatusVariant,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: 30,
            store_path: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            ping_interval: DEFAULT_PING_INTERVAL,
            status_variant: StatusVariant::default(),
        }
    }

    /// Read configuration from `DINEO_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup
    ///
    /// Unparseable values are logged and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("DINEO_BACKEND_URL") {
            config.base_url = url;
        }
        if let Some(key) = lookup("DINEO_API_KEY") {
            config = config.with_api_key(key);
        }
        if let Some(path) = lookup("DINEO_STORE_PATH") {
            config = config.with_store_path(path);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "DINEO_POLL_INTERVAL_SECS") {
            config = config.with_poll_interval(Duration::from_secs(secs));
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "DINEO_REQUEST_TIMEOUT_SECS") {
            config = config.with_timeout(secs);
        }
        if let Some(variant) = parse_var::<StatusVariant>(&lookup, "DINEO_STATUS_VARIANT") {
            config = config.with_status_variant(variant);
        }

        config
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Persist the session to a redb file at `path`
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Set the status poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the connectivity ping interval
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    pub fn with_status_variant(mut self, variant: StatusVariant) -> Self {
        self.status_variant = variant;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:54321")
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable config value");
            None
        }
    }
}
