use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// A header the relay attaches server-side for requests to `host`.
#[derive(Clone, PartialEq, Eq)]
pub struct HostHeader {
    pub host: String,
    pub name: String,
    pub value: String,
}

impl std::fmt::Debug for HostHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostHeader")
            .field("host", &self.host)
            .field("name", &self.name)
            .field("value", &"[redacted]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Relay endpoints tried in order. Empty means requests go out directly.
    pub relay_urls: Vec<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Delay between per-item requests for resource-per-item sources.
    pub item_delay_ms: u64,
    pub output_dir: PathBuf,
    pub relay_bind_addr: SocketAddr,
    pub relay_cache_ttl_secs: u64,
    /// Allows plain-HTTP and local relay targets. Development only.
    pub relay_allow_insecure: bool,
    pub relay_host_headers: Vec<HostHeader>,
}
