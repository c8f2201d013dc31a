//! Catalog client configuration.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Settings for [`ModrinthClient`](crate::ModrinthClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct CatalogConfig {
    /// API root, without trailing slash
    #[serde(default = "default_base_url")]
    base_url: String,

    /// User-Agent sent with every request; the catalog rejects anonymous clients
    #[serde(default = "default_user_agent")]
    user_agent: String,

    /// Request budget per minute
    #[serde(default = "default_requests_per_minute")]
    requests_per_minute: u32,

    /// Retries for transient failures before giving up
    #[serde(default = "default_max_retries")]
    max_retries: usize,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.modrinth.com/v2".to_string()
}

fn default_user_agent() -> String {
    format!(
        "crumplecup/modwatch/{} (github.com/crumplecup/modwatch)",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_requests_per_minute() -> u32 {
    300
}

fn default_max_retries() -> usize {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            requests_per_minute: default_requests_per_minute(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CatalogConfig {
    /// Point the client at another API root (mirrors, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}
