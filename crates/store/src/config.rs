use std::time::Duration;

use serde::Deserialize;

use crate::filters::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root of the remote API, e.g. `http://127.0.0.1:3000/api`.
    pub base_url: String,
    /// Page size used until the caller picks another limit.
    pub page_size: u64,
    /// How long a fetched page counts as fresh for [`load`](crate::TransactionStore::load).
    pub cache_ttl_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/api".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            cache_ttl_secs: 5 * 60,
        }
    }
}

impl StoreConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
