use std::path::PathBuf;

use crate::compose::ComposeSettings;

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

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Storefront REST API root, e.g. `https://api.example.vn/api/v1`.
    pub api_base_url: String,
    pub env: Environment,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub default_page_size: u32,
    /// `productCount` above which an empty root listing with subcategories
    /// is treated as over-limit when the backend omits the flag.
    pub over_limit_product_count: u64,
    /// Pending paths with more segments than this are guessed to be products.
    pub detail_depth_threshold: usize,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub filters_include_variants: bool,
    pub filters_include_counts: bool,
    pub state_path: PathBuf,
}

impl AppConfig {
    /// Composer thresholds derived from this configuration.
    #[must_use]
    pub fn compose_settings(&self) -> ComposeSettings {
        ComposeSettings {
            over_limit_product_count: self.over_limit_product_count,
            detail_depth_threshold: self.detail_depth_threshold,
            default_page_size: self.default_page_size,
        }
    }
}
