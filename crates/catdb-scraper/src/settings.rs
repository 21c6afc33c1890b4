use std::time::Duration;

use catdb_core::AppConfig;

/// Knobs shared by every source adapter, lifted out of [`AppConfig`] so the
/// scraper crate can be driven without a database URL.
#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Pause between successive paginated requests to one origin.
    pub inter_request_delay_ms: u64,
    pub max_retries: u32,
    pub backoff_base_secs: u64,
    pub native_page_size: u32,
    pub native_max_pages: usize,
    pub sitemap_max_products: usize,
    pub remote_api_url: String,
    pub remote_api_token: Option<String>,
    pub remote_poll_interval: Duration,
    pub remote_max_wait: Duration,
}

impl ScraperSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout_secs: config.scraper_request_timeout_secs,
            user_agent: config.scraper_user_agent.clone(),
            inter_request_delay_ms: config.scraper_inter_request_delay_ms,
            max_retries: config.scraper_max_retries,
            backoff_base_secs: config.scraper_retry_backoff_base_secs,
            native_page_size: config.native_page_size,
            native_max_pages: config.native_max_pages,
            sitemap_max_products: config.sitemap_max_products,
            remote_api_url: config.remote_api_url.clone(),
            remote_api_token: config.remote_api_token.clone(),
            remote_poll_interval: Duration::from_secs(config.remote_poll_interval_secs),
            remote_max_wait: Duration::from_secs(config.remote_max_wait_secs),
        }
    }
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            user_agent: "catdb/0.1 (catalog-ingest)".to_string(),
            inter_request_delay_ms: 500,
            max_retries: 3,
            backoff_base_secs: 1,
            native_page_size: 250,
            native_max_pages: 40,
            sitemap_max_products: 200,
            remote_api_url: "https://api.apify.com/v2".to_string(),
            remote_api_token: None,
            remote_poll_interval: Duration::from_secs(10),
            remote_max_wait: Duration::from_secs(900),
        }
    }
}
