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

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub brands_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_inter_request_delay_ms: u64,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_secs: u64,
    /// Products requested per page from a native storefront catalog.
    pub native_page_size: u32,
    /// Hard cap on catalog pages fetched per brand.
    pub native_max_pages: usize,
    /// Maximum product detail pages fetched through the sitemap strategy.
    pub sitemap_max_products: usize,
    pub remote_api_url: String,
    pub remote_api_token: Option<String>,
    pub remote_poll_interval_secs: u64,
    pub remote_max_wait_secs: u64,
    pub sync_inter_brand_delay_ms: u64,
    /// Upper bound on records processed concurrently within one brand.
    pub sync_record_workers: usize,
    /// Recency window applied by `sync --new-only`.
    pub new_only_days: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("brands_path", &self.brands_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field(
                "scraper_inter_request_delay_ms",
                &self.scraper_inter_request_delay_ms,
            )
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field(
                "scraper_retry_backoff_base_secs",
                &self.scraper_retry_backoff_base_secs,
            )
            .field("native_page_size", &self.native_page_size)
            .field("native_max_pages", &self.native_max_pages)
            .field("sitemap_max_products", &self.sitemap_max_products)
            .field("remote_api_url", &self.remote_api_url)
            .field(
                "remote_api_token",
                &self.remote_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("remote_poll_interval_secs", &self.remote_poll_interval_secs)
            .field("remote_max_wait_secs", &self.remote_max_wait_secs)
            .field("sync_inter_brand_delay_ms", &self.sync_inter_brand_delay_ms)
            .field("sync_record_workers", &self.sync_record_workers)
            .field("new_only_days", &self.new_only_days)
            .finish()
    }
}
