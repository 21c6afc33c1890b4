use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("CATDB_ENV", "development"))?;
    let log_level = or_default("CATDB_LOG_LEVEL", "info");
    let brands_path = PathBuf::from(or_default("CATDB_BRANDS_PATH", "./config/brands.yaml"));

    let db_max_connections = parse_u32("CATDB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("CATDB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("CATDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let scraper_request_timeout_secs = parse_u64("CATDB_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default("CATDB_SCRAPER_USER_AGENT", "catdb/0.1 (catalog-ingest)");
    let scraper_inter_request_delay_ms = parse_u64("CATDB_SCRAPER_INTER_REQUEST_DELAY_MS", "500")?;
    let scraper_max_retries = parse_u32("CATDB_SCRAPER_MAX_RETRIES", "3")?;
    let scraper_retry_backoff_base_secs = parse_u64("CATDB_SCRAPER_RETRY_BACKOFF_BASE_SECS", "1")?;

    let native_page_size = parse_u32("CATDB_NATIVE_PAGE_SIZE", "250")?;
    if native_page_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "CATDB_NATIVE_PAGE_SIZE".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let native_max_pages = parse_usize("CATDB_NATIVE_MAX_PAGES", "40")?;
    let sitemap_max_products = parse_usize("CATDB_SITEMAP_MAX_PRODUCTS", "200")?;

    let remote_api_url = or_default("CATDB_REMOTE_API_URL", "https://api.apify.com/v2");
    let remote_api_token = lookup("CATDB_REMOTE_API_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty());
    let remote_poll_interval_secs = parse_u64("CATDB_REMOTE_POLL_INTERVAL_SECS", "10")?;
    let remote_max_wait_secs = parse_u64("CATDB_REMOTE_MAX_WAIT_SECS", "900")?;

    let sync_inter_brand_delay_ms = parse_u64("CATDB_SYNC_INTER_BRAND_DELAY_MS", "2000")?;
    let sync_record_workers = parse_usize("CATDB_SYNC_RECORD_WORKERS", "4")?.max(1);
    let new_only_days = parse_u32("CATDB_NEW_ONLY_DAYS", "7")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        brands_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_inter_request_delay_ms,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
        native_page_size,
        native_max_pages,
        sitemap_max_products,
        remote_api_url,
        remote_api_token,
        remote_poll_interval_secs,
        remote_max_wait_secs,
        sync_inter_brand_delay_ms,
        sync_record_workers,
        new_only_days,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CATDB_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
