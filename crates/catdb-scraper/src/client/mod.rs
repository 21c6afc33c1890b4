//! HTTP client shared by the storefront-facing adapters.
//!
//! Every request goes through [`retry_with_backoff`], and non-2xx responses
//! are mapped to typed [`ScraperError`]s so callers can branch on status.

mod catalog;
mod origin;
mod sitemap;

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;
use crate::settings::ScraperSettings;

pub use catalog::CatalogPaging;
pub use origin::{extract_domain, extract_store_origin};
pub(crate) use origin::resolve_url;
pub use sitemap::{parse_sitemap, Sitemap};

pub(crate) const BROWSER_FALLBACK_UA: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Per-request header overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestProfile<'a> {
    pub user_agent: Option<&'a str>,
    pub bearer_token: Option<&'a str>,
}

impl RequestProfile<'static> {
    /// Headers of a desktop browser, for storefronts that 403 obvious bots.
    #[must_use]
    pub fn browser() -> Self {
        Self {
            user_agent: Some(BROWSER_FALLBACK_UA),
            bearer_token: None,
        }
    }
}

/// Retrying HTTP GET client with a configured timeout and `User-Agent`.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
    inter_request_delay: Duration,
}

impl StorefrontClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(settings: &ScraperSettings) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            max_retries: settings.max_retries,
            backoff_base_secs: settings.backoff_base_secs,
            inter_request_delay: Duration::from_millis(settings.inter_request_delay_ms),
        })
    }

    /// Sleeps for the configured inter-request delay.
    pub(crate) async fn pause(&self) {
        if !self.inter_request_delay.is_zero() {
            tokio::time::sleep(self.inter_request_delay).await;
        }
    }

    /// Fetches `url` and returns the response body as text.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`] on 429 after retries are exhausted.
    /// - [`ScraperError::NotFound`] on 404 (not retried).
    /// - [`ScraperError::UnexpectedStatus`] for other non-2xx (5xx retried).
    /// - [`ScraperError::Http`] on network failure after retries.
    pub async fn get_text(
        &self,
        url: &str,
        profile: RequestProfile<'_>,
    ) -> Result<String, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async move {
            let mut request = self
                .client
                .get(url)
                .header(
                    reqwest::header::ACCEPT,
                    "application/json,text/html;q=0.9,application/xml;q=0.8,*/*;q=0.5",
                )
                .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                .header(reqwest::header::CACHE_CONTROL, "no-cache");

            if let Some(ua) = profile.user_agent {
                request = request.header(reqwest::header::USER_AGENT, ua);
            }
            if let Some(token) = profile.bearer_token {
                request = request.bearer_auth(token);
            }

            let response = check_status(request.send().await?, url)?;
            Ok(response.text().await?)
        })
        .await
    }

    /// Fetches `url` and deserializes the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Everything [`Self::get_text`] returns, plus
    /// [`ScraperError::Deserialize`] when the body does not match `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        profile: RequestProfile<'_>,
    ) -> Result<T, ScraperError> {
        let body = self.get_text(url, profile).await?;
        serde_json::from_str(&body).map_err(|e| ScraperError::Deserialize {
            context: url.to_owned(),
            source: e,
        })
    }
}

/// Maps a non-2xx response to a typed error; passes 2xx responses through.
pub(crate) fn check_status(
    response: reqwest::Response,
    url: &str,
) -> Result<reqwest::Response, ScraperError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);
        return Err(ScraperError::RateLimited {
            domain: extract_domain(url),
            retry_after_secs,
        });
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ScraperError::NotFound {
            url: url.to_owned(),
        });
    }

    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    Ok(response)
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
