//! Direct catalog reads against a brand's own storefront.
//!
//! Strategies are tried in order and the first one that succeeds wins:
//! 1. the bulk `products.json` catalog (retried once with a browser profile
//!    on 403),
//! 2. the configured named collections,
//! 3. the sitemap, with one detail request per product URL.

use std::collections::HashSet;

use async_trait::async_trait;
use catdb_core::{Brand, SourceKind};
use chrono::{DateTime, Duration, Utc};

use crate::client::{CatalogPaging, RequestProfile, StorefrontClient};
use crate::error::ScraperError;
use crate::settings::ScraperSettings;

use super::{FetchOutcome, ProductSource, RawRecord};

#[derive(Debug, Clone, Copy)]
enum Strategy {
    Bulk,
    Collections,
    Sitemap,
}

impl Strategy {
    const ORDER: [Strategy; 3] = [Strategy::Bulk, Strategy::Collections, Strategy::Sitemap];

    fn label(self) -> &'static str {
        match self {
            Strategy::Bulk => "bulk catalog",
            Strategy::Collections => "collections",
            Strategy::Sitemap => "sitemap",
        }
    }
}

pub struct NativeCatalogAdapter {
    http: StorefrontClient,
    paging: CatalogPaging,
    sitemap_max_products: usize,
}

impl NativeCatalogAdapter {
    #[must_use]
    pub fn new(http: StorefrontClient, settings: &ScraperSettings) -> Self {
        Self {
            http,
            paging: CatalogPaging {
                page_size: settings.native_page_size,
                max_pages: settings.native_max_pages,
            },
            sitemap_max_products: settings.sitemap_max_products,
        }
    }

    async fn run(&self, strategy: Strategy, brand: &Brand) -> Result<Vec<RawRecord>, ScraperError> {
        match strategy {
            Strategy::Bulk => self.bulk(brand).await,
            Strategy::Collections => self.collections(brand).await,
            Strategy::Sitemap => self.sitemap(brand).await,
        }
    }

    async fn bulk(&self, brand: &Brand) -> Result<Vec<RawRecord>, ScraperError> {
        let url = &brand.storefront_url;
        match self
            .http
            .fetch_catalog(url, self.paging, RequestProfile::default())
            .await
        {
            Err(ScraperError::UnexpectedStatus { status: 403, .. }) => {
                tracing::warn!(
                    brand = %brand.slug,
                    "catalog returned 403, retrying with browser profile"
                );
                self.http
                    .fetch_catalog(url, self.paging, RequestProfile::browser())
                    .await
            }
            other => other,
        }
    }

    async fn collections(&self, brand: &Brand) -> Result<Vec<RawRecord>, ScraperError> {
        let collections = &brand.source_config.collections;
        if collections.is_empty() {
            return Err(ScraperError::MissingSourceConfig {
                brand: brand.slug.clone(),
                field: "collections",
            });
        }

        let mut records = Vec::new();
        let mut seen = HashSet::new();
        let mut last_err = None;
        let mut any_ok = false;

        for (idx, collection) in collections.iter().enumerate() {
            if idx > 0 {
                self.http.pause().await;
            }
            match self
                .http
                .fetch_collection(&brand.storefront_url, collection, self.paging)
                .await
            {
                Ok(page) => {
                    any_ok = true;
                    // Products listed in several collections are kept once.
                    records.extend(page.into_iter().filter(|r| match r.get("id") {
                        Some(id) => seen.insert(id.to_string()),
                        None => true,
                    }));
                }
                Err(e) => {
                    tracing::warn!(brand = %brand.slug, collection, error = %e, "collection fetch failed");
                    last_err = Some(e);
                }
            }
        }

        match (any_ok, last_err) {
            (false, Some(e)) => Err(e),
            _ => Ok(records),
        }
    }

    async fn sitemap(&self, brand: &Brand) -> Result<Vec<RawRecord>, ScraperError> {
        let urls = self
            .http
            .fetch_sitemap_product_urls(&brand.storefront_url, self.sitemap_max_products)
            .await?;

        let mut records = Vec::with_capacity(urls.len());
        let mut last_err = None;
        for (idx, url) in urls.iter().enumerate() {
            if idx > 0 {
                self.http.pause().await;
            }
            match self.http.fetch_product_detail(url).await {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(brand = %brand.slug, url, error = %e, "product detail fetch failed");
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) if records.is_empty() => Err(e),
            _ => Ok(records),
        }
    }
}

#[async_trait]
impl ProductSource for NativeCatalogAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Native
    }

    async fn fetch_all(
        &self,
        brand: &Brand,
        since_days: Option<u32>,
    ) -> Result<FetchOutcome, ScraperError> {
        let mut attempts = Vec::new();

        for strategy in Strategy::ORDER {
            match self.run(strategy, brand).await {
                Ok(records) => {
                    tracing::info!(
                        brand = %brand.slug,
                        strategy = strategy.label(),
                        count = records.len(),
                        "native catalog fetched"
                    );
                    let records = match since_days {
                        Some(days) => published_since(records, Utc::now() - Duration::days(i64::from(days))),
                        None => records,
                    };
                    return Ok(FetchOutcome::complete(records));
                }
                Err(e) => {
                    tracing::warn!(
                        brand = %brand.slug,
                        strategy = strategy.label(),
                        error = %e,
                        "native strategy failed, falling through"
                    );
                    attempts.push(format!("{}: {e}", strategy.label()));
                }
            }
        }

        Err(ScraperError::AllStrategiesFailed {
            brand: brand.slug.clone(),
            attempts: attempts.join("; "),
        })
    }
}

/// Keeps records published (or, failing that, created) at or after
/// `cutoff`. Records without a parseable date are kept.
pub(crate) fn published_since(records: Vec<RawRecord>, cutoff: DateTime<Utc>) -> Vec<RawRecord> {
    let before = records.len();
    let kept: Vec<RawRecord> = records
        .into_iter()
        .filter(|r| {
            ["published_at", "created_at"]
                .iter()
                .find_map(|key| r.get(*key).and_then(serde_json::Value::as_str))
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .is_none_or(|published| published >= cutoff)
        })
        .collect();
    tracing::debug!(before, after = kept.len(), %cutoff, "applied recency window");
    kept
}
