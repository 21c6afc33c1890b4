use std::time::Duration;

use async_trait::async_trait;
use catdb_core::{Brand, SourceKind};

use crate::client::extract_store_origin;
use crate::error::ScraperError;
use crate::remote::{CrawlInput, JobHandle, JobState, RemoteScrapeProxy};

use super::{FetchOutcome, ProductSource};

/// Brands that need bot circumvention, crawled by the remote service.
///
/// `source_config` drives the entry point:
/// - `dataset_id`: re-import a known result set without polling,
/// - `run_id`: poll an out-of-band run, then fetch its results,
/// - `job_id`: submit a new crawl of `listing_urls` (or the storefront's
///   default listing pages).
pub struct RemoteScrapeAdapter {
    proxy: RemoteScrapeProxy,
    max_wait: Duration,
}

impl RemoteScrapeAdapter {
    #[must_use]
    pub fn new(proxy: RemoteScrapeProxy, max_wait: Duration) -> Self {
        Self { proxy, max_wait }
    }

    async fn start(&self, brand: &Brand) -> Result<JobHandle, ScraperError> {
        let config = &brand.source_config;

        if let Some(run_id) = config.run_id.as_deref().filter(|s| !s.trim().is_empty()) {
            tracing::info!(brand = %brand.slug, run_id, "using pre-existing remote run");
            return Ok(JobHandle {
                run_id: run_id.trim().to_owned(),
                dataset_id: config.dataset_id.clone(),
            });
        }

        let job_id = config
            .job_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ScraperError::MissingSourceConfig {
                brand: brand.slug.clone(),
                field: "job_id",
            })?;

        let input = CrawlInput::new(listing_urls(brand), config.max_items);
        let input = serde_json::to_value(&input).map_err(|e| ScraperError::Deserialize {
            context: format!("crawl input for {}", brand.slug),
            source: e,
        })?;
        self.proxy.submit(job_id, &input).await
    }
}

/// Configured listing URLs, or the storefront's catch-all listing pages.
pub(crate) fn listing_urls(brand: &Brand) -> Vec<String> {
    let configured: Vec<String> = brand
        .source_config
        .listing_urls
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .map(str::to_owned)
        .collect();
    if !configured.is_empty() {
        return configured;
    }

    let origin = extract_store_origin(&brand.storefront_url);
    vec![
        format!("{origin}/collections/all"),
        format!("{origin}/products"),
    ]
}

#[async_trait]
impl ProductSource for RemoteScrapeAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::RemoteScrape
    }

    async fn fetch_all(
        &self,
        brand: &Brand,
        _since_days: Option<u32>,
    ) -> Result<FetchOutcome, ScraperError> {
        let config = &brand.source_config;

        // A known result set with no run to poll: import directly.
        if config.run_id.is_none() {
            if let Some(dataset_id) = config.dataset_id.as_deref().filter(|s| !s.trim().is_empty()) {
                tracing::info!(brand = %brand.slug, dataset_id, "re-importing remote result set");
                let records = self.proxy.fetch_result(dataset_id).await?;
                return Ok(FetchOutcome {
                    records,
                    dataset_id: Some(dataset_id.to_owned()),
                    degraded: None,
                });
            }
        }

        let handle = self.start(brand).await?;
        let outcome = self.proxy.await_completion(&handle, self.max_wait).await?;

        let Some(dataset_id) = outcome.dataset_id.clone() else {
            return Err(ScraperError::RemoteJobFailed {
                run_id: outcome.run_id,
                state: format!("{} without a result set", outcome.state),
            });
        };

        let records = self.proxy.fetch_result(&dataset_id).await?;

        if outcome.state == JobState::Succeeded {
            return Ok(FetchOutcome {
                records,
                dataset_id: Some(dataset_id),
                degraded: None,
            });
        }

        if records.is_empty() {
            return Err(ScraperError::RemoteJobFailed {
                run_id: outcome.run_id,
                state: outcome.state.to_string(),
            });
        }

        tracing::warn!(
            brand = %brand.slug,
            run_id = %outcome.run_id,
            state = %outcome.state,
            count = records.len(),
            "remote job did not succeed, importing partial results"
        );
        Ok(FetchOutcome {
            degraded: Some(format!(
                "remote job {} ended {}; imported {} partial records",
                outcome.run_id,
                outcome.state,
                records.len()
            )),
            records,
            dataset_id: Some(dataset_id),
        })
    }
}
