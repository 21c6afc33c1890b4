//! Source adapters: one [`ProductSource`] implementation per [`SourceKind`].
//!
//! Which adapter serves a brand is decided by the brand's `source_kind` data
//! through [`SourceRegistry`], never by code.

mod brand_api;
mod generic;
mod native;
mod remote;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use catdb_core::{Brand, SourceKind};

use crate::client::StorefrontClient;
use crate::error::ScraperError;
use crate::remote::RemoteScrapeProxy;
use crate::settings::ScraperSettings;

pub use brand_api::{BrandApiAdapter, ApiDialect};
pub use generic::{extract_listing_cards, GenericListingAdapter, DEFAULT_CARD_SELECTORS};
pub use native::NativeCatalogAdapter;
pub use remote::RemoteScrapeAdapter;

/// An opaque, source-shaped record. Never persisted.
pub type RawRecord = serde_json::Value;

/// What an adapter produced for one brand.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub records: Vec<RawRecord>,
    /// Remote result-set id, recorded on the run for re-import.
    pub dataset_id: Option<String>,
    /// Set when the records are usable but the source did not finish
    /// cleanly (e.g. a remote job that ended `FAILED` with partial rows).
    pub degraded: Option<String>,
}

impl FetchOutcome {
    #[must_use]
    pub fn complete(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait ProductSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Fetches every record the source currently lists for `brand`.
    ///
    /// `since_days` asks sources that know publish dates to drop older
    /// records; sources without dates ignore it.
    ///
    /// # Errors
    ///
    /// Returns a [`ScraperError`] when the brand's configuration is unusable
    /// or the source could not be read at all.
    async fn fetch_all(
        &self,
        brand: &Brand,
        since_days: Option<u32>,
    ) -> Result<FetchOutcome, ScraperError>;
}

/// Lookup table from [`SourceKind`] to adapter.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<SourceKind, Arc<dyn ProductSource>>,
}

impl SourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in adapter.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if an HTTP client cannot be built.
    pub fn from_settings(settings: &ScraperSettings) -> Result<Self, ScraperError> {
        let http = StorefrontClient::new(settings)?;
        let proxy = RemoteScrapeProxy::new(settings)?;

        Ok(Self::new()
            .with(Arc::new(NativeCatalogAdapter::new(http.clone(), settings)))
            .with(Arc::new(RemoteScrapeAdapter::new(
                proxy,
                settings.remote_max_wait,
            )))
            .with(Arc::new(BrandApiAdapter::new(http.clone(), settings)))
            .with(Arc::new(GenericListingAdapter::new(http))))
    }

    /// Registers `source` under its own kind, replacing any previous one.
    #[must_use]
    pub fn with(mut self, source: Arc<dyn ProductSource>) -> Self {
        self.sources.insert(source.kind(), source);
        self
    }

    /// Kind that serves `brand`: its configured kind, or generic HTML.
    #[must_use]
    pub fn kind_for(brand: &Brand) -> SourceKind {
        brand.source_kind.unwrap_or(SourceKind::GenericHtml)
    }

    #[must_use]
    pub fn select(&self, brand: &Brand) -> Option<Arc<dyn ProductSource>> {
        self.sources.get(&Self::kind_for(brand)).cloned()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.sources.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("SourceRegistry").field("kinds", &kinds).finish()
    }
}
