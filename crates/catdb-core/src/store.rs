//! Storage seams consumed by the sync pipeline.
//!
//! The Postgres implementation lives in `catdb-db`; tests use an in-memory
//! implementation. All product operations are brand-scoped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::brands::Brand;
use crate::products::NormalizedProduct;
use crate::runs::{RunOutcome, ScrapeRun};

#[derive(Debug, Error)]
pub enum StoreError {
    /// An insert hit a uniqueness constraint. The upsert engine recovers from
    /// this by re-resolving the existing row.
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("record not found")]
    NotFound,

    /// A run was finalized twice, or finalized without having been started.
    #[error("scrape run {run_id} is not in running state")]
    InvalidRunTransition { run_id: i64 },

    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }
}

/// Catalog rows. The upsert engine is the only caller that writes.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_by_brand_and_external_id(
        &self,
        brand_id: i64,
        external_id: &str,
    ) -> Result<Option<i64>, StoreError>;

    async fn find_by_brand_and_name(
        &self,
        brand_id: i64,
        name: &str,
    ) -> Result<Option<i64>, StoreError>;

    /// Inserts a new product row and returns its id.
    ///
    /// Must fail with [`StoreError::UniqueViolation`] when a row with the same
    /// `(brand_id, external_id)` already exists.
    async fn insert_product(&self, product: &NormalizedProduct) -> Result<i64, StoreError>;

    /// Overwrites every mutable field of an existing row.
    async fn update_product(
        &self,
        product_id: i64,
        product: &NormalizedProduct,
    ) -> Result<(), StoreError>;

    /// Clears the product's category links and inserts `category_ids`.
    async fn replace_category_associations(
        &self,
        product_id: i64,
        category_ids: &[String],
    ) -> Result<(), StoreError>;
}

/// Brands and the run log. Owned by the orchestrator.
#[async_trait]
pub trait RunLogStore: Send + Sync {
    async fn list_active_brands(&self) -> Result<Vec<Brand>, StoreError>;

    /// Returns the brand regardless of its `active` flag, so callers can
    /// report an inactive brand instead of "not found".
    async fn get_brand_by_slug(&self, slug: &str) -> Result<Option<Brand>, StoreError>;

    async fn mark_brand_synced(&self, brand_id: i64, at: DateTime<Utc>)
        -> Result<(), StoreError>;

    /// Creates a run in `running` state with `started_at = now`.
    async fn create_scrape_run(&self, brand_id: i64) -> Result<ScrapeRun, StoreError>;

    /// Writes the terminal state. Fails with
    /// [`StoreError::InvalidRunTransition`] if the run is no longer running.
    async fn finish_scrape_run(&self, run_id: i64, outcome: &RunOutcome)
        -> Result<(), StoreError>;

    /// Most recent runs first, optionally restricted to one brand.
    async fn list_recent_runs(
        &self,
        brand_id: Option<i64>,
        limit: u32,
    ) -> Result<Vec<ScrapeRun>, StoreError>;
}
