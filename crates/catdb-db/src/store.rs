//! Postgres-backed implementation of the catalog and run-log seams.

use async_trait::async_trait;
use catdb_core::{
    Brand, CatalogStore, NormalizedProduct, RunLogStore, RunOutcome, ScrapeRun, StoreError,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{brands, products, scrape_runs};

/// A cloneable handle over a connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn find_by_brand_and_external_id(
        &self,
        brand_id: i64,
        external_id: &str,
    ) -> Result<Option<i64>, StoreError> {
        Ok(products::find_product_by_external_id(&self.pool, brand_id, external_id).await?)
    }

    async fn find_by_brand_and_name(
        &self,
        brand_id: i64,
        name: &str,
    ) -> Result<Option<i64>, StoreError> {
        Ok(products::find_product_by_name(&self.pool, brand_id, name).await?)
    }

    async fn insert_product(&self, product: &NormalizedProduct) -> Result<i64, StoreError> {
        Ok(products::insert_product(&self.pool, product).await?)
    }

    async fn update_product(
        &self,
        product_id: i64,
        product: &NormalizedProduct,
    ) -> Result<(), StoreError> {
        Ok(products::update_product(&self.pool, product_id, product).await?)
    }

    async fn replace_category_associations(
        &self,
        product_id: i64,
        category_ids: &[String],
    ) -> Result<(), StoreError> {
        Ok(products::replace_product_categories(&self.pool, product_id, category_ids).await?)
    }
}

#[async_trait]
impl RunLogStore for PgStore {
    async fn list_active_brands(&self) -> Result<Vec<Brand>, StoreError> {
        let rows = brands::list_active_brands(&self.pool).await?;
        rows.into_iter()
            .map(|row| row.into_brand().map_err(StoreError::from))
            .collect()
    }

    async fn get_brand_by_slug(&self, slug: &str) -> Result<Option<Brand>, StoreError> {
        let row = brands::get_brand_by_slug(&self.pool, slug).await?;
        Ok(row.map(brands::BrandRow::into_brand).transpose()?)
    }

    async fn mark_brand_synced(
        &self,
        brand_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Ok(brands::mark_brand_synced(&self.pool, brand_id, at).await?)
    }

    async fn create_scrape_run(&self, brand_id: i64) -> Result<ScrapeRun, StoreError> {
        let row = scrape_runs::create_scrape_run(&self.pool, brand_id).await?;
        Ok(row.into_run()?)
    }

    async fn finish_scrape_run(
        &self,
        run_id: i64,
        outcome: &RunOutcome,
    ) -> Result<(), StoreError> {
        Ok(scrape_runs::finish_scrape_run(&self.pool, run_id, outcome).await?)
    }

    async fn list_recent_runs(
        &self,
        brand_id: Option<i64>,
        limit: u32,
    ) -> Result<Vec<ScrapeRun>, StoreError> {
        let rows = scrape_runs::list_recent_runs(&self.pool, brand_id, limit).await?;
        rows.into_iter()
            .map(|row| row.into_run().map_err(StoreError::from))
            .collect()
    }
}
