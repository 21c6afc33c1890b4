//! In-memory store and fixtures shared by the sync integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use catdb_core::{
    Brand, CatalogStore, NormalizedProduct, RunCounts, RunLogStore, RunOutcome, RunStatus,
    ScrapeRun, SourceConfig, SourceKind, StoreError,
};
use catdb_scraper::{FetchOutcome, ProductSource, ScraperError};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct StoredProduct {
    pub id: i64,
    pub product: NormalizedProduct,
}

#[derive(Default)]
struct State {
    brands: Vec<Brand>,
    products: Vec<StoredProduct>,
    categories: HashMap<i64, Vec<String>>,
    runs: Vec<ScrapeRun>,
    next_id: i64,
    inserts: usize,
    updates: usize,
    /// Simulates a concurrent writer landing the same product first.
    race_next_insert: bool,
    cancel_after_inserts: Option<(usize, CancellationToken)>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn with_brands(brands: Vec<Brand>) -> Arc<Self> {
        let store = Self::default();
        store.state.lock().unwrap().brands = brands;
        Arc::new(store)
    }

    pub fn seed_product(&self, product: NormalizedProduct) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.products.push(StoredProduct { id, product });
        id
    }

    pub fn race_next_insert(&self) {
        self.state.lock().unwrap().race_next_insert = true;
    }

    pub fn cancel_after_inserts(&self, n: usize, token: CancellationToken) {
        self.state.lock().unwrap().cancel_after_inserts = Some((n, token));
    }

    pub fn products(&self) -> Vec<StoredProduct> {
        self.state.lock().unwrap().products.clone()
    }

    pub fn categories(&self, product_id: i64) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .categories
            .get(&product_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn runs(&self) -> Vec<ScrapeRun> {
        self.state.lock().unwrap().runs.clone()
    }

    pub fn write_counts(&self) -> (usize, usize) {
        let state = self.state.lock().unwrap();
        (state.inserts, state.updates)
    }

    pub fn brand(&self, slug: &str) -> Brand {
        self.state
            .lock()
            .unwrap()
            .brands
            .iter()
            .find(|b| b.slug == slug)
            .cloned()
            .expect("brand fixture")
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_by_brand_and_external_id(
        &self,
        brand_id: i64,
        external_id: &str,
    ) -> Result<Option<i64>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .products
            .iter()
            .find(|p| p.product.brand_id == brand_id && p.product.external_id == external_id)
            .map(|p| p.id))
    }

    async fn find_by_brand_and_name(
        &self,
        brand_id: i64,
        name: &str,
    ) -> Result<Option<i64>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .products
            .iter()
            .find(|p| p.product.brand_id == brand_id && p.product.name == name)
            .map(|p| p.id))
    }

    async fn insert_product(&self, product: &NormalizedProduct) -> Result<i64, StoreError> {
        let mut state = self.state.lock().unwrap();

        if std::mem::take(&mut state.race_next_insert) {
            state.next_id += 1;
            let id = state.next_id;
            state.products.push(StoredProduct {
                id,
                product: product.clone(),
            });
        }

        if state.products.iter().any(|p| {
            p.product.brand_id == product.brand_id && p.product.external_id == product.external_id
        }) {
            return Err(StoreError::UniqueViolation {
                constraint: "products_brand_id_external_id_key".to_string(),
            });
        }

        state.next_id += 1;
        state.inserts += 1;
        let id = state.next_id;
        state.products.push(StoredProduct {
            id,
            product: product.clone(),
        });

        if let Some((n, token)) = &state.cancel_after_inserts {
            if state.inserts >= *n {
                token.cancel();
            }
        }
        Ok(id)
    }

    async fn update_product(
        &self,
        product_id: i64,
        product: &NormalizedProduct,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.updates += 1;
        let row = state
            .products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or(StoreError::NotFound)?;
        row.product = product.clone();
        Ok(())
    }

    async fn replace_category_associations(
        &self,
        product_id: i64,
        category_ids: &[String],
    ) -> Result<(), StoreError> {
        self.state
            .lock()
            .unwrap()
            .categories
            .insert(product_id, category_ids.to_vec());
        Ok(())
    }
}

#[async_trait]
impl RunLogStore for MemoryStore {
    async fn list_active_brands(&self) -> Result<Vec<Brand>, StoreError> {
        let mut brands: Vec<Brand> = self
            .state
            .lock()
            .unwrap()
            .brands
            .iter()
            .filter(|b| b.active)
            .cloned()
            .collect();
        brands.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(brands)
    }

    async fn get_brand_by_slug(&self, slug: &str) -> Result<Option<Brand>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .brands
            .iter()
            .find(|b| b.slug == slug)
            .cloned())
    }

    async fn mark_brand_synced(&self, brand_id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let brand = state
            .brands
            .iter_mut()
            .find(|b| b.id == brand_id)
            .ok_or(StoreError::NotFound)?;
        brand.last_synced_at = Some(at);
        Ok(())
    }

    async fn create_scrape_run(&self, brand_id: i64) -> Result<ScrapeRun, StoreError> {
        let mut state = self.state.lock().unwrap();
        let run = ScrapeRun {
            id: i64::try_from(state.runs.len()).unwrap() + 1,
            brand_id,
            status: RunStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            counts: RunCounts::default(),
            execution_time_seconds: None,
            error_message: None,
            dataset_id: None,
        };
        state.runs.push(run.clone());
        Ok(run)
    }

    async fn finish_scrape_run(&self, run_id: i64, outcome: &RunOutcome) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let run = state
            .runs
            .iter_mut()
            .find(|r| r.id == run_id && r.status == RunStatus::Running)
            .ok_or(StoreError::InvalidRunTransition { run_id })?;
        run.status = outcome.status;
        run.counts = outcome.counts;
        run.completed_at = Some(outcome.completed_at);
        run.execution_time_seconds = Some(outcome.execution_time_seconds);
        run.error_message.clone_from(&outcome.error_message);
        run.dataset_id.clone_from(&outcome.dataset_id);
        Ok(())
    }

    async fn list_recent_runs(
        &self,
        brand_id: Option<i64>,
        limit: u32,
    ) -> Result<Vec<ScrapeRun>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .runs
            .iter()
            .rev()
            .filter(|r| brand_id.is_none_or(|id| r.brand_id == id))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

/// What a [`StaticSource`] hands back.
pub enum Canned {
    Records(Vec<Value>),
    Degraded(Vec<Value>, String),
    Fails,
    /// Takes 30s and then yields nothing.
    Stalls,
}

/// Source returning the same canned result for every brand of its kind.
pub struct StaticSource {
    pub kind: SourceKind,
    pub canned: Canned,
}

impl StaticSource {
    pub fn new(kind: SourceKind, canned: Canned) -> Arc<Self> {
        Arc::new(Self { kind, canned })
    }
}

#[async_trait]
impl ProductSource for StaticSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch_all(
        &self,
        brand: &Brand,
        _since_days: Option<u32>,
    ) -> Result<FetchOutcome, ScraperError> {
        match &self.canned {
            Canned::Records(records) => Ok(FetchOutcome::complete(records.clone())),
            Canned::Degraded(records, note) => Ok(FetchOutcome {
                records: records.clone(),
                dataset_id: Some("ds-1".to_string()),
                degraded: Some(note.clone()),
            }),
            Canned::Fails => Err(ScraperError::AllStrategiesFailed {
                brand: brand.slug.clone(),
                attempts: "bulk catalog: endpoint not found".to_string(),
            }),
            Canned::Stalls => {
                tokio::time::sleep(std::time::Duration::from_secs(30)).await;
                Ok(FetchOutcome::complete(Vec::new()))
            }
        }
    }
}

pub fn brand(id: i64, slug: &str, kind: SourceKind, storefront_url: &str) -> Brand {
    Brand {
        id,
        slug: slug.to_string(),
        name: slug.replace('-', " "),
        storefront_url: storefront_url.to_string(),
        source_kind: Some(kind),
        source_config: SourceConfig::default(),
        active: true,
        last_synced_at: None,
    }
}

/// A structured-data record that normalizes cleanly.
pub fn valid_record(n: usize) -> Value {
    json!({
        "name": format!("Linen Midi Dress {n}"),
        "url": format!("https://shop.example/products/linen-midi-dress-{n}"),
        "image": [format!("https://cdn.shop.example/{n}.jpg")],
        "offers": {"price": "89.00", "priceCurrency": "USD", "availability": "https://schema.org/InStock"}
    })
}

/// A record the normalizer rejects.
pub fn invalid_record(n: usize) -> Value {
    json!({"headline": format!("not a product {n}")})
}
