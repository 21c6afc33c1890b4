//! Page-numbered catalog walks against a storefront's public JSON endpoints.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ScraperError;

use super::origin::extract_store_origin;
use super::{RequestProfile, StorefrontClient};

/// Page size and page cap for one catalog walk.
#[derive(Debug, Clone, Copy)]
pub struct CatalogPaging {
    pub page_size: u32,
    pub max_pages: usize,
}

#[derive(Debug, Deserialize)]
struct ProductsPage {
    #[serde(default)]
    products: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ProductDetail {
    product: Value,
}

impl StorefrontClient {
    /// Walks `{origin}/products.json` page by page.
    ///
    /// # Errors
    ///
    /// Propagates the first page failure; earlier pages are discarded.
    pub async fn fetch_catalog(
        &self,
        store_url: &str,
        paging: CatalogPaging,
        profile: RequestProfile<'_>,
    ) -> Result<Vec<Value>, ScraperError> {
        let origin = extract_store_origin(store_url);
        let endpoint = format!("{origin}/products.json");
        self.walk_pages(&endpoint, paging, profile).await
    }

    /// Walks one named collection. `collection` is either a bare handle
    /// (`"new-arrivals"`) or a path relative to the store root
    /// (`"collections/sale"`, `"/en-gb/collections/sale/products.json"`).
    ///
    /// # Errors
    ///
    /// Propagates the first page failure.
    pub async fn fetch_collection(
        &self,
        store_url: &str,
        collection: &str,
        paging: CatalogPaging,
    ) -> Result<Vec<Value>, ScraperError> {
        let endpoint = collection_endpoint(&extract_store_origin(store_url), collection);
        self.walk_pages(&endpoint, paging, RequestProfile::default())
            .await
    }

    /// Fetches `{product_url}.json` and returns the product object.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `product_url` does not parse,
    /// or any request/deserialize error.
    pub async fn fetch_product_detail(&self, product_url: &str) -> Result<Value, ScraperError> {
        let mut url = reqwest::Url::parse(product_url).map_err(|e| ScraperError::InvalidUrl {
            url: product_url.to_owned(),
            reason: e.to_string(),
        })?;
        url.set_query(None);
        url.set_fragment(None);
        let path = url.path().trim_end_matches('/').to_owned();
        if !path.ends_with(".json") {
            url.set_path(&format!("{path}.json"));
        }

        let detail: ProductDetail = self
            .get_json(url.as_str(), RequestProfile::default())
            .await?;
        Ok(detail.product)
    }

    /// Fetches pages 1..=`max_pages` in order, stopping at the first empty or
    /// short page. Reaching the cap is not an error.
    async fn walk_pages(
        &self,
        endpoint: &str,
        paging: CatalogPaging,
        profile: RequestProfile<'_>,
    ) -> Result<Vec<Value>, ScraperError> {
        let mut records = Vec::new();

        for page in 1..=paging.max_pages {
            if page > 1 {
                self.pause().await;
            }

            let url = catalog_page_url(endpoint, paging.page_size, page)?;
            let body: ProductsPage = self.get_json(&url, profile).await?;
            let count = body.products.len();
            tracing::debug!(endpoint, page, count, "fetched catalog page");
            records.extend(body.products);

            if count == 0 || count < paging.page_size as usize {
                return Ok(records);
            }
        }

        tracing::warn!(
            endpoint,
            max_pages = paging.max_pages,
            fetched = records.len(),
            "catalog page cap reached, stopping pagination"
        );
        Ok(records)
    }
}

/// Builds `{endpoint}?limit={limit}&page={page}`.
pub(crate) fn catalog_page_url(
    endpoint: &str,
    limit: u32,
    page: usize,
) -> Result<String, ScraperError> {
    let mut url = reqwest::Url::parse(endpoint).map_err(|e| ScraperError::InvalidUrl {
        url: endpoint.to_owned(),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("limit", &limit.to_string())
        .append_pair("page", &page.to_string());
    Ok(url.to_string())
}

pub(crate) fn collection_endpoint(origin: &str, collection: &str) -> String {
    let collection = collection.trim().trim_matches('/');
    if !collection.contains('/') {
        return format!("{origin}/collections/{collection}/products.json");
    }
    if collection.ends_with(".json") {
        format!("{origin}/{collection}")
    } else {
        format!("{origin}/{collection}/products.json")
    }
}
