//! Brand-specific REST catalogs.
//!
//! Each dialect reads one known-stable API shape and converts it to the
//! structured-data record shape (`name` + `offers`) with decimal prices, so
//! the normalizer needs no per-brand knowledge.

use std::str::FromStr;

use async_trait::async_trait;
use catdb_core::{Brand, SourceKind};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::client::{RequestProfile, StorefrontClient};
use crate::error::ScraperError;
use crate::settings::ScraperSettings;

use super::{FetchOutcome, ProductSource, RawRecord};

/// Items requested per page from a paged catalog API.
const PAGED_CATALOG_PER_PAGE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiDialect {
    /// `GET {endpoint}?page=N&per_page=M` returning `{"items": [...]}` with
    /// integer minor-unit prices.
    PagedCatalog,
    /// `GET {endpoint}` returning `{"products": [...]}` (or a bare array)
    /// with decimal prices.
    FlatFeed,
}

impl FromStr for ApiDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "paged-catalog" => Ok(ApiDialect::PagedCatalog),
            "flat-feed" => Ok(ApiDialect::FlatFeed),
            other => Err(other.to_owned()),
        }
    }
}

pub struct BrandApiAdapter {
    http: StorefrontClient,
    max_pages: usize,
}

impl BrandApiAdapter {
    #[must_use]
    pub fn new(http: StorefrontClient, settings: &ScraperSettings) -> Self {
        Self {
            http,
            max_pages: settings.native_max_pages,
        }
    }

    async fn paged_catalog(
        &self,
        endpoint: &str,
        profile: RequestProfile<'_>,
    ) -> Result<Vec<RawRecord>, ScraperError> {
        let mut records = Vec::new();

        for page in 1..=self.max_pages {
            if page > 1 {
                self.http.pause().await;
            }
            let mut url = reqwest::Url::parse(endpoint).map_err(|e| ScraperError::InvalidUrl {
                url: endpoint.to_owned(),
                reason: e.to_string(),
            })?;
            url.query_pairs_mut()
                .append_pair("page", &page.to_string())
                .append_pair("per_page", &PAGED_CATALOG_PER_PAGE.to_string());

            let body: Value = self.http.get_json(url.as_str(), profile).await?;
            let items = body
                .get("items")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let count = items.len();
            tracing::debug!(endpoint, page, count, "fetched brand API page");
            records.extend(items.iter().map(paged_catalog_record));

            if count < PAGED_CATALOG_PER_PAGE {
                return Ok(records);
            }
        }

        tracing::warn!(endpoint, max_pages = self.max_pages, "brand API page cap reached");
        Ok(records)
    }

    async fn flat_feed(
        &self,
        endpoint: &str,
        profile: RequestProfile<'_>,
    ) -> Result<Vec<RawRecord>, ScraperError> {
        let body: Value = self.http.get_json(endpoint, profile).await?;
        let items = match &body {
            Value::Array(items) => items.clone(),
            other => other
                .get("products")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        };
        Ok(items.iter().map(flat_feed_record).collect())
    }
}

#[async_trait]
impl ProductSource for BrandApiAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::BrandApi
    }

    async fn fetch_all(
        &self,
        brand: &Brand,
        _since_days: Option<u32>,
    ) -> Result<FetchOutcome, ScraperError> {
        let config = &brand.source_config;
        let missing = |field| ScraperError::MissingSourceConfig {
            brand: brand.slug.clone(),
            field,
        };

        let dialect_name = config.api_dialect.as_deref().ok_or_else(|| missing("api_dialect"))?;
        let dialect: ApiDialect =
            dialect_name
                .parse()
                .map_err(|dialect| ScraperError::UnsupportedDialect {
                    brand: brand.slug.clone(),
                    dialect,
                })?;
        let endpoint = config
            .api_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| missing("api_endpoint"))?;

        let token = match config.api_token_env.as_deref() {
            Some(var) => Some(
                std::env::var(var)
                    .ok()
                    .filter(|t| !t.trim().is_empty())
                    .ok_or_else(|| ScraperError::MissingCredential {
                        name: var.to_owned(),
                    })?,
            ),
            None => None,
        };
        let profile = RequestProfile {
            user_agent: None,
            bearer_token: token.as_deref(),
        };

        let records = match dialect {
            ApiDialect::PagedCatalog => self.paged_catalog(endpoint, profile).await?,
            ApiDialect::FlatFeed => self.flat_feed(endpoint, profile).await?,
        };
        tracing::info!(brand = %brand.slug, dialect = dialect_name, count = records.len(), "brand API fetched");
        Ok(FetchOutcome::complete(records))
    }
}

/// Converts a paged-catalog item. Prices are integer cents.
pub(crate) fn paged_catalog_record(item: &Value) -> RawRecord {
    let mut offer = Map::new();
    insert_opt(&mut offer, "price", cents_to_text(item.get("price_cents")));
    insert_opt(&mut offer, "salePrice", cents_to_text(item.get("sale_price_cents")));
    insert_opt(&mut offer, "priceCurrency", str_field(item, "currency"));
    offer.insert(
        "availability".to_owned(),
        Value::Bool(item.get("in_stock").and_then(Value::as_bool).unwrap_or(true)),
    );

    structured(
        item.get("id").filter(|v| !v.is_null()).cloned(),
        item,
        "name",
        "url",
        images(item, &["images"]),
        Value::Object(offer),
    )
}

/// Converts a flat-feed item. Prices are decimals (number or string).
pub(crate) fn flat_feed_record(item: &Value) -> RawRecord {
    let mut offer = Map::new();
    insert_opt(&mut offer, "price", decimal_text(item.get("price")));
    insert_opt(&mut offer, "salePrice", decimal_text(item.get("sale_price")));
    insert_opt(&mut offer, "priceCurrency", str_field(item, "currency"));
    offer.insert(
        "availability".to_owned(),
        Value::Bool(item.get("available").and_then(Value::as_bool).unwrap_or(true)),
    );

    structured(
        str_field(item, "handle").map(Value::String),
        item,
        "title",
        "link",
        images(item, &["image_url", "gallery"]),
        Value::Object(offer),
    )
}

fn structured(
    id: Option<Value>,
    item: &Value,
    name_key: &str,
    url_key: &str,
    images: Vec<Value>,
    offer: Value,
) -> RawRecord {
    let mut record = Map::new();
    if let Some(id) = id {
        record.insert("productID".to_owned(), id);
    }
    // `name` must be a string for format detection; a missing name is
    // reported by the normalizer, not dropped here.
    record.insert(
        "name".to_owned(),
        Value::String(str_field(item, name_key).unwrap_or_default()),
    );
    insert_opt(&mut record, "description", str_field(item, "description"));
    insert_opt(&mut record, "sku", str_field(item, "sku"));
    insert_opt(&mut record, "url", str_field(item, url_key));
    insert_opt(
        &mut record,
        "category",
        str_field(item, "category").or_else(|| str_field(item, "type")),
    );
    record.insert("image".to_owned(), Value::Array(images));
    record.insert("offers".to_owned(), offer);
    Value::Object(record)
}

fn str_field(item: &Value, key: &str) -> Option<String> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Collects image URLs from string or string-array fields, in key order.
fn images(item: &Value, keys: &[&str]) -> Vec<Value> {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .flat_map(|v| match v {
            Value::Array(list) => list.clone(),
            Value::String(_) => vec![v.clone()],
            _ => Vec::new(),
        })
        .filter(|v| v.as_str().is_some_and(|s| !s.trim().is_empty()))
        .collect()
}

fn cents_to_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_i64)
        .map(|cents| Decimal::new(cents, 2).to_string())
}

fn decimal_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => n
            .as_f64()
            .and_then(|f| Decimal::try_from(f).ok())
            .map(|d| {
                let mut d = d.round_dp(2);
                d.rescale(2);
                d.to_string()
            }),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        _ => None,
    }
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: Option<String>) {
    if let Some(value) = value {
        map.insert(key.to_owned(), Value::String(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dialect_parses_known_names() {
        assert_eq!(
            "paged-catalog".parse::<ApiDialect>(),
            Ok(ApiDialect::PagedCatalog)
        );
        assert_eq!("flat-feed".parse::<ApiDialect>(), Ok(ApiDialect::FlatFeed));
        assert_eq!("soap".parse::<ApiDialect>(), Err("soap".to_owned()));
    }

    #[test]
    fn paged_catalog_converts_cents_to_decimal_text() {
        let record = paged_catalog_record(&json!({
            "id": 501,
            "name": "Merino Crewneck Sweater",
            "price_cents": 12800,
            "sale_price_cents": 9600,
            "currency": "USD",
            "images": ["https://cdn.northwind.example/1.jpg", ""],
            "url": "/products/merino-crewneck",
            "in_stock": false,
            "category": null
        }));
        assert_eq!(record["productID"], json!(501));
        assert_eq!(record["name"], json!("Merino Crewneck Sweater"));
        assert_eq!(record["offers"]["price"], json!("128.00"));
        assert_eq!(record["offers"]["salePrice"], json!("96.00"));
        assert_eq!(record["offers"]["availability"], json!(false));
        assert_eq!(record["image"], json!(["https://cdn.northwind.example/1.jpg"]));
        assert!(record.get("category").is_none());
    }

    #[test]
    fn flat_feed_tolerates_nulls_and_numbers() {
        let record = flat_feed_record(&json!({
            "handle": "cotton-tee",
            "title": "Cotton Tee",
            "price": 35.5,
            "sale_price": null,
            "image_url": "https://cdn.fable.example/tee.jpg",
            "gallery": ["https://cdn.fable.example/tee-2.jpg"],
            "link": "https://fableandthread.example/p/cotton-tee",
            "type": "T-Shirts"
        }));
        assert_eq!(record["productID"], json!("cotton-tee"));
        assert_eq!(record["offers"]["price"], json!("35.50"));
        assert!(record["offers"].get("salePrice").is_none());
        assert_eq!(record["offers"]["availability"], json!(true));
        assert_eq!(record["category"], json!("T-Shirts"));
        assert_eq!(
            record["image"],
            json!([
                "https://cdn.fable.example/tee.jpg",
                "https://cdn.fable.example/tee-2.jpg"
            ])
        );
    }

    #[test]
    fn converted_records_normalize() {
        use crate::normalize::{normalize, NormalizeContext};

        let record = flat_feed_record(&json!({
            "handle": "cotton-tee",
            "title": "Cotton Tee",
            "price": "35.00",
            "sale_price": "28.00",
            "image_url": "https://cdn.fable.example/tee.jpg",
            "link": "/p/cotton-tee",
            "currency": "EUR"
        }));
        let ctx = NormalizeContext {
            brand_id: 4,
            storefront_url: "https://fableandthread.example",
            default_currency: "USD",
        };
        let product = normalize(&record, &ctx).unwrap();
        assert_eq!(product.external_id, "cotton-tee");
        assert_eq!(product.price, Decimal::new(3500, 2));
        assert_eq!(product.sale_price, Some(Decimal::new(2800, 2)));
        assert_eq!(product.currency, "EUR");
        assert_eq!(product.product_url, "https://fableandthread.example/p/cotton-tee");
    }
}
