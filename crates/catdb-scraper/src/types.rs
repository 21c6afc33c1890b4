//! Typed views over the two raw record shapes the normalizer understands.
//!
//! Adapters emit opaque `serde_json::Value`s; the normalizer detects the
//! shape and then deserializes into one of these views.
//!
//! ### Prices
//! Sources disagree on price encoding. A JSON integer means minor units
//! (`8900` is 89.00) in the native catalog shape and major units (`89` is
//! 89.00) in structured data. A JSON float or a string is always major units
//! (`89.5`, `"89.00"`, `"$1,299.00"`).
//!
//! ### Identifiers
//! Ids arrive as numbers on some storefronts and strings on others; both are
//! accepted and compared as strings.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Integer(i64),
    Major(f64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Int(i64),
    Text(String),
}

impl std::fmt::Display for IdValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdValue::Int(n) => write!(f, "{n}"),
            IdValue::Text(s) => f.write_str(s.trim()),
        }
    }
}

/// An image given as a bare URL or as an object with `src`/`url`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Url(String),
    Object {
        #[serde(alias = "url", alias = "contentUrl")]
        src: String,
    },
}

impl ImageRef {
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            ImageRef::Url(u) | ImageRef::Object { src: u } => u.trim(),
        }
    }
}

/// One image or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImageField {
    Many(Vec<ImageRef>),
    One(ImageRef),
}

impl ImageField {
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        let refs: Vec<&ImageRef> = match self {
            ImageField::Many(list) => list.iter().collect(),
            ImageField::One(one) => vec![one],
        };
        refs.into_iter()
            .map(ImageRef::url)
            .filter(|u| !u.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// Storefront catalog product: `title` plus a `variants` array.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogProduct {
    #[serde(default)]
    pub id: Option<IdValue>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default, alias = "description")]
    pub body_html: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub variants: Vec<CatalogVariant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogVariant {
    #[serde(default)]
    pub id: Option<IdValue>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    /// Current price.
    #[serde(default)]
    pub price: Option<PriceValue>,
    /// Previous (pre-discount) price.
    #[serde(default, alias = "previous_price")]
    pub compare_at_price: Option<PriceValue>,
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default)]
    pub in_stock: Option<bool>,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
}

impl CatalogVariant {
    /// Explicit stock flags win; otherwise a positive inventory count;
    /// otherwise assume in stock.
    #[must_use]
    pub fn is_in_stock(&self) -> bool {
        self.available
            .or(self.in_stock)
            .or(self.inventory_quantity.map(|q| q > 0))
            .unwrap_or(true)
    }
}

/// Structured-data product: `name` plus `offers`, schema.org style.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredProduct {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "productID", alias = "product_id")]
    pub product_id: Option<IdValue>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default, alias = "product_url")]
    pub url: Option<String>,
    #[serde(default)]
    pub image: Option<ImageField>,
    #[serde(default, alias = "product_type")]
    pub category: Option<String>,
    #[serde(default)]
    pub offers: Option<OffersField>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OffersField {
    Many(Vec<Offer>),
    One(Offer),
}

impl OffersField {
    #[must_use]
    pub fn as_slice(&self) -> &[Offer] {
        match self {
            OffersField::Many(list) => list,
            OffersField::One(one) => std::slice::from_ref(one),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default, alias = "lowPrice")]
    pub price: Option<PriceValue>,
    #[serde(default, alias = "sale_price")]
    pub sale_price: Option<PriceValue>,
    #[serde(default, alias = "currency")]
    pub price_currency: Option<String>,
    #[serde(default)]
    pub availability: Option<Availability>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Availability {
    Flag(bool),
    /// schema.org URL or bare label, e.g. `"https://schema.org/InStock"`.
    Label(String),
}

impl Availability {
    #[must_use]
    pub fn is_in_stock(&self) -> bool {
        match self {
            Availability::Flag(b) => *b,
            Availability::Label(label) => {
                let label = label.to_ascii_lowercase();
                let label = label.rsplit('/').next().unwrap_or_default();
                matches!(
                    label.trim(),
                    "instock" | "in_stock" | "in stock" | "limitedavailability" | "onlineonly"
                )
            }
        }
    }
}
