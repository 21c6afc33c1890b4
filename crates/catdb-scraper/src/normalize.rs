//! Format detection and normalization from raw source records to
//! [`catdb_core::NormalizedProduct`].
//!
//! Classification is not applied here; the sync pipeline runs the taxonomy
//! classifier on the normalized product.

use std::str::FromStr;
use std::sync::LazyLock;

use catdb_core::{slugify, Brand, NormalizedProduct, NormalizedVariant};
use chrono::Utc;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::client::extract_store_origin;
use crate::error::NormalizeError;
use crate::types::{CatalogProduct, CatalogVariant, ImageRef, PriceValue, StructuredProduct};

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Shape of a raw record, decided structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// `title` + `variants` array.
    NativeCatalog,
    /// `name` + `offers`.
    StructuredData,
    Unknown,
}

/// How a bare JSON integer price is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceUnit {
    /// `8900` is 89.00.
    Minor,
    /// `89` is 89.00.
    Major,
}

/// Brand-level facts the normalizer needs but raw records may omit.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext<'a> {
    pub brand_id: i64,
    /// Base for resolving relative product URLs and handle-only records.
    pub storefront_url: &'a str,
    pub default_currency: &'a str,
}

impl<'a> NormalizeContext<'a> {
    #[must_use]
    pub fn for_brand(brand: &'a Brand) -> Self {
        Self {
            brand_id: brand.id,
            storefront_url: &brand.storefront_url,
            default_currency: brand.default_currency(),
        }
    }
}

#[must_use]
pub fn detect(raw: &Value) -> RecordFormat {
    let Some(obj) = raw.as_object() else {
        return RecordFormat::Unknown;
    };

    if obj.get("title").is_some_and(Value::is_string)
        && obj.get("variants").is_some_and(Value::is_array)
    {
        return RecordFormat::NativeCatalog;
    }

    if obj.get("name").is_some_and(Value::is_string)
        && obj
            .get("offers")
            .is_some_and(|o| o.is_object() || o.is_array())
    {
        return RecordFormat::StructuredData;
    }

    RecordFormat::Unknown
}

/// Detects the record's format and maps it to a [`NormalizedProduct`] with
/// no classification.
///
/// # Errors
///
/// - [`NormalizeError::UnrecognizedFormat`] when [`detect`] returns `Unknown`.
/// - [`NormalizeError::MissingField`] when name, price, image, or product URL
///   cannot be determined.
/// - [`NormalizeError::InvalidPrice`] when a price does not parse or is negative.
/// - [`NormalizeError::Malformed`] when a field has the wrong JSON type.
pub fn normalize(
    raw: &Value,
    ctx: &NormalizeContext<'_>,
) -> Result<NormalizedProduct, NormalizeError> {
    match detect(raw) {
        RecordFormat::NativeCatalog => normalize_catalog(typed(raw)?, ctx),
        RecordFormat::StructuredData => normalize_structured(typed(raw)?, ctx),
        RecordFormat::Unknown => Err(NormalizeError::UnrecognizedFormat),
    }
}

fn typed<T: serde::de::DeserializeOwned>(raw: &Value) -> Result<T, NormalizeError> {
    T::deserialize(raw).map_err(|e| NormalizeError::Malformed(e.to_string()))
}

fn normalize_catalog(
    product: CatalogProduct,
    ctx: &NormalizeContext<'_>,
) -> Result<NormalizedProduct, NormalizeError> {
    let name = non_empty(product.title.as_deref()).ok_or(NormalizeError::MissingField("name"))?;

    // Price comes from the first variant; its previous price, when positive,
    // is kept as the comparison price.
    let first = product
        .variants
        .first()
        .ok_or(NormalizeError::MissingField("price"))?;
    let price = optional_price(first.price.as_ref(), PriceUnit::Minor, "price")?
        .ok_or(NormalizeError::MissingField("price"))?;
    let sale_price = optional_price(first.compare_at_price.as_ref(), PriceUnit::Minor, "compare_at_price")?
        .filter(|previous| *previous > Decimal::ZERO);

    let mut images: Vec<&ImageRef> = product.images.iter().collect();
    if images.is_empty() {
        images.extend(product.image.as_ref());
    }
    let (image_url, additional_images) =
        split_images(images.into_iter().map(ImageRef::url).map(str::to_owned).collect())?;

    let product_url = match (non_empty(product.url.as_deref()), non_empty(product.handle.as_deref())) {
        (Some(url), _) => resolve(ctx.storefront_url, &url),
        (None, Some(handle)) => format!(
            "{}/products/{handle}",
            extract_store_origin(ctx.storefront_url)
        ),
        (None, None) => return Err(NormalizeError::MissingField("product_url")),
    };

    let external_id = match product.id.as_ref().map(ToString::to_string) {
        Some(id) if !id.is_empty() => id,
        _ => synthesize_external_id(first.sku.as_deref(), &product_url, &name),
    };

    let variants = product
        .variants
        .iter()
        .enumerate()
        .map(|(idx, v)| catalog_variant(v, idx, &external_id))
        .collect::<Result<Vec<_>, _>>()?;
    let is_available = variants.iter().any(|v| v.in_stock);

    Ok(NormalizedProduct {
        brand_id: ctx.brand_id,
        external_id,
        name,
        description: product.body_html.as_deref().and_then(strip_html),
        product_type: non_empty(product.product_type.as_deref()),
        price,
        sale_price,
        currency: currency_or(product.currency.as_deref(), ctx.default_currency),
        image_url,
        additional_images,
        product_url,
        variants,
        is_available,
        classification: None,
        last_checked_at: Utc::now(),
    })
}

fn catalog_variant(
    variant: &CatalogVariant,
    idx: usize,
    external_id: &str,
) -> Result<NormalizedVariant, NormalizeError> {
    Ok(NormalizedVariant {
        id: variant
            .id
            .as_ref()
            .map_or_else(|| format!("{external_id}-{}", idx + 1), ToString::to_string),
        title: non_empty(variant.title.as_deref()).unwrap_or_else(|| "Default".to_string()),
        sku: non_empty(variant.sku.as_deref()),
        price: optional_price(variant.price.as_ref(), PriceUnit::Minor, "variant price")?,
        compare_at_price: optional_price(
            variant.compare_at_price.as_ref(),
            PriceUnit::Minor,
            "variant compare_at_price",
        )?
        .filter(|p| *p > Decimal::ZERO),
        in_stock: variant.is_in_stock(),
    })
}

fn normalize_structured(
    product: StructuredProduct,
    ctx: &NormalizeContext<'_>,
) -> Result<NormalizedProduct, NormalizeError> {
    let name = non_empty(product.name.as_deref()).ok_or(NormalizeError::MissingField("name"))?;

    let offers = product
        .offers
        .as_ref()
        .map(|o| o.as_slice())
        .unwrap_or_default();
    let first = offers.first().ok_or(NormalizeError::MissingField("price"))?;
    let listed = optional_price(first.price.as_ref(), PriceUnit::Major, "offers.price")?
        .ok_or(NormalizeError::MissingField("price"))?;
    let sale = optional_price(first.sale_price.as_ref(), PriceUnit::Major, "offers.salePrice")?;
    let (price, sale_price) = order_prices(listed, sale);

    let (image_url, additional_images) = split_images(
        product
            .image
            .as_ref()
            .map(crate::types::ImageField::urls)
            .unwrap_or_default(),
    )?;

    let product_url = non_empty(product.url.as_deref())
        .map(|url| resolve(ctx.storefront_url, &url))
        .ok_or(NormalizeError::MissingField("product_url"))?;

    let sku = non_empty(product.sku.as_deref()).or_else(|| non_empty(first.sku.as_deref()));
    let external_id = match product.product_id.as_ref().map(ToString::to_string) {
        Some(id) if !id.is_empty() => id,
        _ => synthesize_external_id(sku.as_deref(), &product_url, &name),
    };

    let mut variants = Vec::with_capacity(offers.len());
    for (idx, offer) in offers.iter().enumerate() {
        let listed = optional_price(offer.price.as_ref(), PriceUnit::Major, "offers.price")?;
        let sale = optional_price(offer.sale_price.as_ref(), PriceUnit::Major, "offers.salePrice")?;
        let (current, previous) = match listed {
            Some(listed) => {
                let (regular, discounted) = order_prices(listed, sale);
                match discounted {
                    Some(d) => (Some(d), Some(regular)),
                    None => (Some(regular), None),
                }
            }
            None => (sale, None),
        };
        let offer_sku = non_empty(offer.sku.as_deref());
        variants.push(NormalizedVariant {
            id: offer_sku
                .clone()
                .unwrap_or_else(|| format!("{external_id}-{}", idx + 1)),
            title: non_empty(offer.name.as_deref()).unwrap_or_else(|| "Default".to_string()),
            sku: offer_sku,
            price: current,
            compare_at_price: previous,
            in_stock: offer.availability.as_ref().is_none_or(|a| a.is_in_stock()),
        });
    }
    let is_available = variants.iter().any(|v| v.in_stock);

    Ok(NormalizedProduct {
        brand_id: ctx.brand_id,
        external_id,
        name,
        description: product.description.as_deref().and_then(strip_html),
        product_type: non_empty(product.category.as_deref()),
        price,
        sale_price,
        currency: currency_or(first.price_currency.as_deref(), ctx.default_currency),
        image_url,
        additional_images,
        product_url,
        variants,
        is_available,
        classification: None,
        last_checked_at: Utc::now(),
    })
}

/// Orders a listed price and an optional sale price so the sale price is the
/// lower of the two. Equal prices mean no sale.
fn order_prices(listed: Decimal, sale: Option<Decimal>) -> (Decimal, Option<Decimal>) {
    match sale {
        Some(sale) if sale < listed => (listed, Some(sale)),
        Some(sale) if sale > listed => (sale, Some(listed)),
        _ => (listed, None),
    }
}

/// Deterministic fallback identity: SKU, else the last two URL path
/// segments, else the slugified name.
#[must_use]
pub fn synthesize_external_id(sku: Option<&str>, product_url: &str, name: &str) -> String {
    if let Some(sku) = sku.map(str::trim).filter(|s| !s.is_empty()) {
        return sku.to_string();
    }

    let segments = url_path_segments(product_url);
    if !segments.is_empty() {
        let start = segments.len().saturating_sub(2);
        return segments[start..].join("-");
    }

    slugify(name)
}

fn url_path_segments(url: &str) -> Vec<String> {
    let path = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.path().to_owned(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_owned(),
    };
    path.split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Index 0 is the primary image; the rest keep source order.
fn split_images(mut urls: Vec<String>) -> Result<(String, Vec<String>), NormalizeError> {
    urls.retain(|u| !u.trim().is_empty());
    if urls.is_empty() {
        return Err(NormalizeError::MissingField("image"));
    }
    let primary = urls.remove(0);
    Ok((primary, urls))
}

fn optional_price(
    value: Option<&PriceValue>,
    unit: PriceUnit,
    field: &'static str,
) -> Result<Option<Decimal>, NormalizeError> {
    value.map_or(Ok(None), |v| parse_price(v, unit, field))
}

/// Parses a price; `Ok(None)` for a blank string. `unit` applies only to
/// bare integers.
///
/// # Errors
///
/// Returns [`NormalizeError::InvalidPrice`] for unparseable or negative values.
pub fn parse_price(
    value: &PriceValue,
    unit: PriceUnit,
    field: &'static str,
) -> Result<Option<Decimal>, NormalizeError> {
    let invalid = |raw: String| NormalizeError::InvalidPrice { field, value: raw };

    let price = match value {
        PriceValue::Integer(n) => match unit {
            PriceUnit::Minor => Decimal::new(*n, 2),
            PriceUnit::Major => {
                let mut major = Decimal::from(*n);
                major.rescale(2);
                major
            }
        },
        PriceValue::Major(major) => Decimal::try_from(*major)
            .map_err(|_| invalid(major.to_string()))?
            .round_dp(2),
        PriceValue::Text(text) => {
            let Some(cleaned) = clean_price_text(text) else {
                return Ok(None);
            };
            Decimal::from_str(&cleaned).map_err(|_| invalid(text.clone()))?
        }
    };

    if price.is_sign_negative() {
        return Err(invalid(price.to_string()));
    }
    Ok(Some(price))
}

/// Drops currency symbols and thousands separators. A lone comma followed by
/// exactly two digits is read as a decimal separator (`"89,00"`).
fn clean_price_text(text: &str) -> Option<String> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    if kept.is_empty() {
        return None;
    }

    let decimal_comma = !kept.contains('.')
        && kept.matches(',').count() == 1
        && kept.rsplit(',').next().is_some_and(|tail| tail.len() == 2);
    Some(if decimal_comma {
        kept.replace(',', ".")
    } else {
        kept.replace(',', "")
    })
}

/// Removes markup, decodes common entities, and collapses whitespace.
/// Returns `None` when nothing but whitespace remains.
#[must_use]
pub fn strip_html(html: &str) -> Option<String> {
    let text = TAG_RE.replace_all(html, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'");
    let collapsed = WHITESPACE_RE.replace_all(text.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn currency_or(value: Option<&str>, default: &str) -> String {
    non_empty(value).map_or_else(|| default.to_ascii_uppercase(), |c| c.to_ascii_uppercase())
}

fn resolve(base: &str, url: &str) -> String {
    crate::client::resolve_url(base, url).unwrap_or_else(|_| url.to_owned())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
