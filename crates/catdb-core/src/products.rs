use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product in canonical, source-agnostic form, ready for the upsert engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProduct {
    pub brand_id: i64,
    /// Brand-scoped identifier: the source's own id when it has one, otherwise
    /// synthesized deterministically from the record.
    pub external_id: String,
    pub name: String,
    /// Plain text; markup is stripped during normalization.
    pub description: Option<String>,
    /// Source-provided product type, used as a classification hint.
    pub product_type: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    /// ISO 4217 currency code (e.g., `"USD"`).
    pub currency: String,
    pub image_url: String,
    /// Remaining source images in source order, never including `image_url`'s slot.
    pub additional_images: Vec<String>,
    pub product_url: String,
    pub variants: Vec<NormalizedVariant>,
    pub is_available: bool,
    /// `None` when the classifier found no matching category.
    pub classification: Option<Classification>,
    pub last_checked_at: DateTime<Utc>,
}

impl NormalizedProduct {
    /// Taxonomy ids to associate with this product: the matched category and
    /// every ancestor, root first. Empty when unclassified.
    #[must_use]
    pub fn category_ids(&self) -> Vec<String> {
        self.classification
            .as_ref()
            .map(Classification::lineage_ids)
            .unwrap_or_default()
    }
}

/// A single purchasable variant of a [`NormalizedProduct`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedVariant {
    pub id: String,
    pub title: String,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    /// Pre-discount comparison price, if the source reports one.
    pub compare_at_price: Option<Decimal>,
    pub in_stock: bool,
}

/// Classification fields copied onto a product from the matched taxonomy category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category_id: String,
    pub category_name: String,
    /// Ancestor chain joined with `" > "`, ending in `category_name`.
    pub taxonomy_path: String,
    pub depth: u8,
}

impl Classification {
    /// Returns the category id and all ancestor ids implied by its nesting,
    /// root first (`"aa-1-4"` yields `["aa", "aa-1", "aa-1-4"]`).
    #[must_use]
    pub fn lineage_ids(&self) -> Vec<String> {
        let segments: Vec<&str> = self.category_id.split('-').collect();
        (1..=segments.len())
            .map(|n| segments[..n].join("-"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_product() -> NormalizedProduct {
        NormalizedProduct {
            brand_id: 1,
            external_id: "7001".to_string(),
            name: "Linen Mini Dress".to_string(),
            description: None,
            product_type: Some("Dresses".to_string()),
            price: Decimal::new(8900, 2),
            sale_price: None,
            currency: "USD".to_string(),
            image_url: "https://cdn.example.com/1.jpg".to_string(),
            additional_images: vec![],
            product_url: "https://example.com/products/linen-mini-dress".to_string(),
            variants: vec![],
            is_available: true,
            classification: None,
            last_checked_at: Utc::now(),
        }
    }

    #[test]
    fn lineage_ids_walk_every_prefix() {
        let classification = Classification {
            category_id: "aa-1-4-1".to_string(),
            category_name: "Mini Dresses".to_string(),
            taxonomy_path: "Apparel & Accessories > Clothing > Dresses > Mini Dresses"
                .to_string(),
            depth: 4,
        };
        assert_eq!(
            classification.lineage_ids(),
            vec!["aa", "aa-1", "aa-1-4", "aa-1-4-1"]
        );
    }

    #[test]
    fn category_ids_empty_when_unclassified() {
        let product = make_product();
        assert!(product.category_ids().is_empty());
    }
}
