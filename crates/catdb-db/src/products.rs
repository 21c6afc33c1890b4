//! Database operations for `products` and `product_categories`.

use catdb_core::NormalizedProduct;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, PgPool};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub brand_id: i64,
    pub external_id: String,
    pub name: String,
    pub description: Option<String>,
    pub product_type: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub currency: String,
    pub image_url: String,
    pub additional_images: Vec<String>,
    pub product_url: String,
    /// Serialized `NormalizedVariant` list.
    pub variants: serde_json::Value,
    pub is_available: bool,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub taxonomy_path: Option<String>,
    pub taxonomy_depth: Option<i16>,
    pub last_checked_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Returns the id of the brand's product with `external_id`, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_product_by_external_id(
    pool: &PgPool,
    brand_id: i64,
    external_id: &str,
) -> Result<Option<i64>, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM products WHERE brand_id = $1 AND external_id = $2",
    )
    .bind(brand_id)
    .bind(external_id)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Returns the id of the brand's product named exactly `name`, if any.
///
/// Names are not unique; the oldest row wins.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_product_by_name(
    pool: &PgPool,
    brand_id: i64,
    name: &str,
) -> Result<Option<i64>, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM products WHERE brand_id = $1 AND name = $2 ORDER BY id LIMIT 1",
    )
    .bind(brand_id)
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Fetches a full product row by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matches, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_product(pool: &PgPool, product_id: i64) -> Result<ProductRow, DbError> {
    sqlx::query_as::<_, ProductRow>(
        "SELECT id, brand_id, external_id, name, description, product_type, price, sale_price, \
                currency, image_url, additional_images, product_url, variants, is_available, \
                category_id, category_name, taxonomy_path, taxonomy_depth, last_checked_at, \
                created_at, updated_at \
         FROM products WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Category ids linked to a product, sorted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_product_categories(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<String>, DbError> {
    let ids = sqlx::query_scalar::<_, String>(
        "SELECT category_id FROM product_categories WHERE product_id = $1 ORDER BY category_id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts a new product and returns its id.
///
/// # Errors
///
/// Returns [`DbError::UniqueViolation`] when the brand already has a row with
/// the same `external_id`, or [`DbError::Sqlx`] for any other failure.
pub async fn insert_product(pool: &PgPool, product: &NormalizedProduct) -> Result<i64, DbError> {
    let classification = product.classification.as_ref();

    sqlx::query_scalar::<_, i64>(
        "INSERT INTO products (brand_id, external_id, name, description, product_type, \
                               price, sale_price, currency, image_url, additional_images, \
                               product_url, variants, is_available, category_id, category_name, \
                               taxonomy_path, taxonomy_depth, last_checked_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
         RETURNING id",
    )
    .bind(product.brand_id)
    .bind(&product.external_id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(&product.product_type)
    .bind(product.price)
    .bind(product.sale_price)
    .bind(&product.currency)
    .bind(&product.image_url)
    .bind(&product.additional_images)
    .bind(&product.product_url)
    .bind(Json(&product.variants))
    .bind(product.is_available)
    .bind(classification.map(|c| c.category_id.as_str()))
    .bind(classification.map(|c| c.category_name.as_str()))
    .bind(classification.map(|c| c.taxonomy_path.as_str()))
    .bind(classification.map(|c| i16::from(c.depth)))
    .bind(product.last_checked_at)
    .fetch_one(pool)
    .await
    .map_err(DbError::from_write)
}

/// Overwrites every mutable column of an existing product, `external_id`
/// included, so a row matched by name adopts the source's current id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the row is gone,
/// [`DbError::UniqueViolation`] if the new `external_id` collides with
/// another row of the same brand, or [`DbError::Sqlx`] otherwise.
pub async fn update_product(
    pool: &PgPool,
    product_id: i64,
    product: &NormalizedProduct,
) -> Result<(), DbError> {
    let classification = product.classification.as_ref();

    let result = sqlx::query(
        "UPDATE products SET \
             external_id = $2, \
             name = $3, \
             description = $4, \
             product_type = $5, \
             price = $6, \
             sale_price = $7, \
             currency = $8, \
             image_url = $9, \
             additional_images = $10, \
             product_url = $11, \
             variants = $12, \
             is_available = $13, \
             category_id = $14, \
             category_name = $15, \
             taxonomy_path = $16, \
             taxonomy_depth = $17, \
             last_checked_at = $18, \
             updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(product_id)
    .bind(&product.external_id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(&product.product_type)
    .bind(product.price)
    .bind(product.sale_price)
    .bind(&product.currency)
    .bind(&product.image_url)
    .bind(&product.additional_images)
    .bind(&product.product_url)
    .bind(Json(&product.variants))
    .bind(product.is_available)
    .bind(classification.map(|c| c.category_id.as_str()))
    .bind(classification.map(|c| c.category_name.as_str()))
    .bind(classification.map(|c| c.taxonomy_path.as_str()))
    .bind(classification.map(|c| i16::from(c.depth)))
    .bind(product.last_checked_at)
    .execute(pool)
    .await
    .map_err(DbError::from_write)?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Replaces a product's category links in one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either statement fails; the old links are
/// kept in that case.
pub async fn replace_product_categories(
    pool: &PgPool,
    product_id: i64,
    category_ids: &[String],
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM product_categories WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

    if !category_ids.is_empty() {
        sqlx::query(
            "INSERT INTO product_categories (product_id, category_id) \
             SELECT $1, unnest($2::text[]) \
             ON CONFLICT DO NOTHING",
        )
        .bind(product_id)
        .bind(category_ids)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
