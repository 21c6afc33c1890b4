use catdb_core::BrandConfig;
use sqlx::{types::Json, PgPool};

use crate::DbError;

/// Upsert brands from config into the database, keyed by slug.
///
/// Returns the number of brands processed (inserted or updated).
/// All upserts run inside a single transaction; if any operation fails
/// the entire batch is rolled back. `last_synced_at` is never touched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_brands(pool: &PgPool, brands: &[BrandConfig]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for brand in brands {
        let slug = brand.slug();
        let source_kind = brand.source_kind.map(|kind| kind.as_str());

        sqlx::query(
            "INSERT INTO brands (name, slug, storefront_url, source_kind, source_config, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (slug) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 storefront_url = EXCLUDED.storefront_url, \
                 source_kind = EXCLUDED.source_kind, \
                 source_config = EXCLUDED.source_config, \
                 is_active = EXCLUDED.is_active, \
                 updated_at = NOW()",
        )
        .bind(&brand.name)
        .bind(&slug)
        .bind(&brand.storefront_url)
        .bind(source_kind)
        .bind(Json(&brand.source_config))
        .bind(brand.active)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
