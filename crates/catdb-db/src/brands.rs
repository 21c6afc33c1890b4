//! Database operations for the `brands` table.

use catdb_core::{Brand, SourceConfig, SourceKind};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `brands` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub slug: String,
    pub storefront_url: String,
    pub source_kind: Option<String>,
    pub source_config: serde_json::Value,
    pub is_active: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BrandRow {
    /// Converts the row into the domain type, parsing the adapter kind and
    /// its JSON settings.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidColumn`] if `source_kind` or
    /// `source_config` cannot be interpreted.
    pub fn into_brand(self) -> Result<Brand, DbError> {
        let source_kind = self
            .source_kind
            .as_deref()
            .map(str::parse::<SourceKind>)
            .transpose()
            .map_err(|reason| DbError::InvalidColumn {
                column: "source_kind",
                reason,
            })?;
        let source_config =
            SourceConfig::from_json(&self.source_config).map_err(|e| DbError::InvalidColumn {
                column: "source_config",
                reason: e.to_string(),
            })?;

        Ok(Brand {
            id: self.id,
            slug: self.slug,
            name: self.name,
            storefront_url: self.storefront_url,
            source_kind,
            source_config,
            active: self.is_active,
            last_synced_at: self.last_synced_at,
        })
    }
}

const BRAND_COLUMNS: &str = "id, public_id, name, slug, storefront_url, source_kind, \
                             source_config, is_active, last_synced_at, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all active brands, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_brands(pool: &PgPool) -> Result<Vec<BrandRow>, DbError> {
    let rows = sqlx::query_as::<_, BrandRow>(&format!(
        "SELECT {BRAND_COLUMNS} FROM brands WHERE is_active = true ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a brand by slug whether or not it is active, or `None` if no row
/// matches.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_brand_by_slug(pool: &PgPool, slug: &str) -> Result<Option<BrandRow>, DbError> {
    let row = sqlx::query_as::<_, BrandRow>(&format!(
        "SELECT {BRAND_COLUMNS} FROM brands WHERE slug = $1"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Stamps `last_synced_at` on a brand.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no brand has `brand_id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn mark_brand_synced(
    pool: &PgPool,
    brand_id: i64,
    at: DateTime<Utc>,
) -> Result<(), DbError> {
    let result =
        sqlx::query("UPDATE brands SET last_synced_at = $2, updated_at = NOW() WHERE id = $1")
            .bind(brand_id)
            .bind(at)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(source_kind: Option<&str>, source_config: serde_json::Value) -> BrandRow {
        BrandRow {
            id: 3,
            public_id: Uuid::new_v4(),
            name: "Fable Thread".to_string(),
            slug: "fable-thread".to_string(),
            storefront_url: "https://fablethread.example".to_string(),
            source_kind: source_kind.map(str::to_string),
            source_config,
            is_active: true,
            last_synced_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn into_brand_parses_kind_and_config() {
        let brand = row(
            Some("brand-api"),
            serde_json::json!({ "api_dialect": "flat-feed", "currency": "EUR" }),
        )
        .into_brand()
        .unwrap();

        assert_eq!(brand.source_kind, Some(SourceKind::BrandApi));
        assert_eq!(brand.source_config.api_dialect.as_deref(), Some("flat-feed"));
        assert_eq!(brand.default_currency(), "EUR");
        assert!(brand.active);
    }

    #[test]
    fn into_brand_allows_missing_kind() {
        let brand = row(None, serde_json::json!({})).into_brand().unwrap();
        assert!(brand.source_kind.is_none());
    }

    #[test]
    fn into_brand_rejects_unknown_kind() {
        let err = row(Some("carrier-pigeon"), serde_json::json!({}))
            .into_brand()
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::InvalidColumn {
                column: "source_kind",
                ..
            }
        ));
    }
}
