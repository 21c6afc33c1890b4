//! Database operations for the `scrape_runs` run log.
//!
//! A run is created `running` and finished exactly once; the finish update is
//! guarded on the current status so a second finish fails instead of
//! overwriting the first outcome.

use catdb_core::{RunCounts, RunOutcome, RunStatus, ScrapeRun};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{count_from_i32, count_to_i32, DbError};

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `scrape_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapeRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub brand_id: i64,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub products_added: i32,
    pub products_updated: i32,
    pub products_failed: i32,
    pub execution_time_seconds: Option<f64>,
    pub error_message: Option<String>,
    pub dataset_id: Option<String>,
}

impl ScrapeRunRow {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidColumn`] if `status` is not a known run status.
    pub fn into_run(self) -> Result<ScrapeRun, DbError> {
        let status = self
            .status
            .parse::<RunStatus>()
            .map_err(|reason| DbError::InvalidColumn {
                column: "status",
                reason,
            })?;

        Ok(ScrapeRun {
            id: self.id,
            brand_id: self.brand_id,
            status,
            started_at: self.started_at,
            completed_at: self.completed_at,
            counts: RunCounts {
                added: count_from_i32(self.products_added),
                updated: count_from_i32(self.products_updated),
                failed: count_from_i32(self.products_failed),
            },
            execution_time_seconds: self.execution_time_seconds,
            error_message: self.error_message,
            dataset_id: self.dataset_id,
        })
    }
}

const RUN_COLUMNS: &str = "id, public_id, brand_id, status, started_at, completed_at, \
                           products_added, products_updated, products_failed, \
                           execution_time_seconds, error_message, dataset_id";

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Opens a run for `brand_id` in `running` state.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including an unknown brand).
pub async fn create_scrape_run(pool: &PgPool, brand_id: i64) -> Result<ScrapeRunRow, DbError> {
    let row = sqlx::query_as::<_, ScrapeRunRow>(&format!(
        "INSERT INTO scrape_runs (brand_id, status, started_at) \
         VALUES ($1, 'running', NOW()) \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(brand_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Writes the terminal state of a run.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run does not exist or is
/// no longer `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn finish_scrape_run(
    pool: &PgPool,
    run_id: i64,
    outcome: &RunOutcome,
) -> Result<(), DbError> {
    if !outcome.status.is_terminal() {
        return Err(DbError::InvalidRunTransition { run_id });
    }

    let result = sqlx::query(
        "UPDATE scrape_runs SET \
             status = $2, \
             completed_at = $3, \
             products_added = $4, \
             products_updated = $5, \
             products_failed = $6, \
             execution_time_seconds = $7, \
             error_message = $8, \
             dataset_id = $9 \
         WHERE id = $1 AND status = 'running'",
    )
    .bind(run_id)
    .bind(outcome.status.as_str())
    .bind(outcome.completed_at)
    .bind(count_to_i32(outcome.counts.added))
    .bind(count_to_i32(outcome.counts.updated))
    .bind(count_to_i32(outcome.counts.failed))
    .bind(outcome.execution_time_seconds)
    .bind(&outcome.error_message)
    .bind(&outcome.dataset_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition { run_id });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::NotFound`] if no run has `run_id`, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_scrape_run(pool: &PgPool, run_id: i64) -> Result<ScrapeRunRow, DbError> {
    sqlx::query_as::<_, ScrapeRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM scrape_runs WHERE id = $1"
    ))
    .bind(run_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Most recent runs first, optionally limited to one brand.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_runs(
    pool: &PgPool,
    brand_id: Option<i64>,
    limit: u32,
) -> Result<Vec<ScrapeRunRow>, DbError> {
    let rows = sqlx::query_as::<_, ScrapeRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM scrape_runs \
         WHERE ($1::BIGINT IS NULL OR brand_id = $1) \
         ORDER BY started_at DESC, id DESC \
         LIMIT $2"
    ))
    .bind(brand_id)
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> ScrapeRunRow {
        ScrapeRunRow {
            id: 11,
            public_id: Uuid::new_v4(),
            brand_id: 2,
            status: status.to_string(),
            started_at: Utc::now(),
            completed_at: None,
            products_added: 7,
            products_updated: 1,
            products_failed: 3,
            execution_time_seconds: Some(4.5),
            error_message: Some("3 of 11 records failed".to_string()),
            dataset_id: None,
        }
    }

    #[test]
    fn into_run_maps_counts_and_status() {
        let run = row("partial").into_run().unwrap();
        assert_eq!(run.status, RunStatus::Partial);
        assert_eq!(
            run.counts,
            RunCounts {
                added: 7,
                updated: 1,
                failed: 3
            }
        );
        assert_eq!(run.execution_time_seconds, Some(4.5));
    }

    #[test]
    fn into_run_rejects_unknown_status() {
        let err = row("queued").into_run().unwrap_err();
        assert!(matches!(err, DbError::InvalidColumn { column: "status", .. }));
    }
}
