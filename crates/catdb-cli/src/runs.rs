//! `catdb runs` listing.

use std::collections::HashMap;
use std::fmt::Write as _;

use anyhow::Context;
use catdb_core::{RunLogStore, ScrapeRun};
use sqlx::PgPool;

pub(crate) async fn run_list_runs(
    pool: PgPool,
    brand: Option<&str>,
    limit: u32,
) -> anyhow::Result<()> {
    let store = catdb_db::PgStore::new(pool);

    let mut slugs: HashMap<i64, String> = store
        .list_active_brands()
        .await
        .context("failed to list brands")?
        .into_iter()
        .map(|b| (b.id, b.slug))
        .collect();

    let brand_id = match brand {
        Some(slug) => {
            let found = store
                .get_brand_by_slug(slug)
                .await
                .context("failed to look up brand")?
                .ok_or_else(|| anyhow::anyhow!("brand '{slug}' not found"))?;
            slugs.insert(found.id, found.slug);
            Some(found.id)
        }
        None => None,
    };

    let runs = store
        .list_recent_runs(brand_id, limit)
        .await
        .context("failed to list scrape runs")?;
    print!("{}", render_runs(&runs, &slugs));
    Ok(())
}

pub(crate) fn render_runs(runs: &[ScrapeRun], slugs: &HashMap<i64, String>) -> String {
    if runs.is_empty() {
        return "no scrape runs recorded\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>6}  {:<20}  {:<8}  {:<20}  {:>6}  {:>7}  {:>6}  {:>8}",
        "RUN", "BRAND", "STATUS", "STARTED", "ADDED", "UPDATED", "FAILED", "ELAPSED"
    );
    for run in runs {
        let brand = slugs
            .get(&run.brand_id)
            .cloned()
            .unwrap_or_else(|| format!("#{}", run.brand_id));
        let elapsed = run
            .execution_time_seconds
            .map_or_else(|| "-".to_string(), |secs| format!("{secs:.1}s"));
        let _ = writeln!(
            out,
            "{:>6}  {:<20}  {:<8}  {:<20}  {:>6}  {:>7}  {:>6}  {:>8}",
            run.id,
            brand,
            run.status.as_str(),
            run.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            run.counts.added,
            run.counts.updated,
            run.counts.failed,
            elapsed,
        );
        if let Some(message) = &run.error_message {
            let _ = writeln!(out, "        {message}");
        }
    }
    out
}
