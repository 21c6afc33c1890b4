//! `catdb sync` handler and sweep summary rendering.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Context;
use catdb_core::AppConfig;
use catdb_scraper::{ScraperSettings, SourceRegistry};
use catdb_sync::{SweepSummary, SyncOptions, SyncOrchestrator, SyncSettings, SyncTarget};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Runs a sweep and prints its summary table. Ctrl-C stops the sweep at the
/// next record boundary and the current brand's run is still finalized; a
/// second Ctrl-C exits immediately.
pub(crate) async fn run_sync(
    pool: PgPool,
    config: &AppConfig,
    target: &str,
    options: SyncOptions,
) -> anyhow::Result<SweepSummary> {
    let sources = SourceRegistry::from_settings(&ScraperSettings::from_app_config(config))
        .context("failed to build source adapters")?;
    let store = Arc::new(catdb_db::PgStore::new(pool));

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if escalate_interrupt(&signal_token) {
                tracing::error!("second interrupt received; exiting without finalizing");
                std::process::exit(130);
            }
            tracing::warn!("interrupt received; stopping after the current record");
        }
    });

    let orchestrator = SyncOrchestrator::new(store, sources, SyncSettings::from_app_config(config))
        .with_cancellation(cancel);
    let summary = orchestrator
        .sweep(&SyncTarget::parse(target), options)
        .await
        .with_context(|| format!("sync {target} failed"))?;

    print!("{}", render_summary(&summary));
    Ok(summary)
}

/// Cancels `token` on the first interrupt; returns `true` on any later one.
pub(crate) fn escalate_interrupt(token: &CancellationToken) -> bool {
    if token.is_cancelled() {
        return true;
    }
    token.cancel();
    false
}

pub(crate) fn render_summary(summary: &SweepSummary) -> String {
    let mut out = String::new();
    if summary.dry_run {
        out.push_str("dry run: nothing was written\n");
    }

    let width = summary
        .brands
        .iter()
        .map(|r| r.slug.len())
        .max()
        .unwrap_or(0)
        .max("BRAND".len());

    let _ = writeln!(
        out,
        "{:<width$}  {:<8}  {:>6}  {:>7}  {:>6}  {:>8}",
        "BRAND", "STATUS", "ADDED", "UPDATED", "FAILED", "ELAPSED"
    );
    for report in &summary.brands {
        let _ = writeln!(
            out,
            "{:<width$}  {:<8}  {:>6}  {:>7}  {:>6}  {:>7.1}s",
            report.slug,
            report.status.as_str(),
            report.counts.added,
            report.counts.updated,
            report.counts.failed,
            report.elapsed_secs,
        );
    }

    let totals = summary.totals();
    let _ = writeln!(
        out,
        "{:<width$}  {:<8}  {:>6}  {:>7}  {:>6}",
        "TOTAL", "", totals.added, totals.updated, totals.failed
    );

    for report in summary.brands.iter().filter(|r| r.error.is_some()) {
        let _ = writeln!(
            out,
            "{}: {}",
            report.slug,
            report.error.as_deref().unwrap_or_default()
        );
    }
    if summary.skipped > 0 {
        let _ = writeln!(out, "cancelled: {} brand(s) not started", summary.skipped);
    }
    out
}
