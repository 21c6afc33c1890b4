//! Per-brand sync runs and multi-brand sweeps.
//!
//! Each brand goes `running → success | partial | failed` exactly once per
//! invocation. `failed` is reserved for problems before any record is
//! processed: an inactive brand, no adapter, or an adapter that could not
//! produce records. Once records flow, per-record failures only ever
//! downgrade the run to `partial`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use catdb_core::{
    AppConfig, Brand, CatalogStore, Classifier, RunCounts, RunLogStore, RunOutcome, RunStatus,
};
use catdb_scraper::{normalize, NormalizeContext, RawRecord, SourceRegistry};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::SyncError;
use crate::report::{BrandReport, SweepSummary};
use crate::upsert::UpsertEngine;

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub inter_brand_delay: Duration,
    /// Records normalized and upserted concurrently within one brand.
    pub record_workers: usize,
    /// Recency window applied by `--new-only`.
    pub new_only_days: u32,
}

impl SyncSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            inter_brand_delay: Duration::from_millis(config.sync_inter_brand_delay_ms),
            record_workers: config.sync_record_workers,
            new_only_days: config.new_only_days,
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            inter_brand_delay: Duration::from_millis(2000),
            record_workers: 4,
            new_only_days: 7,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    pub new_only: bool,
    /// Fetch, normalize and classify, but write nothing: no run log entry,
    /// no catalog rows, no `last_synced_at`.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncTarget {
    All,
    Brand(String),
}

impl SyncTarget {
    /// `"all"` (any case) targets every active brand; anything else is a slug.
    #[must_use]
    pub fn parse(arg: &str) -> Self {
        let arg = arg.trim();
        if arg.eq_ignore_ascii_case("all") {
            SyncTarget::All
        } else {
            SyncTarget::Brand(arg.to_owned())
        }
    }
}

#[derive(Debug)]
enum RecordResult {
    Added,
    Updated,
    Failed(String),
}

/// What happened to one brand, before it is written to the run log.
#[derive(Debug)]
struct Execution {
    status: RunStatus,
    counts: RunCounts,
    error: Option<String>,
    dataset_id: Option<String>,
}

impl Execution {
    fn failed(error: String) -> Self {
        Self {
            status: RunStatus::Failed,
            counts: RunCounts::default(),
            error: Some(error),
            dataset_id: None,
        }
    }
}

#[derive(Debug, Default)]
struct Processed {
    counts: RunCounts,
    cancelled: bool,
    first_error: Option<String>,
}

pub struct SyncOrchestrator<S> {
    store: Arc<S>,
    sources: SourceRegistry,
    classifier: Arc<Classifier>,
    settings: SyncSettings,
    cancel: CancellationToken,
}

impl<S> SyncOrchestrator<S>
where
    S: CatalogStore + RunLogStore,
{
    #[must_use]
    pub fn new(store: Arc<S>, sources: SourceRegistry, settings: SyncSettings) -> Self {
        Self {
            store,
            sources,
            classifier: Arc::new(Classifier::default()),
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces the built-in apparel classifier. Rules without a registry
    /// entry are logged once here since they can never match.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        let unregistered = classifier.unregistered_categories();
        if !unregistered.is_empty() {
            tracing::warn!(
                categories = ?unregistered,
                "classifier rules have no taxonomy entry and will never match"
            );
        }
        self.classifier = Arc::new(classifier);
        self
    }

    /// Uses `token` to stop the sweep. A cancelled brand abandons a pending
    /// fetch or stops at the next record boundary; its run is still finalized.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Syncs every targeted brand in turn, pausing between brands.
    ///
    /// One brand failing never stops the sweep.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::BrandNotFound`] for an unknown slug, or
    /// [`SyncError::Store`] if the brand list cannot be read.
    pub async fn sweep(
        &self,
        target: &SyncTarget,
        options: SyncOptions,
    ) -> Result<SweepSummary, SyncError> {
        let brands = self.target_brands(target).await?;
        let mut summary = SweepSummary {
            dry_run: options.dry_run,
            ..SweepSummary::default()
        };

        tracing::info!(
            brands = brands.len(),
            new_only = options.new_only,
            dry_run = options.dry_run,
            "sync sweep starting"
        );

        for (idx, brand) in brands.iter().enumerate() {
            if idx > 0 && !self.settings.inter_brand_delay.is_zero() {
                let cancelled = tokio::select! {
                    () = self.cancel.cancelled() => true,
                    () = tokio::time::sleep(self.settings.inter_brand_delay) => false,
                };
                if cancelled {
                    summary.skipped = brands.len() - idx;
                    break;
                }
            }
            if self.cancel.is_cancelled() {
                summary.skipped = brands.len() - idx;
                break;
            }

            let report = match self.sync_brand(brand, options).await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(brand = %brand.slug, error = %e, "brand sync could not be recorded");
                    BrandReport {
                        brand_id: brand.id,
                        slug: brand.slug.clone(),
                        status: RunStatus::Failed,
                        counts: RunCounts::default(),
                        elapsed_secs: 0.0,
                        run_id: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            summary.brands.push(report);
        }

        if summary.skipped > 0 {
            tracing::warn!(skipped = summary.skipped, "sweep cancelled before every brand ran");
        }
        let totals = summary.totals();
        tracing::info!(
            brands = summary.brands.len(),
            failed_brands = summary.count_with(RunStatus::Failed),
            added = totals.added,
            updated = totals.updated,
            failed = totals.failed,
            "sync sweep finished"
        );
        Ok(summary)
    }

    /// Runs one brand end to end and writes its run log entry.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] only when the run log itself cannot be
    /// written; source and record failures are reported in the returned
    /// [`BrandReport`].
    pub async fn sync_brand(
        &self,
        brand: &Brand,
        options: SyncOptions,
    ) -> Result<BrandReport, SyncError> {
        let started = Instant::now();

        if options.dry_run {
            let execution = self.execute(brand, options).await;
            return Ok(report(brand, None, &execution, started.elapsed()));
        }

        let run = self.store.create_scrape_run(brand.id).await?;
        tracing::info!(brand = %brand.slug, run_id = run.id, "scrape run started");

        let execution = self.execute(brand, options).await;
        let elapsed = started.elapsed();
        let outcome = RunOutcome {
            status: execution.status,
            counts: execution.counts,
            completed_at: Utc::now(),
            execution_time_seconds: elapsed.as_secs_f64(),
            error_message: execution.error.clone(),
            dataset_id: execution.dataset_id.clone(),
        };

        if let Err(e) = self.store.finish_scrape_run(run.id, &outcome).await {
            tracing::error!(brand = %brand.slug, run_id = run.id, error = %e, "failed to finalize scrape run");
            return Err(e.into());
        }

        if execution.status != RunStatus::Failed {
            if let Err(e) = self
                .store
                .mark_brand_synced(brand.id, outcome.completed_at)
                .await
            {
                tracing::warn!(brand = %brand.slug, error = %e, "failed to update last_synced_at");
            }
        }

        let counts = execution.counts;
        match execution.status {
            RunStatus::Failed => tracing::error!(
                brand = %brand.slug,
                run_id = run.id,
                error = execution.error.as_deref().unwrap_or_default(),
                "scrape run failed"
            ),
            RunStatus::Partial => tracing::warn!(
                brand = %brand.slug,
                run_id = run.id,
                added = counts.added,
                updated = counts.updated,
                failed = counts.failed,
                "scrape run finished with failures"
            ),
            _ => tracing::info!(
                brand = %brand.slug,
                run_id = run.id,
                added = counts.added,
                updated = counts.updated,
                elapsed_secs = elapsed.as_secs_f64(),
                "scrape run succeeded"
            ),
        }

        Ok(report(brand, Some(run.id), &execution, elapsed))
    }

    async fn target_brands(&self, target: &SyncTarget) -> Result<Vec<Brand>, SyncError> {
        match target {
            SyncTarget::All => Ok(self.store.list_active_brands().await?),
            SyncTarget::Brand(slug) => self
                .store
                .get_brand_by_slug(slug)
                .await?
                .map(|brand| vec![brand])
                .ok_or_else(|| SyncError::BrandNotFound { slug: slug.clone() }),
        }
    }

    async fn execute(&self, brand: &Brand, options: SyncOptions) -> Execution {
        if !brand.active {
            return Execution::failed(format!("brand '{}' is inactive", brand.slug));
        }

        let Some(source) = self.sources.select(brand) else {
            return Execution::failed(format!(
                "no adapter registered for source kind '{}'",
                SourceRegistry::kind_for(brand)
            ));
        };

        let since_days = options.new_only.then_some(self.settings.new_only_days);
        let fetch = tokio::select! {
            biased;
            () = self.cancel.cancelled() => None,
            result = source.fetch_all(brand, since_days) => Some(result),
        };
        let fetched = match fetch {
            None => {
                tracing::warn!(brand = %brand.slug, "sync cancelled while fetching");
                return Execution::failed("cancelled before any record was processed".to_string());
            }
            Some(Ok(fetched)) => fetched,
            Some(Err(e)) => {
                tracing::error!(
                    brand = %brand.slug,
                    source = %source.kind(),
                    error = %e,
                    "source fetch failed"
                );
                return Execution::failed(e.to_string());
            }
        };

        let total = fetched.records.len();
        if total == 0 {
            tracing::info!(brand = %brand.slug, "source returned no records");
        }

        let processed = self
            .process_records(brand, &fetched.records, options.dry_run)
            .await;
        let status = terminal_status(
            &processed.counts,
            fetched.degraded.is_some(),
            processed.cancelled,
        );

        let mut notes = Vec::new();
        if processed.cancelled {
            notes.push(format!(
                "cancelled after {} of {total} records",
                processed.counts.processed()
            ));
        }
        if let Some(degraded) = fetched.degraded {
            notes.push(degraded);
        }
        if processed.counts.failed > 0 {
            notes.push(format!(
                "{} of {total} records failed; first: {}",
                processed.counts.failed,
                processed.first_error.unwrap_or_default()
            ));
        }

        Execution {
            status,
            counts: processed.counts,
            error: (!notes.is_empty()).then(|| notes.join("; ")),
            dataset_id: fetched.dataset_id,
        }
    }

    async fn process_records(
        &self,
        brand: &Brand,
        records: &[RawRecord],
        dry_run: bool,
    ) -> Processed {
        let ctx = NormalizeContext::for_brand(brand);
        let engine = UpsertEngine::new(Arc::clone(&self.store));
        let cancel = &self.cancel;

        let results: Vec<RecordResult> = stream::iter(records)
            .take_while(|_| futures::future::ready(!cancel.is_cancelled()))
            .map(|raw| self.process_record(&engine, &ctx, raw, dry_run))
            .buffer_unordered(self.settings.record_workers.max(1))
            .collect()
            .await;

        // A fetch that came back empty after the token fired still counts.
        let mut processed = Processed {
            cancelled: cancel.is_cancelled()
                && (results.len() < records.len() || records.is_empty()),
            ..Processed::default()
        };
        for result in results {
            match result {
                RecordResult::Added => processed.counts.added += 1,
                RecordResult::Updated => processed.counts.updated += 1,
                RecordResult::Failed(reason) => {
                    processed.counts.failed += 1;
                    processed.first_error.get_or_insert(reason);
                }
            }
        }
        processed
    }

    async fn process_record(
        &self,
        engine: &UpsertEngine<S>,
        ctx: &NormalizeContext<'_>,
        raw: &RawRecord,
        dry_run: bool,
    ) -> RecordResult {
        let mut product = match normalize(raw, ctx) {
            Ok(product) => product,
            Err(e) => {
                tracing::warn!(brand_id = ctx.brand_id, error = %e, "record rejected");
                return RecordResult::Failed(e.to_string());
            }
        };

        product.classification = self
            .classifier
            .classify(
                &product.name,
                product.product_type.as_deref(),
                product.description.as_deref(),
            )
            .map(|category| category.to_classification());
        if product.classification.is_none() {
            tracing::debug!(
                brand_id = ctx.brand_id,
                external_id = %product.external_id,
                name = %product.name,
                "product left unclassified"
            );
        }

        let written = if dry_run {
            engine.resolve(&product).await.map(|existing| existing.is_none())
        } else {
            engine.upsert(&product).await.map(|result| result.created)
        };

        match written {
            Ok(true) => RecordResult::Added,
            Ok(false) => RecordResult::Updated,
            Err(e) => {
                tracing::warn!(
                    brand_id = ctx.brand_id,
                    external_id = %product.external_id,
                    error = %e,
                    "product upsert failed"
                );
                RecordResult::Failed(format!("{}: {e}", product.external_id))
            }
        }
    }
}

fn report(brand: &Brand, run_id: Option<i64>, execution: &Execution, elapsed: Duration) -> BrandReport {
    BrandReport {
        brand_id: brand.id,
        slug: brand.slug.clone(),
        status: execution.status,
        counts: execution.counts,
        elapsed_secs: elapsed.as_secs_f64(),
        run_id,
        error: execution.error.clone(),
    }
}

/// Terminal status once record processing has started.
fn terminal_status(counts: &RunCounts, degraded: bool, cancelled: bool) -> RunStatus {
    if cancelled && counts.processed() == 0 {
        RunStatus::Failed
    } else if cancelled || degraded || counts.failed > 0 {
        RunStatus::Partial
    } else {
        RunStatus::Success
    }
}
