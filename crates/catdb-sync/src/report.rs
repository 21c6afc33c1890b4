use catdb_core::{RunCounts, RunStatus};

/// Terminal result of one brand within a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandReport {
    pub brand_id: i64,
    pub slug: String,
    pub status: RunStatus,
    pub counts: RunCounts,
    pub elapsed_secs: f64,
    /// `None` for dry runs and for brands whose run could not be created.
    pub run_id: Option<i64>,
    pub error: Option<String>,
}

/// Aggregate of a sweep over one or more brands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepSummary {
    pub brands: Vec<BrandReport>,
    /// Brands never started because the sweep was cancelled.
    pub skipped: usize,
    pub dry_run: bool,
}

impl SweepSummary {
    #[must_use]
    pub fn totals(&self) -> RunCounts {
        let mut totals = RunCounts::default();
        for report in &self.brands {
            totals.absorb(report.counts);
        }
        totals
    }

    #[must_use]
    pub fn count_with(&self, status: RunStatus) -> usize {
        self.brands.iter().filter(|r| r.status == status).count()
    }

    /// `true` if any brand ended `Failed`; the CLI exits non-zero on this.
    #[must_use]
    pub fn any_failed(&self) -> bool {
        self.count_with(RunStatus::Failed) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(slug: &str, status: RunStatus, added: u32, failed: u32) -> BrandReport {
        BrandReport {
            brand_id: 1,
            slug: slug.to_string(),
            status,
            counts: RunCounts {
                added,
                updated: 0,
                failed,
            },
            elapsed_secs: 0.5,
            run_id: Some(1),
            error: None,
        }
    }

    #[test]
    fn totals_sum_every_brand() {
        let summary = SweepSummary {
            brands: vec![
                report("a", RunStatus::Success, 4, 0),
                report("b", RunStatus::Partial, 7, 3),
            ],
            ..SweepSummary::default()
        };
        let totals = summary.totals();
        assert_eq!(totals.added, 11);
        assert_eq!(totals.failed, 3);
        assert!(!summary.any_failed());
    }

    #[test]
    fn one_failed_brand_fails_the_sweep() {
        let summary = SweepSummary {
            brands: vec![
                report("a", RunStatus::Success, 1, 0),
                report("b", RunStatus::Failed, 0, 0),
            ],
            ..SweepSummary::default()
        };
        assert!(summary.any_failed());
        assert_eq!(summary.count_with(RunStatus::Success), 1);
    }
}
