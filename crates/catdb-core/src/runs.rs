//! Run-log types: one [`ScrapeRun`] per brand per sync invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Success,
    Partial,
    Failed,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "success" => Ok(RunStatus::Success),
            "partial" => Ok(RunStatus::Partial),
            "failed" => Ok(RunStatus::Failed),
            other => Err(format!("unknown run status \"{other}\"")),
        }
    }
}

/// Per-record tallies for one brand's run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    pub added: u32,
    pub updated: u32,
    pub failed: u32,
}

impl RunCounts {
    #[must_use]
    pub fn processed(&self) -> u32 {
        self.added
            .saturating_add(self.updated)
            .saturating_add(self.failed)
    }

    pub fn absorb(&mut self, other: RunCounts) {
        self.added = self.added.saturating_add(other.added);
        self.updated = self.updated.saturating_add(other.updated);
        self.failed = self.failed.saturating_add(other.failed);
    }
}

/// A persisted run-log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeRun {
    pub id: i64,
    pub brand_id: i64,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub counts: RunCounts,
    pub execution_time_seconds: Option<f64>,
    pub error_message: Option<String>,
    /// Result-set id of the remote job that fed this run, if any.
    pub dataset_id: Option<String>,
}

/// The terminal state written onto a [`ScrapeRun`] exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub counts: RunCounts,
    pub completed_at: DateTime<Utc>,
    pub execution_time_seconds: f64,
    pub error_message: Option<String>,
    pub dataset_id: Option<String>,
}
