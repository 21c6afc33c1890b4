use serde::{Deserialize, Serialize};

/// Envelope the remote service wraps every object in.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub data: T,
}

/// Body of `POST /jobs`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitRequest<'a> {
    pub job_id: &'a str,
    pub input: &'a serde_json::Value,
}

/// Job metadata returned by `POST /jobs` and `GET /jobs/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobData {
    pub id: String,
    pub status: String,
    #[serde(default, alias = "defaultDatasetId")]
    pub dataset_id: Option<String>,
}

/// Input for a storefront crawl job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlInput {
    pub start_urls: Vec<StartUrl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartUrl {
    pub url: String,
}

impl CrawlInput {
    #[must_use]
    pub fn new(urls: impl IntoIterator<Item = String>, max_items: Option<u32>) -> Self {
        Self {
            start_urls: urls.into_iter().map(|url| StartUrl { url }).collect(),
            max_items,
        }
    }
}

/// A handle to a submitted (or externally started) job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub run_id: String,
    pub dataset_id: Option<String>,
}

/// Lifecycle state reported by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Queued or running; keep polling.
    Pending(String),
    Succeeded,
    Failed,
    Aborted,
    TimedOut,
}

impl JobState {
    #[must_use]
    pub fn parse(status: &str) -> Self {
        match status.trim().to_ascii_uppercase().replace('_', "-").as_str() {
            "SUCCEEDED" => JobState::Succeeded,
            "FAILED" => JobState::Failed,
            "ABORTED" => JobState::Aborted,
            "TIMED-OUT" => JobState::TimedOut,
            other => JobState::Pending(other.to_owned()),
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Pending(_))
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            JobState::Pending(s) => s,
            JobState::Succeeded => "SUCCEEDED",
            JobState::Failed => "FAILED",
            JobState::Aborted => "ABORTED",
            JobState::TimedOut => "TIMED-OUT",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Terminal state plus the result-set id to fetch from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub run_id: String,
    pub state: JobState,
    pub dataset_id: Option<String>,
}
