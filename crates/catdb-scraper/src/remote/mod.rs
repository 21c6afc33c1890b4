//! Client for the managed remote-scraping service.
//!
//! The service runs opaque crawl jobs: submit a job definition with an input,
//! poll until it reaches a terminal state, then page through its result set.

mod types;

use std::time::Duration;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::client::extract_domain;
use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;
use crate::settings::ScraperSettings;

pub use types::{CrawlInput, JobHandle, JobOutcome, JobState, StartUrl};
use types::{ApiResponse, JobData, SubmitRequest};

/// Rows requested per result page.
pub(crate) const RESULT_PAGE_SIZE: usize = 1000;

/// Upper bound on result pages read for one job.
const MAX_RESULT_PAGES: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResultPage {
    Bare(Vec<Value>),
    Wrapped { items: Vec<Value> },
    Enveloped { data: ResultItems },
}

#[derive(Debug, Deserialize)]
struct ResultItems {
    items: Vec<Value>,
}

impl ResultPage {
    fn into_items(self) -> Vec<Value> {
        match self {
            ResultPage::Bare(items)
            | ResultPage::Wrapped { items }
            | ResultPage::Enveloped {
                data: ResultItems { items },
            } => items,
        }
    }
}

pub struct RemoteScrapeProxy {
    client: Client,
    base_url: String,
    token: Option<String>,
    poll_interval: Duration,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl RemoteScrapeProxy {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: &ScraperSettings) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            base_url: settings.remote_api_url.trim_end_matches('/').to_owned(),
            token: settings.remote_api_token.clone(),
            poll_interval: settings.remote_poll_interval,
            max_retries: settings.max_retries,
            backoff_base_secs: settings.backoff_base_secs,
        })
    }

    /// Submits `job_id` with `input` and returns a handle to the new run.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::RemoteApi`] on a non-2xx response.
    pub async fn submit(&self, job_id: &str, input: &Value) -> Result<JobHandle, ScraperError> {
        let url = format!("{}/jobs", self.base_url);
        let body = serde_json::to_value(SubmitRequest { job_id, input }).map_err(|e| {
            ScraperError::Deserialize {
                context: "remote job submission".to_owned(),
                source: e,
            }
        })?;
        let job: ApiResponse<JobData> = self.call(Method::POST, &url, Some(&body)).await?;
        tracing::info!(job_id, run_id = %job.data.id, "remote job submitted");
        Ok(JobHandle {
            run_id: job.data.id,
            dataset_id: job.data.dataset_id,
        })
    }

    /// Fetches the current state of `run_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::RemoteApi`] on a non-2xx response.
    pub async fn status(&self, run_id: &str) -> Result<JobOutcome, ScraperError> {
        let url = format!("{}/jobs/{run_id}", self.base_url);
        let job: ApiResponse<JobData> = self.call(Method::GET, &url, None).await?;
        Ok(JobOutcome {
            run_id: job.data.id,
            state: JobState::parse(&job.data.status),
            dataset_id: job.data.dataset_id,
        })
    }

    /// Polls until the job reaches a terminal state.
    ///
    /// Sleeps `poll_interval` between polls. A non-`Succeeded` terminal
    /// state is returned as `Ok`; callers decide whether partial results
    /// are usable. `max_wait` bounds the whole wait, including a status
    /// request still in flight.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Timeout`] once `max_wait` has elapsed without
    /// a terminal state.
    pub async fn await_completion(
        &self,
        handle: &JobHandle,
        max_wait: Duration,
    ) -> Result<JobOutcome, ScraperError> {
        let started = tokio::time::Instant::now();

        match tokio::time::timeout(max_wait, self.poll_until_terminal(handle, started)).await {
            Ok(result) => result,
            Err(_) => Err(ScraperError::Timeout {
                run_id: handle.run_id.clone(),
                waited_secs: started.elapsed().as_secs(),
            }),
        }
    }

    async fn poll_until_terminal(
        &self,
        handle: &JobHandle,
        started: tokio::time::Instant,
    ) -> Result<JobOutcome, ScraperError> {
        loop {
            let mut outcome = self.status(&handle.run_id).await?;
            if outcome.state.is_terminal() {
                if outcome.dataset_id.is_none() {
                    outcome.dataset_id.clone_from(&handle.dataset_id);
                }
                return Ok(outcome);
            }

            tracing::debug!(
                run_id = %handle.run_id,
                state = %outcome.state,
                elapsed_secs = started.elapsed().as_secs(),
                "remote job still running"
            );
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Reads every row of a result set, page by page.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::RemoteApi`] on a non-2xx response or
    /// [`ScraperError::Deserialize`] if a page is not a JSON row list.
    pub async fn fetch_result(&self, dataset_id: &str) -> Result<Vec<Value>, ScraperError> {
        let mut rows = Vec::new();

        for page in 0..MAX_RESULT_PAGES {
            let url = format!(
                "{}/results/{dataset_id}?offset={}&limit={RESULT_PAGE_SIZE}",
                self.base_url,
                page * RESULT_PAGE_SIZE
            );
            let items = self
                .call::<ResultPage>(Method::GET, &url, None)
                .await?
                .into_items();
            let count = items.len();
            tracing::debug!(dataset_id, page, count, "fetched remote result page");
            rows.extend(items);
            if count < RESULT_PAGE_SIZE {
                return Ok(rows);
            }
        }

        tracing::warn!(
            dataset_id,
            rows = rows.len(),
            "remote result page cap reached, truncating"
        );
        Ok(rows)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<T, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let method = method.clone();
            async move {
                let mut request = self.client.request(method, url);
                if let Some(token) = &self.token {
                    request = request.bearer_auth(token);
                }
                if let Some(body) = body {
                    request = request.json(body);
                }

                let response = request.send().await?;
                let status = response.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    return Err(ScraperError::RateLimited {
                        domain: extract_domain(url),
                        retry_after_secs: 0,
                    });
                }
                if !status.is_success() {
                    let message = response.text().await.unwrap_or_default();
                    return Err(ScraperError::RemoteApi {
                        status: status.as_u16(),
                        message,
                    });
                }

                let text = response.text().await?;
                serde_json::from_str(&text).map_err(|e| ScraperError::Deserialize {
                    context: url.to_owned(),
                    source: e,
                })
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_state_parses_terminal_labels() {
        assert_eq!(JobState::parse("SUCCEEDED"), JobState::Succeeded);
        assert_eq!(JobState::parse("failed"), JobState::Failed);
        assert_eq!(JobState::parse("ABORTED"), JobState::Aborted);
        assert_eq!(JobState::parse("TIMED-OUT"), JobState::TimedOut);
        assert_eq!(JobState::parse("timed_out"), JobState::TimedOut);
    }

    #[test]
    fn unknown_states_keep_polling() {
        let state = JobState::parse("RUNNING");
        assert!(!state.is_terminal());
        assert_eq!(state.label(), "RUNNING");
        assert!(JobState::Aborted.is_terminal());
    }

    #[test]
    fn crawl_input_serializes_camel_case() {
        let input = CrawlInput::new(["https://a.example/collections/all".to_owned()], Some(50));
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "startUrls": [{"url": "https://a.example/collections/all"}],
                "maxItems": 50
            })
        );
    }

    #[test]
    fn result_page_accepts_all_shapes() {
        let bare: ResultPage = serde_json::from_str(r#"[{"a":1}]"#).unwrap();
        let wrapped: ResultPage = serde_json::from_str(r#"{"items":[{"a":1},{"a":2}]}"#).unwrap();
        let enveloped: ResultPage =
            serde_json::from_str(r#"{"data":{"items":[]}}"#).unwrap();
        assert_eq!(bare.into_items().len(), 1);
        assert_eq!(wrapped.into_items().len(), 2);
        assert!(enveloped.into_items().is_empty());
    }

    #[test]
    fn job_data_accepts_default_dataset_alias() {
        let job: ApiResponse<JobData> = serde_json::from_str(
            r#"{"data":{"id":"run-1","status":"READY","defaultDatasetId":"ds-9"}}"#,
        )
        .unwrap();
        assert_eq!(job.data.dataset_id.as_deref(), Some("ds-9"));
    }
}
