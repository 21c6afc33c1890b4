use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("XML parse error for {context}: {reason}")]
    Xml { context: String, reason: String },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("remote scrape API error (status {status}): {message}")]
    RemoteApi { status: u16, message: String },

    #[error("remote job {run_id} ended {state} with no usable records")]
    RemoteJobFailed { run_id: String, state: String },

    #[error("remote job {run_id} did not finish within {waited_secs}s")]
    Timeout { run_id: String, waited_secs: u64 },

    #[error("every fetch strategy failed for {brand}: {attempts}")]
    AllStrategiesFailed { brand: String, attempts: String },

    #[error("brand {brand} is missing source_config.{field}")]
    MissingSourceConfig { brand: String, field: &'static str },

    #[error("credential {name} is not set")]
    MissingCredential { name: String },

    #[error("brand {brand} uses unsupported API dialect \"{dialect}\"")]
    UnsupportedDialect { brand: String, dialect: String },
}

impl ScraperError {
    /// HTTP status carried by the error, if it came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ScraperError::UnexpectedStatus { status, .. } | ScraperError::RemoteApi { status, .. } => {
                Some(*status)
            }
            ScraperError::NotFound { .. } => Some(404),
            ScraperError::RateLimited { .. } => Some(429),
            ScraperError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Per-record normalization failure. Never fatal to a run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("record matches no known format")]
    UnrecognizedFormat,

    #[error("record is missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid price in {field}: \"{value}\"")]
    InvalidPrice { field: &'static str, value: String },

    #[error("record has the right shape but bad field types: {0}")]
    Malformed(String),
}
