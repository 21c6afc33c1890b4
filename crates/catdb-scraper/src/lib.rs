//! Fetching and normalizing product records from brand storefronts.
//!
//! [`sources`] holds one adapter per acquisition strategy, [`normalize`]
//! turns whatever an adapter returned into a [`catdb_core::NormalizedProduct`],
//! and [`remote`] wraps the asynchronous crawl service used for storefronts
//! that block direct reads.

pub mod client;
pub mod error;
pub mod normalize;
pub mod rate_limit;
pub mod remote;
pub mod settings;
pub mod sources;
pub mod types;

pub use client::{CatalogPaging, RequestProfile, StorefrontClient};
pub use error::{NormalizeError, ScraperError};
pub use normalize::{detect, normalize, NormalizeContext, PriceUnit, RecordFormat};
pub use remote::{JobHandle, JobOutcome, JobState, RemoteScrapeProxy};
pub use settings::ScraperSettings;
pub use sources::{FetchOutcome, ProductSource, RawRecord, SourceRegistry};
