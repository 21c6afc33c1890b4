pub mod app_config;
pub mod brands;
pub mod config;
pub mod products;
pub mod runs;
pub mod store;
pub mod taxonomy;

pub use app_config::{AppConfig, Environment};
pub use brands::{
    load_brands, parse_brands, slugify, Brand, BrandConfig, BrandsFile, SourceConfig, SourceKind,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{Classification, NormalizedProduct, NormalizedVariant};
pub use runs::{RunCounts, RunOutcome, RunStatus, ScrapeRun};
pub use store::{CatalogStore, RunLogStore, StoreError};
pub use taxonomy::{Category, Classifier, TaxonomyEntry};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read brands file {path}: {source}")]
    BrandsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse brands file: {0}")]
    BrandsFileParse(#[source] serde_yaml::Error),

    #[error("brands config validation failed: {0}")]
    Validation(String),
}
