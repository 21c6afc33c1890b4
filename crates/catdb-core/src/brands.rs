use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Ingestion strategy a brand uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Native,
    RemoteScrape,
    BrandApi,
    GenericHtml,
}

impl SourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Native => "native",
            SourceKind::RemoteScrape => "remote-scrape",
            SourceKind::BrandApi => "brand-api",
            SourceKind::GenericHtml => "generic-html",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "native" => Ok(SourceKind::Native),
            "remote-scrape" => Ok(SourceKind::RemoteScrape),
            "brand-api" => Ok(SourceKind::BrandApi),
            "generic-html" => Ok(SourceKind::GenericHtml),
            other => Err(format!("unknown source kind \"{other}\"")),
        }
    }
}

/// Per-brand adapter settings, stored as JSON next to the brand row.
///
/// Every field is optional; each adapter reads only the keys it understands
/// and anything unrecognized is preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Remote scraping job definition to submit (e.g. an actor id).
    pub job_id: Option<String>,
    /// Handle of a remote job that already ran out of band.
    pub run_id: Option<String>,
    /// Result set of a remote job that already ran out of band.
    pub dataset_id: Option<String>,
    /// Listing pages to scrape, either remotely or as generic HTML.
    pub listing_urls: Vec<String>,
    pub max_items: Option<u32>,
    /// Collection handles or relative collection paths on a native storefront.
    pub collections: Vec<String>,
    /// Brand API dialect name (see the brand-api adapter).
    pub api_dialect: Option<String>,
    pub api_endpoint: Option<String>,
    /// Name of the environment variable holding the brand API credential.
    pub api_token_env: Option<String>,
    /// Overrides the generic listing adapter's card selectors.
    pub card_selectors: Vec<String>,
    /// ISO 4217 code used when the source omits one.
    pub currency: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SourceConfig {
    /// Parses the JSON column value, treating `null` as an empty config.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error when the value has the
    /// wrong shape (e.g. `listing_urls` is not an array).
    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
    }
}

/// A brand as the pipeline sees it: read from the store, never edited here
/// except for `last_synced_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub storefront_url: String,
    /// `None` when the brand has no strategy configured.
    pub source_kind: Option<SourceKind>,
    pub source_config: SourceConfig,
    pub active: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Brand {
    /// Currency assumed for this brand's prices when a record carries none.
    #[must_use]
    pub fn default_currency(&self) -> &str {
        self.source_config.currency.as_deref().unwrap_or("USD")
    }
}

/// A brand entry from `config/brands.yaml`, used to seed the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandConfig {
    pub name: String,
    /// Explicit slug; derived from `name` when omitted.
    #[serde(default)]
    pub slug: Option<String>,
    pub storefront_url: String,
    #[serde(default)]
    pub source_kind: Option<SourceKind>,
    #[serde(default)]
    pub source_config: SourceConfig,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl BrandConfig {
    /// Returns the configured slug, or a URL-safe slug generated from the name.
    #[must_use]
    pub fn slug(&self) -> String {
        match &self.slug {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => slugify(&self.name),
        }
    }
}

/// Lowercases `input` and joins its ASCII alphanumeric runs with `-`.
///
/// Whitespace, `/`, `_` and `.` separate words; other punctuation and
/// non-ASCII characters are dropped without inserting a separator.
#[must_use]
pub fn slugify(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                Some(c)
            } else if c.is_whitespace() || matches!(c, '/' | '_' | '.') {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Deserialize)]
pub struct BrandsFile {
    pub brands: Vec<BrandConfig>,
}

/// Load and validate the brands configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_brands(path: &Path) -> Result<BrandsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BrandsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_brands(&content)
}

/// Parse and validate brands YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_brands(content: &str) -> Result<BrandsFile, ConfigError> {
    let brands_file: BrandsFile =
        serde_yaml::from_str(content).map_err(ConfigError::BrandsFileParse)?;

    validate_brands(&brands_file)?;

    Ok(brands_file)
}

fn validate_brands(brands_file: &BrandsFile) -> Result<(), ConfigError> {
    let mut seen_slugs = HashSet::new();

    for brand in &brands_file.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        let slug = brand.slug();
        if slug.is_empty() {
            return Err(ConfigError::Validation(format!(
                "brand '{}' produces an empty slug; set `slug` explicitly",
                brand.name
            )));
        }
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand slug: '{}' (from brand '{}')",
                slug, brand.name
            )));
        }

        let url = brand.storefront_url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Validation(format!(
                "brand '{}' has invalid storefront_url \"{}\"; expected an http(s) URL",
                brand.name, brand.storefront_url
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "brands_test.rs"]
mod tests;
