//! URL helpers for storefront requests.

use crate::error::ScraperError;

/// Extracts the scheme+host origin from a storefront URL.
///
/// `"https://example-co.com/collections/all"` becomes `"https://example-co.com"`,
/// so catalog endpoints are always requested from the store root.
#[must_use]
pub fn extract_store_origin(store_url: &str) -> String {
    reqwest::Url::parse(store_url).map_or_else(
        |e| {
            tracing::warn!(
                store_url,
                error = %e,
                "could not parse storefront URL, falling back to string split for origin"
            );
            store_url
                .trim_end_matches('/')
                .splitn(4, '/')
                .take(3)
                .collect::<Vec<_>>()
                .join("/")
        },
        |u| u.origin().ascii_serialization(),
    )
}

/// Extracts the hostname for log fields and error messages. Falls back to
/// the input when it does not parse.
#[must_use]
pub fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

/// Resolves `reference` (absolute, root-relative, or relative) against `base`.
pub(crate) fn resolve_url(base: &str, reference: &str) -> Result<String, ScraperError> {
    let base_url = reqwest::Url::parse(base).map_err(|e| ScraperError::InvalidUrl {
        url: base.to_owned(),
        reason: e.to_string(),
    })?;
    base_url
        .join(reference.trim())
        .map(|u| u.to_string())
        .map_err(|e| ScraperError::InvalidUrl {
            url: reference.to_owned(),
            reason: e.to_string(),
        })
}
