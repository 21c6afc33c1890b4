//! Sitemap discovery for the per-product detail strategy.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::ScraperError;

use super::origin::extract_store_origin;
use super::{RequestProfile, StorefrontClient};

/// Parsed `<loc>` entries of a sitemap document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sitemap {
    /// `true` for a `<sitemapindex>` whose entries are child sitemaps.
    pub is_index: bool,
    pub locations: Vec<String>,
}

/// Parses a `<urlset>` or `<sitemapindex>` document.
///
/// # Errors
///
/// Returns [`ScraperError::Xml`] when the document is malformed.
pub fn parse_sitemap(xml: &str) -> Result<Sitemap, ScraperError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut sitemap = Sitemap::default();
    let mut in_loc = false;
    let xml_err = |reason: String| ScraperError::Xml {
        context: "sitemap".to_owned(),
        reason,
    };

    loop {
        match reader.read_event().map_err(|e| xml_err(e.to_string()))? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sitemapindex" => sitemap.is_index = true,
                b"loc" => in_loc = true,
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"loc" => in_loc = false,
            Event::Text(text) if in_loc => {
                let loc = text.unescape().map_err(|e| xml_err(e.to_string()))?;
                push_location(&mut sitemap, &loc);
            }
            Event::CData(data) if in_loc => {
                push_location(&mut sitemap, &String::from_utf8_lossy(&data.into_inner()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sitemap)
}

fn push_location(sitemap: &mut Sitemap, loc: &str) {
    let loc = loc.trim();
    if !loc.is_empty() {
        sitemap.locations.push(loc.to_owned());
    }
}

fn is_product_url(url: &str) -> bool {
    url.contains("/products/")
}

impl StorefrontClient {
    /// Collects up to `max` product page URLs from `{origin}/sitemap.xml`,
    /// descending one level into product sitemaps when it is an index.
    ///
    /// # Errors
    ///
    /// Propagates failures fetching or parsing the root sitemap. Child
    /// sitemap failures are logged and skipped.
    pub async fn fetch_sitemap_product_urls(
        &self,
        store_url: &str,
        max: usize,
    ) -> Result<Vec<String>, ScraperError> {
        let origin = extract_store_origin(store_url);
        let root_url = format!("{origin}/sitemap.xml");
        let root = parse_sitemap(&self.get_text(&root_url, RequestProfile::default()).await?)?;

        if !root.is_index {
            return Ok(product_urls(root.locations, max));
        }

        let mut children: Vec<&String> = root
            .locations
            .iter()
            .filter(|loc| loc.contains("product"))
            .collect();
        if children.is_empty() {
            children = root.locations.iter().collect();
        }

        let mut urls = Vec::new();
        for (idx, child) in children.into_iter().enumerate() {
            if urls.len() >= max {
                break;
            }
            if idx > 0 {
                self.pause().await;
            }
            let parsed = match self.get_text(child, RequestProfile::default()).await {
                Ok(body) => parse_sitemap(&body),
                Err(e) => Err(e),
            };
            match parsed {
                Ok(sitemap) => urls.extend(sitemap.locations),
                Err(e) => {
                    tracing::warn!(sitemap = %child, error = %e, "skipping unreadable child sitemap");
                }
            }
        }

        Ok(product_urls(urls, max))
    }
}

fn product_urls(locations: Vec<String>, max: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    locations
        .into_iter()
        .filter(|loc| is_product_url(loc))
        .filter(|loc| seen.insert(loc.clone()))
        .take(max)
        .collect()
}
