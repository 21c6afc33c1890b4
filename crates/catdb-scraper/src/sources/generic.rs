//! Last-resort extraction from rendered listing HTML.

use async_trait::async_trait;
use catdb_core::{Brand, SourceKind};
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};

use crate::client::{resolve_url, RequestProfile, StorefrontClient};
use crate::error::ScraperError;

use super::{FetchOutcome, ProductSource, RawRecord};

/// Product-card container selectors, most specific first.
pub const DEFAULT_CARD_SELECTORS: &[&str] = &[
    "[data-product-card]",
    ".product-card",
    ".product-item",
    ".grid-product",
    "li.product",
    "article.product",
];

const NAME_SELECTORS: &[&str] = &[
    "[itemprop=name]",
    ".product-card__title",
    ".product-title",
    ".product-name",
    ".card__heading",
    "h2",
    "h3",
    "h4",
];
const PRICE_SELECTORS: &[&str] = &[
    "[itemprop=price]",
    ".price-item--sale",
    ".sale-price",
    ".price",
    ".product-price",
    ".money",
    "[data-price]",
];
const COMPARE_SELECTORS: &[&str] = &[".compare-at-price", ".price--compare", "s", "del"];
const ID_ATTRIBUTES: &[&str] = &["data-product-id", "data-id", "data-sku"];

pub struct GenericListingAdapter {
    http: StorefrontClient,
}

impl GenericListingAdapter {
    #[must_use]
    pub fn new(http: StorefrontClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ProductSource for GenericListingAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::GenericHtml
    }

    async fn fetch_all(
        &self,
        brand: &Brand,
        _since_days: Option<u32>,
    ) -> Result<FetchOutcome, ScraperError> {
        let config = &brand.source_config;
        let pages: Vec<&str> = if config.listing_urls.is_empty() {
            vec![brand.storefront_url.as_str()]
        } else {
            config.listing_urls.iter().map(String::as_str).collect()
        };
        let selectors: Vec<String> = if config.card_selectors.is_empty() {
            DEFAULT_CARD_SELECTORS.iter().map(|s| (*s).to_owned()).collect()
        } else {
            config.card_selectors.clone()
        };

        let mut records = Vec::new();
        let mut last_err = None;
        let mut any_ok = false;

        for (idx, page) in pages.iter().enumerate() {
            if idx > 0 {
                self.http.pause().await;
            }
            match self.http.get_text(page, RequestProfile::default()).await {
                Ok(html) => {
                    any_ok = true;
                    let cards = extract_listing_cards(&html, page, &selectors);
                    tracing::debug!(brand = %brand.slug, page, count = cards.len(), "extracted listing cards");
                    records.extend(cards);
                }
                Err(e) => {
                    tracing::warn!(brand = %brand.slug, page, error = %e, "listing page fetch failed");
                    last_err = Some(e);
                }
            }
        }

        match (any_ok, last_err) {
            (false, Some(e)) => Err(e),
            _ => Ok(FetchOutcome::complete(records)),
        }
    }
}

/// Extracts product cards from one listing page.
///
/// The first selector that matches at least one element is used exclusively;
/// later selectors are not consulted even if they would match more. Cards
/// with neither a name nor an image are skipped.
#[must_use]
pub fn extract_listing_cards(html: &str, page_url: &str, selectors: &[String]) -> Vec<RawRecord> {
    let document = Html::parse_document(html);

    for raw_selector in selectors {
        let Ok(selector) = Selector::parse(raw_selector) else {
            tracing::warn!(selector = %raw_selector, "ignoring unparseable card selector");
            continue;
        };
        let cards: Vec<ElementRef<'_>> = document.select(&selector).collect();
        if cards.is_empty() {
            continue;
        }
        return cards
            .into_iter()
            .filter_map(|card| card_record(card, page_url))
            .collect();
    }

    Vec::new()
}

fn card_record(card: ElementRef<'_>, page_url: &str) -> Option<RawRecord> {
    let img = first(card, &["img"]);
    let name = first_text(card, NAME_SELECTORS)
        .or_else(|| img.and_then(|i| attr(i, "alt")))
        .or_else(|| first(card, &["a[title]"]).and_then(|a| attr(a, "title")));
    let image = img
        .and_then(|i| {
            attr(i, "src")
                .or_else(|| attr(i, "data-src"))
                .or_else(|| attr(i, "data-srcset").and_then(|s| first_srcset_url(&s)))
        })
        .map(|src| absolute(page_url, &src));

    if name.is_none() && image.is_none() {
        return None;
    }

    let link = card
        .value()
        .attr("href")
        .map(str::to_owned)
        .or_else(|| first(card, &["a[href]"]).and_then(|a| attr(a, "href")))
        .map(|href| absolute(page_url, &href));

    let current = first(card, PRICE_SELECTORS).and_then(|el| {
        attr(el, "content")
            .or_else(|| attr(el, "data-price"))
            .or_else(|| text_of(el))
    });
    let compare = first_text(card, COMPARE_SELECTORS);

    let mut offer = Map::new();
    match (current, compare) {
        (Some(current), Some(compare)) => {
            offer.insert("price".to_owned(), Value::String(compare));
            offer.insert("salePrice".to_owned(), Value::String(current));
        }
        (Some(current), None) => {
            offer.insert("price".to_owned(), Value::String(current));
        }
        (None, _) => {}
    }

    let mut record = Map::new();
    if let Some(id) = ID_ATTRIBUTES.iter().find_map(|a| attr(card, a)) {
        record.insert("productID".to_owned(), Value::String(id));
    }
    record.insert("name".to_owned(), Value::String(name.unwrap_or_default()));
    if let Some(link) = link {
        record.insert("url".to_owned(), Value::String(link));
    }
    record.insert(
        "image".to_owned(),
        Value::Array(image.into_iter().map(Value::String).collect()),
    );
    record.insert("offers".to_owned(), Value::Object(offer));
    Some(Value::Object(record))
}

fn first<'a>(scope: ElementRef<'a>, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|s| {
        let selector = Selector::parse(s).ok()?;
        scope.select(&selector).next()
    })
}

fn first_text(scope: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|s| {
        let selector = Selector::parse(s).ok()?;
        scope.select(&selector).find_map(text_of)
    })
}

fn text_of(el: ElementRef<'_>) -> Option<String> {
    let text = el.text().collect::<Vec<_>>().join(" ");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

fn attr(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn first_srcset_url(srcset: &str) -> Option<String> {
    srcset
        .split(',')
        .next()
        .and_then(|candidate| candidate.split_whitespace().next())
        .map(str::to_owned)
}

fn absolute(page_url: &str, reference: &str) -> String {
    resolve_url(page_url, reference).unwrap_or_else(|_| reference.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Vec<String> {
        DEFAULT_CARD_SELECTORS.iter().map(|s| (*s).to_owned()).collect()
    }

    const LISTING: &str = r#"
<html><body>
  <div class="grid">
    <div class="product-card" data-product-id="p-1">
      <a href="/products/linen-mini-dress"><img src="//cdn.harbor.example/1.jpg" alt="Linen Mini Dress"></a>
      <h3 class="product-card__title">Linen Mini Dress</h3>
      <span class="price">$89.00</span>
    </div>
    <div class="product-card">
      <a href="/products/wool-coat"><img data-src="/img/coat.jpg"></a>
      <h3>Wool Coat</h3>
      <s>$320.00</s><span class="price-item--sale">$240.00</span>
    </div>
    <div class="product-card"><p>Gift wrapping available</p></div>
  </div>
  <li class="product"><h2>Should Not Merge</h2><img src="/x.jpg"></li>
</body></html>"#;

    #[test]
    fn first_matching_selector_is_used_exclusively() {
        let cards = extract_listing_cards(LISTING, "https://harbor.example/shop", &defaults());
        let names: Vec<&str> = cards.iter().filter_map(|c| c["name"].as_str()).collect();
        assert_eq!(names, vec!["Linen Mini Dress", "Wool Coat"]);
    }

    #[test]
    fn card_fields_are_extracted_and_resolved() {
        let cards = extract_listing_cards(LISTING, "https://harbor.example/shop", &defaults());
        let dress = &cards[0];
        assert_eq!(dress["productID"], "p-1");
        assert_eq!(dress["url"], "https://harbor.example/products/linen-mini-dress");
        assert_eq!(dress["image"][0], "https://cdn.harbor.example/1.jpg");
        assert_eq!(dress["offers"]["price"], "$89.00");

        let coat = &cards[1];
        assert_eq!(coat["image"][0], "https://harbor.example/img/coat.jpg");
        assert_eq!(coat["offers"]["price"], "$320.00");
        assert_eq!(coat["offers"]["salePrice"], "$240.00");
    }

    #[test]
    fn custom_selectors_override_defaults() {
        let html = r#"<div class="product-tile"><h2>Canvas Tote</h2><img src="t.jpg"></div>"#;
        let cards = extract_listing_cards(
            html,
            "https://harbor.example/shop/",
            &[".product-tile".to_owned()],
        );
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0]["image"][0], "https://harbor.example/shop/t.jpg");
        assert!(cards[0]["offers"].as_object().unwrap().is_empty());
    }

    #[test]
    fn no_matching_selector_yields_nothing() {
        let cards = extract_listing_cards("<p>empty</p>", "https://harbor.example", &defaults());
        assert!(cards.is_empty());
    }

    #[test]
    fn extracted_cards_normalize() {
        use crate::normalize::{normalize, NormalizeContext};

        let cards = extract_listing_cards(LISTING, "https://harbor.example/shop", &defaults());
        let ctx = NormalizeContext {
            brand_id: 5,
            storefront_url: "https://harbor.example",
            default_currency: "USD",
        };
        let coat = normalize(&cards[1], &ctx).unwrap();
        assert_eq!(coat.external_id, "products-wool-coat");
        assert_eq!(coat.price.to_string(), "320.00");
        assert_eq!(coat.sale_price.map(|p| p.to_string()).as_deref(), Some("240.00"));
    }
}
