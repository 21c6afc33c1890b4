use super::catalog::{catalog_page_url, collection_endpoint};
use super::*;

#[test]
fn catalog_page_url_appends_limit_and_page() {
    let url = catalog_page_url("https://example-co.com/products.json", 250, 3).unwrap();
    assert_eq!(url, "https://example-co.com/products.json?limit=250&page=3");
}

#[test]
fn catalog_page_url_rejects_invalid_endpoint() {
    let err = catalog_page_url("not-a-url/products.json", 250, 1).unwrap_err();
    assert!(
        matches!(err, ScraperError::InvalidUrl { .. }),
        "expected InvalidUrl, got: {err:?}"
    );
}

#[test]
fn collection_endpoint_from_bare_handle() {
    assert_eq!(
        collection_endpoint("https://example-co.com", "new-arrivals"),
        "https://example-co.com/collections/new-arrivals/products.json"
    );
}

#[test]
fn collection_endpoint_from_relative_path() {
    assert_eq!(
        collection_endpoint("https://example-co.com", "/collections/sale/"),
        "https://example-co.com/collections/sale/products.json"
    );
    assert_eq!(
        collection_endpoint("https://example-co.com", "en-gb/collections/sale/products.json"),
        "https://example-co.com/en-gb/collections/sale/products.json"
    );
}

#[test]
fn extract_store_origin_strips_path() {
    assert_eq!(
        extract_store_origin("https://example-co.com/collections/all"),
        "https://example-co.com"
    );
    assert_eq!(
        extract_store_origin("https://example-co.com/"),
        "https://example-co.com"
    );
}

#[test]
fn extract_domain_strips_scheme_and_path() {
    assert_eq!(extract_domain("https://shop.example.com/products"), "shop.example.com");
    assert_eq!(extract_domain("example.com"), "example.com");
}

#[test]
fn resolve_url_handles_relative_references() {
    assert_eq!(
        resolve_url("https://shop.example.com/collections/all", "/products/linen-dress").unwrap(),
        "https://shop.example.com/products/linen-dress"
    );
    assert_eq!(
        resolve_url("https://shop.example.com/shop/", "tops/tee").unwrap(),
        "https://shop.example.com/shop/tops/tee"
    );
    assert_eq!(
        resolve_url("https://shop.example.com/", "https://cdn.example.com/a.jpg").unwrap(),
        "https://cdn.example.com/a.jpg"
    );
}

#[test]
fn parse_sitemap_reads_urlset() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example-co.com/products/linen-mini-dress</loc></url>
  <url><loc> https://example-co.com/products/silk-slip-dress?variant=1&amp;x=2 </loc></url>
</urlset>"#;
    let sitemap = parse_sitemap(xml).unwrap();
    assert!(!sitemap.is_index);
    assert_eq!(
        sitemap.locations,
        vec![
            "https://example-co.com/products/linen-mini-dress",
            "https://example-co.com/products/silk-slip-dress?variant=1&x=2",
        ]
    );
}

#[test]
fn parse_sitemap_detects_index() {
    let xml = r"<sitemapindex>
  <sitemap><loc>https://example-co.com/sitemap_products_1.xml</loc></sitemap>
  <sitemap><loc>https://example-co.com/sitemap_pages_1.xml</loc></sitemap>
</sitemapindex>";
    let sitemap = parse_sitemap(xml).unwrap();
    assert!(sitemap.is_index);
    assert_eq!(sitemap.locations.len(), 2);
}

#[test]
fn parse_sitemap_rejects_malformed_xml() {
    let err = parse_sitemap("<urlset><url><loc>x</url></urlset>").unwrap_err();
    assert!(matches!(err, ScraperError::Xml { .. }), "got: {err:?}");
}

#[test]
fn browser_profile_overrides_user_agent() {
    let profile = RequestProfile::browser();
    assert_eq!(profile.user_agent, Some(BROWSER_FALLBACK_UA));
    assert!(profile.bearer_token.is_none());
}
