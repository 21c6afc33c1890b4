mod common;

use std::sync::Arc;

use catdb_core::{Classification, NormalizedProduct, NormalizedVariant};
use catdb_sync::{UpsertEngine, UpsertResult};
use chrono::Utc;
use common::MemoryStore;
use rust_decimal::Decimal;

fn product(external_id: &str, name: &str) -> NormalizedProduct {
    NormalizedProduct {
        brand_id: 1,
        external_id: external_id.to_string(),
        name: name.to_string(),
        description: None,
        product_type: None,
        price: Decimal::new(8900, 2),
        sale_price: None,
        currency: "USD".to_string(),
        image_url: "https://cdn.example-co.com/1.jpg".to_string(),
        additional_images: Vec::new(),
        product_url: format!("https://example-co.com/products/{external_id}"),
        variants: vec![NormalizedVariant {
            id: format!("{external_id}-1"),
            title: "Default".to_string(),
            sku: None,
            price: Some(Decimal::new(8900, 2)),
            compare_at_price: None,
            in_stock: true,
        }],
        is_available: true,
        classification: None,
        last_checked_at: Utc::now(),
    }
}

fn mini_dress() -> Classification {
    Classification {
        category_id: "aa-1-4-1".to_string(),
        category_name: "Mini Dresses".to_string(),
        taxonomy_path: "Apparel & Accessories > Clothing > Dresses > Mini Dresses".to_string(),
        depth: 4,
    }
}

#[tokio::test]
async fn repeated_upsert_updates_the_same_row() {
    let store = Arc::new(MemoryStore::default());
    let engine = UpsertEngine::new(Arc::clone(&store));

    let first = engine.upsert(&product("101", "Linen Dress")).await.unwrap();
    let mut changed = product("101", "Linen Dress");
    changed.price = Decimal::new(7900, 2);
    let second = engine.upsert(&changed).await.unwrap();

    assert!(first.created);
    assert_eq!(
        second,
        UpsertResult {
            created: false,
            id: first.id
        }
    );
    let rows = store.products();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].product.price, Decimal::new(7900, 2));
}

#[tokio::test]
async fn falls_back_to_name_when_external_id_changes() {
    let store = Arc::new(MemoryStore::default());
    let existing = store.seed_product(product("old-id", "Wool Coat"));
    let engine = UpsertEngine::new(Arc::clone(&store));

    let result = engine.upsert(&product("new-id", "Wool Coat")).await.unwrap();

    assert!(!result.created);
    assert_eq!(result.id, existing);
    let rows = store.products();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].product.external_id, "new-id");
}

#[tokio::test]
async fn names_are_brand_scoped() {
    let store = Arc::new(MemoryStore::default());
    let mut other_brand = product("x", "Wool Coat");
    other_brand.brand_id = 2;
    store.seed_product(other_brand);
    let engine = UpsertEngine::new(Arc::clone(&store));

    let result = engine.upsert(&product("y", "Wool Coat")).await.unwrap();

    assert!(result.created);
    assert_eq!(store.products().len(), 2);
}

#[tokio::test]
async fn insert_conflict_is_retried_as_update() {
    let store = Arc::new(MemoryStore::default());
    store.race_next_insert();
    let engine = UpsertEngine::new(Arc::clone(&store));

    let result = engine.upsert(&product("202", "Silk Scarf")).await.unwrap();

    assert!(!result.created);
    assert_eq!(store.products().len(), 1);
    assert_eq!(store.write_counts(), (0, 1));
}

#[tokio::test]
async fn category_links_are_replaced_on_every_upsert() {
    let store = Arc::new(MemoryStore::default());
    let engine = UpsertEngine::new(Arc::clone(&store));

    let mut classified = product("303", "Sequin Mini Dress");
    classified.classification = Some(mini_dress());
    let result = engine.upsert(&classified).await.unwrap();
    assert_eq!(
        store.categories(result.id),
        vec!["aa", "aa-1", "aa-1-4", "aa-1-4-1"]
    );

    engine.upsert(&product("303", "Sequin Mini Dress")).await.unwrap();
    assert!(store.categories(result.id).is_empty());
}

#[tokio::test]
async fn resolve_never_writes() {
    let store = Arc::new(MemoryStore::default());
    let engine = UpsertEngine::new(Arc::clone(&store));

    assert_eq!(engine.resolve(&product("404", "Canvas Tote")).await.unwrap(), None);
    assert!(store.products().is_empty());
    assert_eq!(store.write_counts(), (0, 0));
}
