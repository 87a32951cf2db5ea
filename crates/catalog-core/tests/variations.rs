// crates/catalog-core/tests/variations.rs
// ============================================================================
// Module: Variation Engine Tests
// Description: Family creation, inheritance, uniqueness, and matrix views.
// Purpose: Validate parent/child invariants end to end.
// ============================================================================

//! ## Overview
//! Exercises the variation engine: atomic family creation with inheritance,
//! case-insensitive attribute-tuple uniqueness, matrix assembly with
//! availability, attribute filtering, and child update/delete bookkeeping.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::float_cmp,
    reason = "Test-only assertions and exact price comparisons are permitted."
)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use catalog_core::ActorId;
use catalog_core::CatalogError;
use catalog_core::ConflictKind;
use catalog_core::ProductId;
use catalog_core::Sku;
use catalog_core::Timestamp;
use catalog_core::VariantAttribute;
use catalog_core::VariationKind;
use catalog_core::interfaces::ProductStore;
use catalog_core::normalize_attribute_tuple;
use catalog_core::runtime::CapturePublisher;
use catalog_core::runtime::ChildSpec;
use catalog_core::runtime::ChildUpdate;
use catalog_core::runtime::InMemoryProductStore;
use catalog_core::runtime::ParentSpec;
use catalog_core::runtime::VariationEngine;

/// Builds a variation engine with a deterministic id factory.
fn engine() -> (VariationEngine<InMemoryProductStore, CapturePublisher>, Arc<InMemoryProductStore>)
{
    let store = Arc::new(InMemoryProductStore::new());
    let publisher = Arc::new(CapturePublisher::new());
    let counter = AtomicU64::new(0);
    let ids = Arc::new(move || {
        let seq = counter.fetch_add(1, Ordering::Relaxed);
        ProductId::new(format!("v-{seq}"))
    });
    (VariationEngine::new(Arc::clone(&store), publisher, ids), store)
}

/// Builds a child spec with color/size attributes.
fn child(sku: &str, color: &str, size: &str) -> ChildSpec {
    ChildSpec {
        sku: Sku::new(sku),
        price: 19.99,
        attributes: vec![
            VariantAttribute::new("color", color),
            VariantAttribute::new("size", size),
        ],
        ..ChildSpec::default()
    }
}

/// The shirt family used across these tests.
fn shirt_parent() -> ParentSpec {
    ParentSpec {
        name: "T".to_string(),
        brand: Some("B".to_string()),
        department: Some("D".to_string()),
        category: Some("Clothing".to_string()),
        ..ParentSpec::default()
    }
}

#[tokio::test]
async fn creating_a_family_persists_parent_and_inheriting_children() {
    let (engine, store) = engine();
    let children = vec![child("R-S", "red", "S"), child("R-M", "red", "M"), child("B-S", "blue", "S")];
    let family = engine
        .create_parent_with_children(shirt_parent(), children, &ActorId::new("admin-1"), Timestamp::now(), None)
        .await
        .expect("create family");
    assert_eq!(family.child_ids.len(), 3);

    let parent = store.get_product(&family.parent_id).await.expect("get").expect("parent");
    assert_eq!(parent.variation_type, VariationKind::Parent);
    assert_eq!(parent.variation_count, 3);

    for child_id in &family.child_ids {
        let doc = store.get_product(child_id).await.expect("get").expect("child");
        assert_eq!(doc.variation_type, VariationKind::Child);
        assert_eq!(doc.parent_id.as_ref(), Some(&family.parent_id));
        assert_eq!(doc.brand.as_deref(), Some("B"));
        assert_eq!(doc.department.as_deref(), Some("D"));
    }
}

#[tokio::test]
async fn attribute_tuples_collide_case_insensitively() {
    let (engine, _store) = engine();
    let children = vec![child("R-S", "red", "S"), child("R-M", "red", "M"), child("B-S", "blue", "S")];
    let family = engine
        .create_parent_with_children(shirt_parent(), children, &ActorId::new("admin-1"), Timestamp::now(), None)
        .await
        .expect("create family");

    let clash = ChildSpec {
        sku: Sku::new("R-S-2"),
        price: 21.0,
        attributes: vec![
            VariantAttribute::new("Color", "RED"),
            VariantAttribute::new("Size", "s"),
        ],
        ..ChildSpec::default()
    };
    let err = engine
        .add_child(&family.parent_id, clash, &ActorId::new("admin-1"), Timestamp::now(), None)
        .await
        .expect_err("tuple collision");
    match err {
        CatalogError::Conflict {
            kind, ..
        } => assert_eq!(kind, ConflictKind::DuplicateAttributeTuple),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn duplicate_skus_within_one_request_are_rejected() {
    let (engine, _store) = engine();
    let children = vec![child("R-S", "red", "S"), child("R-S", "blue", "M")];
    let err = engine
        .create_parent_with_children(shirt_parent(), children, &ActorId::new("admin-1"), Timestamp::now(), None)
        .await
        .expect_err("duplicate sku in request");
    match err {
        CatalogError::Conflict {
            kind, ..
        } => assert_eq!(kind, ConflictKind::DuplicateSku),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn the_matrix_reflects_prices_attributes_and_availability() {
    let (engine, store) = engine();
    let children = vec![child("R-S", "red", "S"), child("B-S", "blue", "S")];
    let family = engine
        .create_parent_with_children(shirt_parent(), children, &ActorId::new("admin-1"), Timestamp::now(), None)
        .await
        .expect("create family");

    // Restock the first child so exactly one matrix row is purchasable.
    store
        .atomic_set(&family.child_ids[0], &[(
            "availabilityStatus".to_string(),
            serde_json::json!({
                "state": "inStock",
                "availableQuantity": 20,
                "lowStockThreshold": 5,
            }),
        )])
        .await
        .expect("restock child");

    let view = engine.parent_view(&family.parent_id).await.expect("parent view");
    assert_eq!(view.total_variations, 2);
    let in_stock: Vec<_> = view.variations.iter().filter(|entry| entry.available).collect();
    assert_eq!(in_stock.len(), 1);
    assert_eq!(in_stock[0].sku, Sku::new("R-S"));
    assert_eq!(in_stock[0].attributes.get("color").map(String::as_str), Some("red"));
    assert_eq!(in_stock[0].price, 19.99);
}

#[tokio::test]
async fn filtering_children_matches_constraints_case_insensitively() {
    let (engine, _store) = engine();
    let children = vec![child("R-S", "Red", "S"), child("R-M", "Red", "M"), child("B-S", "Blue", "S")];
    let family = engine
        .create_parent_with_children(shirt_parent(), children, &ActorId::new("admin-1"), Timestamp::now(), None)
        .await
        .expect("create family");

    let constraints = BTreeMap::from([("COLOR".to_string(), "red".to_string())]);
    let matches = engine
        .filter_children(&family.parent_id, &constraints)
        .await
        .expect("filter children");
    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|entry| entry.attributes["color"].eq_ignore_ascii_case("red")));
}

#[tokio::test]
async fn updating_attributes_rechecks_uniqueness_and_appends_history() {
    let (engine, store) = engine();
    let children = vec![child("R-S", "red", "S"), child("R-M", "red", "M")];
    let family = engine
        .create_parent_with_children(shirt_parent(), children, &ActorId::new("admin-1"), Timestamp::now(), None)
        .await
        .expect("create family");

    let collide = ChildUpdate {
        attributes: Some(vec![
            VariantAttribute::new("color", "red"),
            VariantAttribute::new("size", "M"),
        ]),
        ..ChildUpdate::default()
    };
    let err = engine
        .update_child(&family.child_ids[0], collide, &ActorId::new("admin-2"), Timestamp::now(), None)
        .await
        .expect_err("rename collides with sibling");
    assert_eq!(err.http_status(), 409);

    let rename = ChildUpdate {
        price: Some(24.99),
        attributes: Some(vec![
            VariantAttribute::new("color", "red"),
            VariantAttribute::new("size", "XL"),
        ]),
        ..ChildUpdate::default()
    };
    engine
        .update_child(&family.child_ids[0], rename, &ActorId::new("admin-2"), Timestamp::now(), None)
        .await
        .expect("rename child");

    let updated = store.get_product(&family.child_ids[0]).await.expect("get").expect("child");
    assert_eq!(updated.price, 24.99);
    assert_eq!(updated.variant_attributes_index.get("size").map(String::as_str), Some("XL"));
    let entry = updated.history.last().expect("history entry");
    assert_eq!(entry.actor, ActorId::new("admin-2"));
    assert!(entry.changes.contains_key("price"));
}

#[tokio::test]
async fn deleting_a_child_soft_deletes_and_decrements_the_parent() {
    let (engine, store) = engine();
    let children = vec![child("R-S", "red", "S"), child("R-M", "red", "M")];
    let family = engine
        .create_parent_with_children(shirt_parent(), children, &ActorId::new("admin-1"), Timestamp::now(), None)
        .await
        .expect("create family");

    engine
        .delete_child(&family.child_ids[0], &ActorId::new("admin-1"), Timestamp::now(), None)
        .await
        .expect("delete child");

    let deleted = store.get_product(&family.child_ids[0]).await.expect("get").expect("child");
    assert!(!deleted.is_active);
    let parent = store.get_product(&family.parent_id).await.expect("get").expect("parent");
    assert_eq!(parent.variation_count, 1);

    let view = engine.parent_view(&family.parent_id).await.expect("parent view");
    assert_eq!(view.total_variations, 1);
}

#[test]
fn normalized_tuples_ignore_order_and_case() {
    let left = vec![VariantAttribute::new("Color", "Red"), VariantAttribute::new("size", "M")];
    let right = vec![VariantAttribute::new("SIZE", "m"), VariantAttribute::new("color", "red")];
    assert_eq!(normalize_attribute_tuple(&left), normalize_attribute_tuple(&right));
}
