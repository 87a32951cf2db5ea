// crates/catalog-core/tests/badge_rules.rs
// ============================================================================
// Module: Badge Rule Engine Tests
// Description: Automated rule evaluation, manual precedence, and dry runs.
// Purpose: Validate should-add/should-remove classification end to end.
// ============================================================================

//! ## Overview
//! Exercises the best-seller rule lifecycle: assignment when sales cross the
//! threshold, auto-removal when they fall back, manual badges surviving any
//! number of evaluations, and dry runs leaving documents untouched.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions are permitted."
)]

use std::sync::Arc;

use catalog_core::ActorId;
use catalog_core::BadgeType;
use catalog_core::ConflictKind;
use catalog_core::Product;
use catalog_core::ProductId;
use catalog_core::SalesMetrics;
use catalog_core::SalesPeriod;
use catalog_core::Timestamp;
use catalog_core::CatalogError;
use catalog_core::interfaces::ProductStore;
use catalog_core::runtime::AssignOptions;
use catalog_core::runtime::BadgeEngine;
use catalog_core::runtime::CapturePublisher;
use catalog_core::runtime::EvaluateOptions;
use catalog_core::runtime::InMemoryProductStore;
use catalog_core::topics;

/// Builds a badge engine over a store holding one product with sales units.
async fn engine_with_sales(
    units: u64,
) -> (BadgeEngine<InMemoryProductStore, CapturePublisher>, Arc<InMemoryProductStore>, Arc<CapturePublisher>, ProductId)
{
    let store = Arc::new(InMemoryProductStore::new());
    let publisher = Arc::new(CapturePublisher::new());
    let mut product = Product::new(ProductId::new("p-1"), "Widget", 25.0, Timestamp::now());
    product.sales_metrics = Some(SalesMetrics {
        last30_days: Some(SalesPeriod {
            units,
        }),
        ..SalesMetrics::default()
    });
    let id = store.create_product(&product).await.expect("create product");
    let engine = BadgeEngine::with_default_rules(Arc::clone(&store), Arc::clone(&publisher));
    (engine, store, publisher, id)
}

/// Evaluation options scoped to the best-seller rule for one product.
fn best_seller_options(id: &ProductId, dry_run: bool) -> EvaluateOptions {
    EvaluateOptions {
        product_ids: Some(vec![id.clone()]),
        badge_types: Some(vec![BadgeType::BestSeller]),
        dry_run,
    }
}

#[tokio::test]
async fn crossing_the_sales_threshold_assigns_an_automated_badge() {
    let (engine, store, publisher, id) = engine_with_sales(1_500).await;
    let report = engine
        .evaluate_rules(best_seller_options(&id, false), Timestamp::now(), None)
        .await
        .expect("evaluate");
    assert_eq!(report.badges_added, 1);

    let product = store.get_product(&id).await.expect("get").expect("exists");
    let badge = product.badges.first().expect("badge present");
    assert_eq!(badge.badge_type, BadgeType::BestSeller);
    assert!(badge.is_automated());
    assert_eq!(publisher.events_for(topics::BADGE_AUTO_ASSIGNED).len(), 1);
}

#[tokio::test]
async fn falling_below_the_threshold_removes_the_automated_badge() {
    let (engine, store, publisher, id) = engine_with_sales(1_500).await;
    engine
        .evaluate_rules(best_seller_options(&id, false), Timestamp::now(), None)
        .await
        .expect("first evaluation");

    store
        .atomic_set(&id, &[(
            "salesMetrics.last30Days.units".to_string(),
            serde_json::json!(500),
        )])
        .await
        .expect("drop sales");
    let report = engine
        .evaluate_rules(best_seller_options(&id, false), Timestamp::now(), None)
        .await
        .expect("second evaluation");
    assert_eq!(report.badges_removed, 1);

    let product = store.get_product(&id).await.expect("get").expect("exists");
    assert!(product.badges.is_empty());
    assert_eq!(publisher.events_for(topics::BADGE_AUTO_REMOVED).len(), 1);
}

#[tokio::test]
async fn manual_badges_survive_rule_evaluation() {
    let (engine, store, _publisher, id) = engine_with_sales(500).await;
    engine
        .assign_badge(
            &id,
            BadgeType::BestSeller,
            AssignOptions {
                assigned_by: Some(ActorId::new("admin-1")),
                ..AssignOptions::default()
            },
            Timestamp::now(),
            None,
        )
        .await
        .expect("manual assignment");

    for _ in 0..3 {
        engine
            .evaluate_rules(best_seller_options(&id, false), Timestamp::now(), None)
            .await
            .expect("evaluate");
    }

    let product = store.get_product(&id).await.expect("get").expect("exists");
    let badge = product.badges.first().expect("badge still present");
    assert_eq!(badge.badge_type, BadgeType::BestSeller);
    assert!(!badge.is_automated());
}

#[tokio::test]
async fn satisfied_rules_skip_types_held_manually() {
    let (engine, _store, _publisher, id) = engine_with_sales(2_000).await;
    engine
        .assign_badge(
            &id,
            BadgeType::BestSeller,
            AssignOptions {
                assigned_by: Some(ActorId::new("admin-1")),
                ..AssignOptions::default()
            },
            Timestamp::now(),
            None,
        )
        .await
        .expect("manual assignment");

    let report = engine
        .evaluate_rules(best_seller_options(&id, false), Timestamp::now(), None)
        .await
        .expect("evaluate");
    assert_eq!(report.badges_added, 0);
    let skipped = &report.results[0].skipped;
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].reason, "manual-precedence");
}

#[tokio::test]
async fn dry_run_reports_changes_without_applying_them() {
    let (engine, store, publisher, id) = engine_with_sales(1_500).await;
    let before = store.get_product(&id).await.expect("get").expect("exists");
    let report = engine
        .evaluate_rules(best_seller_options(&id, true), Timestamp::now(), None)
        .await
        .expect("dry run");
    assert_eq!(report.badges_added, 1);

    let after = store.get_product(&id).await.expect("get").expect("exists");
    assert_eq!(before, after);
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn assigning_a_duplicate_badge_type_conflicts() {
    let (engine, _store, _publisher, id) = engine_with_sales(0).await;
    engine
        .assign_badge(&id, BadgeType::Sale, AssignOptions::default(), Timestamp::now(), None)
        .await
        .expect("first assignment");
    let err = engine
        .assign_badge(&id, BadgeType::Sale, AssignOptions::default(), Timestamp::now(), None)
        .await
        .expect_err("duplicate assignment");
    match err {
        CatalogError::Conflict {
            kind, ..
        } => assert_eq!(kind, ConflictKind::DuplicateBadge),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn removing_an_absent_badge_is_not_found() {
    let (engine, _store, _publisher, id) = engine_with_sales(0).await;
    let err = engine
        .remove_badge(&id, BadgeType::Featured, None)
        .await
        .expect_err("badge not present");
    assert_eq!(err.http_status(), 404);
}

#[tokio::test]
async fn bulk_assignment_classifies_per_product_outcomes() {
    let (engine, store, _publisher, id) = engine_with_sales(0).await;
    let second = Product::new(ProductId::new("p-2"), "Gadget", 5.0, Timestamp::now());
    store.create_product(&second).await.expect("second product");
    engine
        .assign_badge(&id, BadgeType::Featured, AssignOptions::default(), Timestamp::now(), None)
        .await
        .expect("pre-assign");

    let report = engine
        .bulk_assign(
            &[id.clone(), second.id.clone(), ProductId::new("ghost")],
            BadgeType::Featured,
            AssignOptions::default(),
            Timestamp::now(),
            None,
        )
        .await
        .expect("bulk assign");
    assert_eq!(report.total_processed, 3);
    assert_eq!(report.success, vec![second.id]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.failed.len(), 1);
}
