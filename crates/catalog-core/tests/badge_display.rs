// crates/catalog-core/tests/badge_display.rs
// ============================================================================
// Module: Badge Display and Expiry Tests
// Description: Display badge selection, expiry sweeps, and statistics.
// Purpose: Validate priority ordering and the active-badge projection.
// ============================================================================

//! ## Overview
//! Exercises display-badge selection over the fixed priority order, the
//! expiry sweep dropping past-deadline badges, and the aggregate statistics
//! report.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions are permitted."
)]

use std::sync::Arc;

use catalog_core::ActorId;
use catalog_core::BadgeType;
use catalog_core::Product;
use catalog_core::ProductId;
use catalog_core::Timestamp;
use catalog_core::interfaces::ProductStore;
use catalog_core::runtime::AssignOptions;
use catalog_core::runtime::BadgeEngine;
use catalog_core::runtime::CapturePublisher;
use catalog_core::runtime::InMemoryProductStore;

/// Builds a badge engine over a store with one empty product.
async fn engine() -> (BadgeEngine<InMemoryProductStore, CapturePublisher>, Arc<InMemoryProductStore>, ProductId)
{
    let store = Arc::new(InMemoryProductStore::new());
    let publisher = Arc::new(CapturePublisher::new());
    let product = Product::new(ProductId::new("p-1"), "Widget", 25.0, Timestamp::now());
    let id = store.create_product(&product).await.expect("create product");
    let engine = BadgeEngine::with_default_rules(Arc::clone(&store), publisher);
    (engine, store, id)
}

#[test]
fn priorities_follow_the_fixed_display_order() {
    assert!(BadgeType::New.priority() < BadgeType::LowStock.priority());
    assert!(BadgeType::LowStock.priority() < BadgeType::Sale.priority());
    assert!(BadgeType::Sale.priority() < BadgeType::Trending.priority());
    assert!(BadgeType::Trending.priority() < BadgeType::BestSeller.priority());
    assert!(BadgeType::BestSeller.priority() < BadgeType::Featured.priority());
}

#[tokio::test]
async fn the_display_badge_is_the_highest_priority_active_badge() {
    let (engine, _store, id) = engine().await;
    for badge_type in
        [BadgeType::New, BadgeType::Sale, BadgeType::BestSeller, BadgeType::Featured]
    {
        engine
            .assign_badge(&id, badge_type, AssignOptions::default(), Timestamp::now(), None)
            .await
            .expect("assign badge");
    }

    let badges = engine.product_badges(&id, Timestamp::now()).await.expect("product badges");
    assert_eq!(badges.badges.len(), 4);
    assert_eq!(badges.display_badge.expect("display badge").badge_type, BadgeType::Featured);
}

#[tokio::test]
async fn expired_badges_are_excluded_and_swept() {
    let (engine, store, id) = engine().await;
    let now = Timestamp::now();
    engine
        .assign_badge(
            &id,
            BadgeType::Sale,
            AssignOptions {
                expires_at: Some(now.minus_days(1)),
                ..AssignOptions::default()
            },
            now.minus_days(10),
            None,
        )
        .await
        .expect("assign expiring badge");
    engine
        .assign_badge(&id, BadgeType::Featured, AssignOptions::default(), now, None)
        .await
        .expect("assign durable badge");

    let badges = engine.product_badges(&id, now).await.expect("product badges");
    assert_eq!(badges.badges.len(), 1);
    assert_eq!(badges.display_badge.expect("display badge").badge_type, BadgeType::Featured);

    let report = engine.remove_expired_badges(now).await.expect("sweep");
    assert_eq!(report.badges_removed, 1);
    assert_eq!(report.products_updated, vec![id.clone()]);

    let product = store.get_product(&id).await.expect("get").expect("exists");
    assert_eq!(product.badges.len(), 1);

    let second = engine.remove_expired_badges(now).await.expect("second sweep");
    assert_eq!(second.badges_removed, 0);
}

#[tokio::test]
async fn statistics_partition_automated_manual_and_expired_badges() {
    let (engine, store, id) = engine().await;
    let now = Timestamp::now();
    let other = Product::new(ProductId::new("p-2"), "Gadget", 5.0, now);
    store.create_product(&other).await.expect("second product");

    engine
        .assign_badge(
            &id,
            BadgeType::Featured,
            AssignOptions {
                assigned_by: Some(ActorId::new("admin-1")),
                ..AssignOptions::default()
            },
            now,
            None,
        )
        .await
        .expect("manual badge");
    engine
        .assign_badge(
            &id,
            BadgeType::Sale,
            AssignOptions {
                expires_at: Some(now.minus_days(1)),
                ..AssignOptions::default()
            },
            now,
            None,
        )
        .await
        .expect("expired automated badge");
    engine
        .assign_badge(&other.id, BadgeType::New, AssignOptions::default(), now, None)
        .await
        .expect("automated badge");

    let stats = engine.statistics(now).await.expect("statistics");
    assert_eq!(stats.total_badges, 3);
    assert_eq!(stats.products_with_badges, 2);
    assert_eq!(stats.manual_badges, 1);
    assert_eq!(stats.automated_badges, 2);
    assert_eq!(stats.expired_badges, 1);
    assert_eq!(stats.badges_by_type.get(&BadgeType::Sale), Some(&1));
}
