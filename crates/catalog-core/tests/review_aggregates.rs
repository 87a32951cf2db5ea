// crates/catalog-core/tests/review_aggregates.rs
// ============================================================================
// Module: Review Aggregation Tests
// Description: Projection tests for review event handling.
// Purpose: Validate incremental mean, distribution consistency, and clamping.
// ============================================================================

//! ## Overview
//! Exercises the review projection end to end against the in-memory store:
//! incremental averages, distribution bookkeeping, verified-purchase counts,
//! and the reset-to-zero rule when the last review is removed.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::float_cmp,
    reason = "Test-only assertions and exact 2dp comparisons are permitted."
)]

use std::sync::Arc;

use catalog_core::Product;
use catalog_core::ProductId;
use catalog_core::Timestamp;
use catalog_core::interfaces::ProductStore;
use catalog_core::runtime::BadgeEngine;
use catalog_core::runtime::CapturePublisher;
use catalog_core::runtime::InMemoryProductStore;
use catalog_core::runtime::ProjectionEngine;
use catalog_core::runtime::ReviewEvent;
use catalog_core::runtime::ReviewUpdatedEvent;

/// Builds a projection engine over a fresh store with one product.
async fn engine_with_product(
    price: f64,
) -> (ProjectionEngine<InMemoryProductStore, CapturePublisher>, Arc<InMemoryProductStore>, ProductId)
{
    let store = Arc::new(InMemoryProductStore::new());
    let publisher = Arc::new(CapturePublisher::new());
    let product = Product::new(ProductId::new("p-1"), "Widget", price, Timestamp::now());
    let id = store.create_product(&product).await.expect("create product");
    let badges = BadgeEngine::with_default_rules(Arc::clone(&store), Arc::clone(&publisher));
    let engine = ProjectionEngine::new(Arc::clone(&store), publisher, badges);
    (engine, store, id)
}

/// Loads the product back from the store.
async fn load(store: &Arc<InMemoryProductStore>, id: &ProductId) -> Product {
    store.get_product(id).await.expect("get product").expect("product exists")
}

#[tokio::test]
async fn two_reviews_average_to_the_weighted_mean() {
    let (engine, store, id) = engine_with_product(10.0).await;
    let five = ReviewEvent {
        product_id: id.clone(),
        rating: 5,
        verified_purchase: true,
    };
    let three = ReviewEvent {
        product_id: id.clone(),
        rating: 3,
        verified_purchase: false,
    };
    engine.handle_review_created(&five, None).await.expect("first review");
    engine.handle_review_created(&three, None).await.expect("second review");

    let aggregates = load(&store, &id).await.review_aggregates;
    assert_eq!(aggregates.average_rating, 4.00);
    assert_eq!(aggregates.total_reviews, 2);
    assert_eq!(aggregates.verified_purchase_count, 1);
    assert_eq!(aggregates.rating_distribution.count(3), 1);
    assert_eq!(aggregates.rating_distribution.count(5), 1);
    assert_eq!(aggregates.rating_distribution.count(1), 0);

    engine.handle_review_deleted(&five, None).await.expect("delete review");
    let aggregates = load(&store, &id).await.review_aggregates;
    assert_eq!(aggregates.average_rating, 3.00);
    assert_eq!(aggregates.total_reviews, 1);
    assert_eq!(aggregates.verified_purchase_count, 0);
}

#[tokio::test]
async fn add_then_delete_restores_the_prior_aggregates() {
    let (engine, store, id) = engine_with_product(10.0).await;
    for rating in [3, 4, 4] {
        let event = ReviewEvent {
            product_id: id.clone(),
            rating,
            verified_purchase: false,
        };
        engine.handle_review_created(&event, None).await.expect("seed review");
    }
    let before = load(&store, &id).await.review_aggregates;

    let five = ReviewEvent {
        product_id: id.clone(),
        rating: 5,
        verified_purchase: true,
    };
    engine.handle_review_created(&five, None).await.expect("add review");
    engine.handle_review_deleted(&five, None).await.expect("delete review");

    let after = load(&store, &id).await.review_aggregates;
    assert_eq!(before, after);
}

#[tokio::test]
async fn deleting_the_last_review_resets_the_average_to_zero() {
    let (engine, store, id) = engine_with_product(10.0).await;
    let event = ReviewEvent {
        product_id: id.clone(),
        rating: 4,
        verified_purchase: true,
    };
    engine.handle_review_created(&event, None).await.expect("add review");
    engine.handle_review_deleted(&event, None).await.expect("delete review");

    let aggregates = load(&store, &id).await.review_aggregates;
    assert_eq!(aggregates.average_rating, 0.0);
    assert_eq!(aggregates.total_reviews, 0);
    assert_eq!(aggregates.verified_purchase_count, 0);
    assert_eq!(aggregates.rating_distribution.total(), 0);
}

#[tokio::test]
async fn deletes_on_an_empty_aggregate_clamp_at_zero() {
    let (engine, store, id) = engine_with_product(10.0).await;
    let event = ReviewEvent {
        product_id: id.clone(),
        rating: 2,
        verified_purchase: true,
    };
    engine.handle_review_deleted(&event, None).await.expect("delete on empty");

    let aggregates = load(&store, &id).await.review_aggregates;
    assert_eq!(aggregates.total_reviews, 0);
    assert_eq!(aggregates.rating_distribution.count(2), 0);
}

#[tokio::test]
async fn review_update_swaps_the_old_rating_for_the_new_one() {
    let (engine, store, id) = engine_with_product(10.0).await;
    let created = ReviewEvent {
        product_id: id.clone(),
        rating: 2,
        verified_purchase: false,
    };
    engine.handle_review_created(&created, None).await.expect("create review");

    let updated = ReviewUpdatedEvent {
        product_id: id.clone(),
        old_rating: Some(2),
        rating: 5,
        verified_purchase: false,
    };
    engine.handle_review_updated(&updated, None).await.expect("update review");

    let aggregates = load(&store, &id).await.review_aggregates;
    assert_eq!(aggregates.total_reviews, 1);
    assert_eq!(aggregates.average_rating, 5.00);
    assert_eq!(aggregates.rating_distribution.count(2), 0);
    assert_eq!(aggregates.rating_distribution.count(5), 1);
}

#[tokio::test]
async fn out_of_range_ratings_are_rejected_as_validation_failures() {
    let (engine, _store, id) = engine_with_product(10.0).await;
    let event = ReviewEvent {
        product_id: id,
        rating: 6,
        verified_purchase: false,
    };
    let err = engine.handle_review_created(&event, None).await.expect_err("rating out of range");
    assert_eq!(err.http_status(), 400);
}

#[tokio::test]
async fn missing_target_products_are_treated_as_delivered() {
    let (engine, _store, _id) = engine_with_product(10.0).await;
    let event = ReviewEvent {
        product_id: ProductId::new("ghost"),
        rating: 5,
        verified_purchase: false,
    };
    engine.handle_review_created(&event, None).await.expect("missing target is acked");
}
