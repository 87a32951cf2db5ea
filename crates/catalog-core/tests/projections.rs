// crates/catalog-core/tests/projections.rs
// ============================================================================
// Module: Q&A and Metrics Projection Tests
// Description: Question/answer counters and analytics-driven rule triggers.
// Purpose: Validate counter clamping and metric-driven badge evaluation.
// ============================================================================

//! ## Overview
//! Exercises the Q&A counters (including the clamp at zero) and the
//! analytics handlers that cache metrics and re-evaluate the sales and
//! trending badge rules for the affected product.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::float_cmp,
    reason = "Test-only assertions and exact 2dp comparisons are permitted."
)]

use std::sync::Arc;

use catalog_core::BadgeType;
use catalog_core::Product;
use catalog_core::ProductId;
use catalog_core::Timestamp;
use catalog_core::interfaces::ProductStore;
use catalog_core::runtime::BadgeEngine;
use catalog_core::runtime::CapturePublisher;
use catalog_core::runtime::InMemoryProductStore;
use catalog_core::runtime::ProjectionEngine;
use catalog_core::runtime::QaEvent;
use catalog_core::runtime::SalesEvent;
use catalog_core::runtime::ViewsEvent;
use catalog_core::runtime::view_growth_percent;

/// Builds a projection engine over a store with one product.
async fn fixture() -> (
    ProjectionEngine<InMemoryProductStore, CapturePublisher>,
    Arc<InMemoryProductStore>,
    ProductId,
) {
    let store = Arc::new(InMemoryProductStore::new());
    let publisher = Arc::new(CapturePublisher::new());
    let product = Product::new(ProductId::new("p-1"), "Widget", 25.0, Timestamp::now());
    let id = store.create_product(&product).await.expect("create product");
    let badges = BadgeEngine::with_default_rules(Arc::clone(&store), Arc::clone(&publisher));
    let engine = ProjectionEngine::new(Arc::clone(&store), publisher, badges);
    (engine, store, id)
}

#[tokio::test]
async fn question_and_answer_counters_track_events() {
    let (engine, store, id) = fixture().await;
    let event = QaEvent {
        product_id: id.clone(),
    };
    engine.handle_question_created(&event, Timestamp::now(), None).await.expect("question");
    engine.handle_question_created(&event, Timestamp::now(), None).await.expect("question");
    engine.handle_answer_created(&event, Timestamp::now(), None).await.expect("answer");

    let stats = store.get_product(&id).await.expect("get").expect("exists").qa_stats;
    assert_eq!(stats.total_questions, 2);
    assert_eq!(stats.answered_questions, 1);
    assert!(stats.last_updated.is_some());
}

#[tokio::test]
async fn question_deletion_clamps_at_zero() {
    let (engine, store, id) = fixture().await;
    let event = QaEvent {
        product_id: id.clone(),
    };
    engine.handle_question_deleted(&event, Timestamp::now(), None).await.expect("delete");
    engine.handle_question_created(&event, Timestamp::now(), None).await.expect("create");
    engine.handle_question_deleted(&event, Timestamp::now(), None).await.expect("delete");
    engine.handle_question_deleted(&event, Timestamp::now(), None).await.expect("delete again");

    let stats = store.get_product(&id).await.expect("get").expect("exists").qa_stats;
    assert_eq!(stats.total_questions, 0);
}

#[tokio::test]
async fn sales_updates_cache_metrics_and_fire_the_best_seller_rule() {
    let (engine, store, id) = fixture().await;
    let event = SalesEvent {
        product_id: id.clone(),
        category: Some("Clothing".to_string()),
        sales_last30_days: 1_500,
        category_rank: Some(3),
    };
    engine.handle_sales_updated(&event, Timestamp::now(), None).await.expect("sales update");

    let product = store.get_product(&id).await.expect("get").expect("exists");
    let metrics = product.sales_metrics.clone().expect("metrics cached");
    assert_eq!(metrics.last30_days.expect("window").units, 1_500);
    assert_eq!(metrics.category_rank, Some(3));
    assert!(product.has_badge(BadgeType::BestSeller));
}

#[tokio::test]
async fn view_updates_cache_growth_without_firing_unrelated_rules() {
    let (engine, store, id) = fixture().await;
    let event = ViewsEvent {
        product_id: id.clone(),
        views_last7_days: 300,
        views_prior7_days: 200,
    };
    engine.handle_views_updated(&event, Timestamp::now(), None).await.expect("views update");

    let product = store.get_product(&id).await.expect("get").expect("exists");
    let metrics = product.view_metrics.clone().expect("metrics cached");
    assert_eq!(metrics.last7_days.expect("window").views, 300);
    assert_eq!(metrics.growth_percent, Some(50.0));
    // The trending rule also needs sales, so no badge is assigned here.
    assert!(product.badges.is_empty());
}

#[test]
fn growth_percent_is_zero_when_the_prior_window_is_empty() {
    assert_eq!(view_growth_percent(500, 0), 0.0);
    assert_eq!(view_growth_percent(150, 100), 50.0);
    assert_eq!(view_growth_percent(50, 100), -50.0);
}
