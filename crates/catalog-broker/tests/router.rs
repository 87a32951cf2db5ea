// crates/catalog-broker/tests/router.rs
// ============================================================================
// Module: Event Router Tests
// Description: Subscription discovery, dispatch outcomes, and deduplication.
// Purpose: Validate ack/retry/drop classification against real handlers.
// ============================================================================

//! ## Overview
//! Drives the router with real envelopes over the in-memory store:
//! successful projections ack, duplicate envelope ids are acked without
//! double-applying, malformed payloads and unknown topics drop to the
//! dead-letter log, and bulk import jobs are queued for the worker.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions are permitted."
)]

use std::sync::Arc;

use catalog_broker::EventRouter;
use catalog_broker::RouterOutcome;
use catalog_core::BulkImportJobEvent;
use catalog_core::EventEnvelope;
use catalog_core::EventId;
use catalog_core::ImportMode;
use catalog_core::Product;
use catalog_core::ProductId;
use catalog_core::Timestamp;
use catalog_core::interfaces::ProductStore;
use catalog_core::runtime::BadgeEngine;
use catalog_core::runtime::CapturePublisher;
use catalog_core::runtime::InMemoryProductStore;
use catalog_core::runtime::ProjectionEngine;
use catalog_core::topics;
use serde_json::Value;
use serde_json::json;
use tokio::sync::mpsc;

/// Builds a router over the in-memory store with one product.
async fn fixture() -> (
    EventRouter<InMemoryProductStore, CapturePublisher>,
    Arc<InMemoryProductStore>,
    mpsc::UnboundedReceiver<BulkImportJobEvent>,
    ProductId,
) {
    let store = Arc::new(InMemoryProductStore::new());
    let publisher = Arc::new(CapturePublisher::new());
    let product = Product::new(ProductId::new("p-1"), "Widget", 10.0, Timestamp::now());
    let id = store.create_product(&product).await.expect("create product");
    let badges = BadgeEngine::with_default_rules(Arc::clone(&store), Arc::clone(&publisher));
    let projections = ProjectionEngine::new(Arc::clone(&store), publisher, badges);
    let (jobs, job_queue) = mpsc::unbounded_channel();
    let router = EventRouter::new(projections, jobs, "aioutlet-pubsub");
    (router, store, job_queue, id)
}

/// Builds an inbound envelope with the given id and payload.
fn envelope(topic: &str, id: &str, data: Value) -> EventEnvelope {
    EventEnvelope::for_topic(topic, EventId::new(id), Timestamp::now(), data, None, None)
}

#[tokio::test]
async fn the_subscription_table_covers_every_inbound_topic() {
    let (router, _store, _jobs, _id) = fixture().await;
    let subscriptions = router.subscriptions();
    assert_eq!(subscriptions.len(), 10);
    assert!(subscriptions.iter().all(|entry| entry.pubsub_name == "aioutlet-pubsub"));
    assert!(
        subscriptions
            .iter()
            .any(|entry| entry.topic == topics::REVIEW_CREATED
                && entry.route == "/events/review-created")
    );
}

#[tokio::test]
async fn a_successful_projection_acks_the_delivery() {
    let (router, store, _jobs, id) = fixture().await;
    let delivery = envelope(
        topics::REVIEW_CREATED,
        "evt-1",
        json!({ "productId": id.as_str(), "rating": 5, "verifiedPurchase": true }),
    );
    let outcome = router.dispatch(topics::REVIEW_CREATED, &delivery).await;
    assert_eq!(outcome, RouterOutcome::Success);

    let product = store.get_product(&id).await.expect("get").expect("exists");
    assert_eq!(product.review_aggregates.total_reviews, 1);
}

#[tokio::test]
async fn duplicate_envelope_ids_are_acked_without_reapplying() {
    let (router, store, _jobs, id) = fixture().await;
    let delivery = envelope(
        topics::REVIEW_CREATED,
        "evt-dup",
        json!({ "productId": id.as_str(), "rating": 4 }),
    );
    assert_eq!(router.dispatch(topics::REVIEW_CREATED, &delivery).await, RouterOutcome::Success);
    assert_eq!(router.dispatch(topics::REVIEW_CREATED, &delivery).await, RouterOutcome::Success);

    let product = store.get_product(&id).await.expect("get").expect("exists");
    assert_eq!(product.review_aggregates.total_reviews, 1);
}

#[tokio::test]
async fn malformed_payloads_drop_to_the_dead_letter_log() {
    let (router, _store, _jobs, _id) = fixture().await;
    let delivery = envelope(topics::REVIEW_CREATED, "evt-bad", json!({ "rating": 5 }));
    let outcome = router.dispatch(topics::REVIEW_CREATED, &delivery).await;
    assert_eq!(outcome, RouterOutcome::Drop);

    let letters = router.dead_letters();
    assert_eq!(letters.len(), 1);
    assert_eq!(letters[0].topic, topics::REVIEW_CREATED);
    assert_eq!(letters[0].event_id, EventId::new("evt-bad"));
}

#[tokio::test]
async fn out_of_range_ratings_are_dropped_not_retried() {
    let (router, _store, _jobs, id) = fixture().await;
    let delivery = envelope(
        topics::REVIEW_CREATED,
        "evt-range",
        json!({ "productId": id.as_str(), "rating": 9 }),
    );
    assert_eq!(router.dispatch(topics::REVIEW_CREATED, &delivery).await, RouterOutcome::Drop);
}

#[tokio::test]
async fn unknown_topics_are_dropped_with_a_dead_letter() {
    let (router, _store, _jobs, _id) = fixture().await;
    let delivery = envelope("order.created", "evt-odd", json!({}));
    assert_eq!(router.dispatch("order.created", &delivery).await, RouterOutcome::Drop);
    assert_eq!(router.dead_letters().len(), 1);
}

#[tokio::test]
async fn missing_target_products_still_ack() {
    let (router, _store, _jobs, _id) = fixture().await;
    let delivery = envelope(
        topics::REVIEW_CREATED,
        "evt-ghost",
        json!({ "productId": "ghost", "rating": 3 }),
    );
    assert_eq!(router.dispatch(topics::REVIEW_CREATED, &delivery).await, RouterOutcome::Success);
    assert!(router.dead_letters().is_empty());
}

#[tokio::test]
async fn bulk_import_jobs_are_handed_to_the_worker_queue() {
    let (router, _store, mut jobs, _id) = fixture().await;
    let delivery = envelope(
        topics::BULK_IMPORT_JOB_CREATED,
        "evt-job",
        json!({
            "jobId": "job-1",
            "importMode": "partial",
            "products": [
                { "sku": "SKU-1", "name": "Widget", "price": 9.99 }
            ],
        }),
    );
    assert_eq!(
        router.dispatch(topics::BULK_IMPORT_JOB_CREATED, &delivery).await,
        RouterOutcome::Success
    );

    let queued = jobs.try_recv().expect("job queued");
    assert_eq!(queued.job_id.as_str(), "job-1");
    assert_eq!(queued.import_mode, ImportMode::Partial);
    assert_eq!(queued.products.len(), 1);
}

#[tokio::test]
async fn a_closed_worker_queue_requests_redelivery() {
    let (router, _store, jobs, _id) = fixture().await;
    drop(jobs);
    let delivery = envelope(
        topics::BULK_IMPORT_JOB_CREATED,
        "evt-job-2",
        json!({ "jobId": "job-2", "importMode": "partial", "products": [] }),
    );
    assert_eq!(
        router.dispatch(topics::BULK_IMPORT_JOB_CREATED, &delivery).await,
        RouterOutcome::Retry
    );
}
