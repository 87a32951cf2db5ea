// crates/catalog-import/tests/pipeline.rs
// ============================================================================
// Module: Bulk Import Pipeline Tests
// Description: Submission, claims, batch modes, and lifecycle events.
// Purpose: Validate the asynchronous job pipeline end to end.
// ============================================================================

//! ## Overview
//! Drives the pipeline over the in-memory store: submission persists a
//! pending job and emits the job event, partial mode imports around bad
//! rows with header-offset error rows, all-or-nothing fails a colliding
//! batch wholesale, and claims have a single winner.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions are permitted."
)]

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use catalog_core::BulkImportJobEvent;
use catalog_core::ImportJobStatus;
use catalog_core::ImportMode;
use catalog_core::ImportProduct;
use catalog_core::JobId;
use catalog_core::Product;
use catalog_core::ProductId;
use catalog_core::Sku;
use catalog_core::Timestamp;
use catalog_core::interfaces::ProductStore;
use catalog_core::runtime::CapturePublisher;
use catalog_core::runtime::InMemoryProductStore;
use catalog_core::topics;
use catalog_import::ImportWorker;
use catalog_import::cancel_job;
use catalog_import::submit_upload;

/// Builds a worker over fresh in-memory capabilities.
fn fixture(
    batch_size: usize,
) -> (ImportWorker<InMemoryProductStore, CapturePublisher>, Arc<InMemoryProductStore>, Arc<CapturePublisher>)
{
    let store = Arc::new(InMemoryProductStore::new());
    let publisher = Arc::new(CapturePublisher::new());
    let counter = AtomicU64::new(0);
    let ids = Arc::new(move || {
        let seq = counter.fetch_add(1, Ordering::Relaxed);
        ProductId::new(format!("imp-{seq}"))
    });
    let worker = ImportWorker::new(Arc::clone(&store), Arc::clone(&publisher), ids, batch_size);
    (worker, store, publisher)
}

/// Builds a validated import row.
fn row(sku: &str, name: &str, price: f64) -> ImportProduct {
    ImportProduct {
        sku: Sku::new(sku),
        name: name.to_string(),
        price,
        ..ImportProduct::default()
    }
}

/// Submits an upload and returns the queued job event.
async fn submitted_job(
    store: &Arc<InMemoryProductStore>,
    publisher: &Arc<CapturePublisher>,
    rows: Vec<ImportProduct>,
    mode: ImportMode,
) -> BulkImportJobEvent {
    let job_id = JobId::new("job-1");
    let total = u32::try_from(rows.len()).expect("row count");
    let mut csv = String::from("SKU*,Product Name*,Price*\n");
    for row in &rows {
        csv.push_str(&format!("{},{},{}\n", row.sku, row.name, row.price));
    }
    let receipt = submit_upload(store, publisher, job_id, "upload.csv", csv.as_bytes(), mode)
        .await
        .expect("submission");
    assert_eq!(receipt.accepted_rows, total);
    let event = publisher
        .events_for(topics::BULK_IMPORT_JOB_CREATED)
        .pop()
        .expect("job event emitted");
    serde_json::from_value(event.data).expect("job event payload")
}

#[tokio::test]
async fn partial_mode_imports_around_a_duplicate_sku_row() {
    let (worker, store, publisher) = fixture(100);
    let existing = {
        let mut product = Product::new(ProductId::new("p-0"), "Held", 5.0, Timestamp::now());
        product.sku = Some(Sku::new("DUP-1"));
        product
    };
    store.create_product(&existing).await.expect("seed product");

    let rows =
        vec![row("NEW-1", "First", 10.0), row("DUP-1", "Second", 11.0), row("NEW-3", "Third", 12.0)];
    let event = submitted_job(&store, &publisher, rows, ImportMode::Partial).await;
    worker.process_job(event).await.expect("process job");

    let job = store
        .get_import_job(&JobId::new("job-1"))
        .await
        .expect("get job")
        .expect("job exists");
    assert_eq!(job.status, ImportJobStatus::Completed);
    assert_eq!(job.success_count, 2);
    assert_eq!(job.error_count, 1);
    assert_eq!(job.processed_rows, 3);
    assert!(job.completed_at.is_some());

    let error = job.errors.first().expect("error recorded");
    assert_eq!(error.row_number, 3);
    assert_eq!(error.field_name.as_deref(), Some("sku"));
    assert_eq!(error.sku, Some(Sku::new("DUP-1")));

    assert_eq!(publisher.events_for(topics::PRODUCT_CREATED).len(), 2);
    assert_eq!(publisher.events_for(topics::BULK_IMPORT_COMPLETED).len(), 1);
    assert!(!publisher.events_for(topics::BULK_IMPORT_PROGRESS).is_empty());
}

#[tokio::test]
async fn all_or_nothing_fails_a_colliding_batch_wholesale() {
    let (worker, store, publisher) = fixture(100);
    let existing = {
        let mut product = Product::new(ProductId::new("p-0"), "Held", 5.0, Timestamp::now());
        product.sku = Some(Sku::new("DUP-1"));
        product
    };
    store.create_product(&existing).await.expect("seed product");

    let rows = vec![row("NEW-1", "First", 10.0), row("DUP-1", "Second", 11.0)];
    let event = submitted_job(&store, &publisher, rows, ImportMode::AllOrNothing).await;
    worker.process_job(event).await.expect("process job");

    let job = store
        .get_import_job(&JobId::new("job-1"))
        .await
        .expect("get job")
        .expect("job exists");
    assert_eq!(job.status, ImportJobStatus::Completed);
    assert_eq!(job.success_count, 0);
    assert_eq!(job.error_count, 2);
    assert!(publisher.events_for(topics::PRODUCT_CREATED).is_empty());
    assert!(store.find_by_sku(&Sku::new("NEW-1"), true).await.expect("find").is_none());
}

#[tokio::test]
async fn all_or_nothing_inserts_a_clean_batch_atomically() {
    let (worker, store, publisher) = fixture(100);
    let rows = vec![row("NEW-1", "First", 10.0), row("NEW-2", "Second", 11.0)];
    let event = submitted_job(&store, &publisher, rows, ImportMode::AllOrNothing).await;
    worker.process_job(event).await.expect("process job");

    let job = store
        .get_import_job(&JobId::new("job-1"))
        .await
        .expect("get job")
        .expect("job exists");
    assert_eq!(job.success_count, 2);
    assert_eq!(job.error_count, 0);
    assert_eq!(publisher.events_for(topics::PRODUCT_CREATED).len(), 2);
    assert!(store.find_by_sku(&Sku::new("NEW-2"), true).await.expect("find").is_some());
}

#[tokio::test]
async fn progress_is_reported_after_every_batch() {
    let (worker, store, publisher) = fixture(1);
    let rows = vec![row("NEW-1", "First", 10.0), row("NEW-2", "Second", 11.0)];
    let event = submitted_job(&store, &publisher, rows, ImportMode::Partial).await;
    worker.process_job(event).await.expect("process job");

    let progress = publisher.events_for(topics::BULK_IMPORT_PROGRESS);
    assert_eq!(progress.len(), 2);
    assert_eq!(progress[0].data["processedRows"], serde_json::json!(1));
    assert_eq!(progress[1].data["processedRows"], serde_json::json!(2));
    assert_eq!(progress[1].data["totalRows"], serde_json::json!(2));
}

#[tokio::test]
async fn a_lost_claim_skips_the_job() {
    let (worker, store, publisher) = fixture(100);
    let rows = vec![row("NEW-1", "First", 10.0)];
    let event = submitted_job(&store, &publisher, rows, ImportMode::Partial).await;

    // Another worker wins the claim first.
    assert!(store.claim_import_job(&event.job_id).await.expect("claim"));
    worker.process_job(event).await.expect("process job");

    let job = store
        .get_import_job(&JobId::new("job-1"))
        .await
        .expect("get job")
        .expect("job exists");
    assert_eq!(job.status, ImportJobStatus::Processing);
    assert!(publisher.events_for(topics::PRODUCT_CREATED).is_empty());
}

#[tokio::test]
async fn a_cancelled_job_is_never_claimed() {
    let (worker, store, publisher) = fixture(100);
    let rows = vec![row("NEW-1", "First", 10.0)];
    let event = submitted_job(&store, &publisher, rows, ImportMode::Partial).await;

    cancel_job(&store, &event.job_id).await.expect("cancel");
    worker.process_job(event).await.expect("process job");

    let job = store
        .get_import_job(&JobId::new("job-1"))
        .await
        .expect("get job")
        .expect("job exists");
    assert_eq!(job.status, ImportJobStatus::Cancelled);
    assert!(publisher.events_for(topics::PRODUCT_CREATED).is_empty());
    assert!(publisher.events_for(topics::BULK_IMPORT_COMPLETED).is_empty());
}

#[tokio::test]
async fn submissions_with_no_valid_rows_fail_validation() {
    let store = Arc::new(InMemoryProductStore::new());
    let publisher = Arc::new(CapturePublisher::new());
    let err = submit_upload(
        &store,
        &publisher,
        JobId::new("job-x"),
        "empty.csv",
        b"SKU*,Product Name*,Price*\n,,\n",
        ImportMode::Partial,
    )
    .await
    .expect_err("no valid rows");
    assert_eq!(err.http_status(), 400);
}

#[tokio::test]
async fn cancelling_a_finished_job_is_rejected() {
    let (worker, store, publisher) = fixture(100);
    let rows = vec![row("NEW-1", "First", 10.0)];
    let event = submitted_job(&store, &publisher, rows, ImportMode::Partial).await;
    let job_id = event.job_id.clone();
    worker.process_job(event).await.expect("process job");

    let err = cancel_job(&store, &job_id).await.expect_err("terminal job");
    assert_eq!(err.http_status(), 400);
}
