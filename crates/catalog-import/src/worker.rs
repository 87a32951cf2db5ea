// crates/catalog-import/src/worker.rs
// ============================================================================
// Module: Bulk Import Worker
// Description: Asynchronous batch processing of validated import jobs.
// Purpose: Claim jobs, execute batches, and report progress and completion.
// Dependencies: catalog-core, serde_json, tokio, tracing
// ============================================================================

//! ## Overview
//! The worker consumes `product.bulk.import.job.created` events from its
//! queue, claims each job through the store's atomic `pending -> processing`
//! transition (a lost claim means another worker owns the job), and
//! processes rows in fixed-size batches. Partial mode inserts rows
//! independently; all-or-nothing mode fails a batch wholesale on any SKU
//! collision. Progress is persisted and published after every batch and
//! cancellation is observed between batches, not within.
//! Invariants:
//! - A job reaches `completed` even when every row errored.
//! - Exactly one `product.created` event per inserted row.
//! - Terminal jobs are never re-opened.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use catalog_core::BulkImportJobEvent;
use catalog_core::CatalogError;
use catalog_core::ImportJob;
use catalog_core::ImportJobStatus;
use catalog_core::ImportMode;
use catalog_core::ImportProduct;
use catalog_core::ImportRowError;
use catalog_core::Product;
use catalog_core::ProductId;
use catalog_core::StoreError;
use catalog_core::Timestamp;
use catalog_core::interfaces::EventPublisher;
use catalog_core::interfaces::ProductStore;
use catalog_core::interfaces::PublishOptions;
use catalog_core::topics;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::error;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Batch Results
// ============================================================================

/// Outcome of one executed batch.
#[derive(Debug, Default)]
struct BatchResult {
    /// Rows inserted.
    success: u32,
    /// Rows failed.
    failed: u32,
    /// Structured row errors.
    errors: Vec<ImportRowError>,
}

// ============================================================================
// SECTION: Import Worker
// ============================================================================

/// Processes bulk import jobs one at a time.
pub struct ImportWorker<S, P> {
    /// Product store for inserts and job records.
    store: Arc<S>,
    /// Publisher for progress and lifecycle events.
    publisher: Arc<P>,
    /// Identifier factory for inserted products.
    ids: Arc<dyn Fn() -> ProductId + Send + Sync>,
    /// Rows per batch.
    batch_size: usize,
}

impl<S, P> ImportWorker<S, P>
where
    S: ProductStore,
    P: EventPublisher,
{
    /// Creates a worker with the given batch size.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        publisher: Arc<P>,
        ids: Arc<dyn Fn() -> ProductId + Send + Sync>,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            publisher,
            ids,
            batch_size: batch_size.max(1),
        }
    }

    /// Drains the job queue until it closes, processing jobs sequentially.
    pub async fn run(&self, mut jobs: mpsc::UnboundedReceiver<BulkImportJobEvent>) {
        while let Some(event) = jobs.recv().await {
            if let Err(err) = self.process_job(event).await {
                error!(error = %err, "bulk import job processing failed");
            }
        }
    }

    /// Processes one job event end to end.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StoreUnavailable`] when the job record cannot
    /// be read or written; batch-level failures are absorbed into the job's
    /// error report instead.
    pub async fn process_job(&self, event: BulkImportJobEvent) -> Result<(), CatalogError> {
        if !self.store.claim_import_job(&event.job_id).await? {
            info!(job_id = %event.job_id, "job already claimed or not pending; skipping");
            return Ok(());
        }
        let Some(mut job) = self.store.get_import_job(&event.job_id).await? else {
            warn!(job_id = %event.job_id, "claimed job record disappeared");
            return Ok(());
        };
        info!(
            job_id = %job.job_id,
            total = event.products.len(),
            mode = ?event.import_mode,
            "bulk import processing started"
        );

        let total_rows = event.products.len();
        for (batch_index, batch) in event.products.chunks(self.batch_size).enumerate() {
            let batch_offset = batch_index * self.batch_size;
            if self.cancelled(&job).await? {
                info!(job_id = %job.job_id, "job cancelled; stopping between batches");
                return Ok(());
            }
            let result = match event.import_mode {
                ImportMode::Partial => self.process_batch_partial(batch, batch_offset).await,
                ImportMode::AllOrNothing => {
                    self.process_batch_all_or_nothing(batch, batch_offset).await
                }
            };
            let result = match result {
                Ok(result) => result,
                Err(err) => {
                    self.fail_job(&mut job, &err.to_string()).await?;
                    return Ok(());
                }
            };

            job.processed_rows = clamp_u32(batch_offset + batch.len());
            job.success_count += result.success;
            job.error_count += result.failed;
            for row_error in result.errors {
                job.push_error(row_error);
            }
            job.status = ImportJobStatus::Processing;
            self.store.update_import_job(&job).await?;
            self.publish_progress(&job, clamp_u32(total_rows)).await;
        }

        job.status = ImportJobStatus::Completed;
        job.processed_rows = clamp_u32(total_rows);
        job.completed_at = Some(Timestamp::now());
        self.store.update_import_job(&job).await?;
        self.publish_completed(&job).await;
        info!(
            job_id = %job.job_id,
            success = job.success_count,
            errors = job.error_count,
            "bulk import completed"
        );
        Ok(())
    }

    /// Inserts rows independently; one bad row never aborts the batch.
    async fn process_batch_partial(
        &self,
        batch: &[ImportProduct],
        batch_offset: usize,
    ) -> Result<BatchResult, CatalogError> {
        let mut result = BatchResult::default();
        for (index, row) in batch.iter().enumerate() {
            let row_number = row_number(batch_offset + index);
            if self.store.find_by_sku(&row.sku, true).await?.is_some() {
                result.failed += 1;
                result.errors.push(ImportRowError {
                    row_number,
                    field_name: Some("sku".to_string()),
                    message: format!("SKU '{}' already exists", row.sku),
                    sku: Some(row.sku.clone()),
                });
                continue;
            }
            let product = row.clone().into_product((self.ids)(), Timestamp::now());
            match self.store.create_product(&product).await {
                Ok(_) => {
                    result.success += 1;
                    self.publish_created(&product).await;
                }
                Err(StoreError::DuplicateSku {
                    sku,
                }) => {
                    result.failed += 1;
                    result.errors.push(ImportRowError {
                        row_number,
                        field_name: Some("sku".to_string()),
                        message: format!("SKU '{sku}' already exists"),
                        sku: Some(row.sku.clone()),
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(result)
    }

    /// Pre-checks the batch SKU set, then inserts the batch atomically.
    async fn process_batch_all_or_nothing(
        &self,
        batch: &[ImportProduct],
        batch_offset: usize,
    ) -> Result<BatchResult, CatalogError> {
        let mut result = BatchResult::default();
        let mut collisions = Vec::new();
        for (index, row) in batch.iter().enumerate() {
            if self.store.find_by_sku(&row.sku, true).await?.is_some() {
                collisions.push(ImportRowError {
                    row_number: row_number(batch_offset + index),
                    field_name: Some("sku".to_string()),
                    message: format!("SKU '{}' already exists", row.sku),
                    sku: Some(row.sku.clone()),
                });
            }
        }
        if !collisions.is_empty() {
            result.failed = clamp_u32(batch.len());
            result.errors = collisions;
            return Ok(result);
        }
        let products: Vec<Product> = batch
            .iter()
            .map(|row| row.clone().into_product((self.ids)(), Timestamp::now()))
            .collect();
        match self.store.insert_many(&products).await {
            Ok(_) => {
                result.success = clamp_u32(products.len());
                for product in &products {
                    self.publish_created(product).await;
                }
                Ok(result)
            }
            Err(StoreError::DuplicateSku {
                sku,
            }) => {
                result.failed = clamp_u32(batch.len());
                result.errors.push(ImportRowError {
                    row_number: row_number(batch_offset),
                    field_name: Some("sku".to_string()),
                    message: format!("batch insert collided on SKU '{sku}'"),
                    sku: None,
                });
                Ok(result)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Returns true when an admin cancelled the job.
    async fn cancelled(&self, job: &ImportJob) -> Result<bool, CatalogError> {
        let current = self.store.get_import_job(&job.job_id).await?;
        Ok(current.is_some_and(|record| record.status == ImportJobStatus::Cancelled))
    }

    /// Marks the job failed and publishes the failure event.
    async fn fail_job(&self, job: &mut ImportJob, reason: &str) -> Result<(), CatalogError> {
        error!(job_id = %job.job_id, reason, "bulk import failed");
        job.status = ImportJobStatus::Failed;
        job.completed_at = Some(Timestamp::now());
        self.store.update_import_job(job).await?;
        let payload = json!({
            "jobId": job.job_id,
            "error": reason,
            "failedAt": job.completed_at,
        });
        if let Err(err) = self
            .publisher
            .publish(topics::BULK_IMPORT_FAILED, payload, PublishOptions::default())
            .await
        {
            warn!(job_id = %job.job_id, error = %err, "failure event publish failed");
        }
        Ok(())
    }

    /// Publishes one `product.created` event; failures are logged only.
    async fn publish_created(&self, product: &Product) {
        let payload = json!({
            "productId": product.id,
            "sku": product.sku,
            "name": product.name,
            "price": product.price,
            "source": "bulk_import",
        });
        if let Err(err) = self
            .publisher
            .publish(
                topics::PRODUCT_CREATED,
                payload,
                PublishOptions::for_product(&product.id, None),
            )
            .await
        {
            warn!(product_id = %product.id, error = %err, "product.created publish failed");
        }
    }

    /// Publishes batch progress; failures are logged only.
    async fn publish_progress(&self, job: &ImportJob, total_rows: u32) {
        let payload = json!({
            "jobId": job.job_id,
            "processedRows": job.processed_rows,
            "successCount": job.success_count,
            "errorCount": job.error_count,
            "totalRows": total_rows,
        });
        if let Err(err) = self
            .publisher
            .publish(topics::BULK_IMPORT_PROGRESS, payload, PublishOptions::default())
            .await
        {
            warn!(job_id = %job.job_id, error = %err, "progress event publish failed");
        }
    }

    /// Publishes job completion; failures are logged only.
    async fn publish_completed(&self, job: &ImportJob) {
        let payload = json!({
            "jobId": job.job_id,
            "totalRows": job.total_rows,
            "successCount": job.success_count,
            "errorCount": job.error_count,
            "completedAt": job.completed_at,
        });
        if let Err(err) = self
            .publisher
            .publish(topics::BULK_IMPORT_COMPLETED, payload, PublishOptions::default())
            .await
        {
            warn!(job_id = %job.job_id, error = %err, "completion event publish failed");
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the upload row number for a zero-based row index (header offset).
fn row_number(row_index: usize) -> u32 {
    clamp_u32(row_index).saturating_add(2)
}

/// Clamps a usize counter into the u32 wire range.
fn clamp_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
