// crates/catalog-import/src/submit.rs
// ============================================================================
// Module: Import Submission
// Description: Upload validation, job creation, and job-created event emission.
// Purpose: Turn an uploaded table into a pending job the worker can claim.
// Dependencies: catalog-core, crate::validate, serde_json, tracing
// ============================================================================

//! ## Overview
//! Submission is the synchronous half of the pipeline: validate the upload,
//! persist a `pending` job for the valid rows, and emit the job-created
//! event that wakes a worker. Validation errors are returned to the caller
//! alongside the job id; a job is created even when some rows failed, and
//! only when no row is valid does submission fail outright.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use catalog_core::BulkImportJobEvent;
use catalog_core::CatalogError;
use catalog_core::ImportJob;
use catalog_core::ImportMode;
use catalog_core::ImportValidationError;
use catalog_core::JobId;
use catalog_core::Timestamp;
use catalog_core::interfaces::EventPublisher;
use catalog_core::interfaces::ProductStore;
use catalog_core::interfaces::PublishOptions;
use catalog_core::topics;
use tracing::info;
use tracing::warn;

use crate::validate::validate_upload;

// ============================================================================
// SECTION: Submission
// ============================================================================

/// Receipt returned to the uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Created job identifier.
    pub job_id: JobId,
    /// Rows accepted for import.
    pub accepted_rows: u32,
    /// Structured validation errors for rejected rows.
    pub validation_errors: Vec<ImportValidationError>,
}

/// Validates an upload, persists a pending job, and emits the job event.
///
/// # Errors
///
/// Returns [`CatalogError::Validation`] when no row passes validation and
/// [`CatalogError::StoreUnavailable`] on transient store failures.
pub async fn submit_upload<S, P>(
    store: &Arc<S>,
    publisher: &Arc<P>,
    job_id: JobId,
    filename: &str,
    content: &[u8],
    import_mode: ImportMode,
) -> Result<SubmissionReceipt, CatalogError>
where
    S: ProductStore,
    P: EventPublisher,
{
    let outcome = validate_upload(content);
    if outcome.products.is_empty() {
        return Err(CatalogError::Validation(format!(
            "upload '{filename}' contains no valid rows ({} errors)",
            outcome.errors.len()
        )));
    }

    let total_rows = u32::try_from(outcome.products.len()).unwrap_or(u32::MAX);
    let job = ImportJob::new(job_id.clone(), filename, total_rows, import_mode, Timestamp::now());
    store.create_import_job(&job).await?;

    let event = BulkImportJobEvent {
        job_id: job_id.clone(),
        products: outcome.products,
        import_mode,
    };
    let payload =
        serde_json::to_value(&event).map_err(|err| CatalogError::Internal(err.to_string()))?;
    if let Err(err) = publisher
        .publish(topics::BULK_IMPORT_JOB_CREATED, payload, PublishOptions::default())
        .await
    {
        warn!(job_id = %job_id, error = %err, "job-created event publish failed");
    }
    info!(
        job_id = %job_id,
        accepted = total_rows,
        rejected = outcome.errors.len(),
        "bulk import job submitted"
    );
    Ok(SubmissionReceipt {
        job_id,
        accepted_rows: total_rows,
        validation_errors: outcome.errors,
    })
}

/// Cancels a job that is still pending or processing.
///
/// The worker observes the transition between batches; rows already
/// inserted stay inserted.
///
/// # Errors
///
/// Returns [`CatalogError::NotFound`] for an unknown job and
/// [`CatalogError::Validation`] for a job already in a terminal status.
pub async fn cancel_job<S>(store: &Arc<S>, job_id: &JobId) -> Result<(), CatalogError>
where
    S: ProductStore,
{
    let Some(mut job) = store.get_import_job(job_id).await? else {
        return Err(CatalogError::NotFound(format!("import job {job_id} not found")));
    };
    if job.status.is_terminal() {
        return Err(CatalogError::Validation(format!(
            "import job {job_id} is already finished"
        )));
    }
    job.status = catalog_core::ImportJobStatus::Cancelled;
    job.completed_at = Some(Timestamp::now());
    store.update_import_job(&job).await?;
    info!(job_id = %job_id, "bulk import job cancelled");
    Ok(())
}
