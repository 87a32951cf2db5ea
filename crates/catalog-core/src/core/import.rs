// crates/catalog-core/src/core/import.rs
// ============================================================================
// Module: Product Catalog Import Model
// Description: Bulk import jobs, modes, validated rows, and row errors.
// Purpose: Define the persisted job record and the shapes moving through the pipeline.
// Dependencies: crate::core::{identifiers, product, time}, serde
// ============================================================================

//! ## Overview
//! A bulk import job tracks the asynchronous processing of a validated
//! spreadsheet upload. Jobs advance `pending -> processing -> (completed |
//! failed | cancelled)` and are never re-opened; terminal records are
//! immutable except for observational reads.
//! Invariants:
//! - `processed_rows <= total_rows`; `success_count + error_count <= processed_rows`.
//! - The accumulated error report is capped at [`MAX_JOB_ERRORS`] entries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ActorId;
use crate::core::identifiers::JobId;
use crate::core::identifiers::ProductId;
use crate::core::identifiers::Sku;
use crate::core::product::Product;
use crate::core::product::VariationKind;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum error-report entries retained on a job record.
pub const MAX_JOB_ERRORS: usize = 1_000;

// ============================================================================
// SECTION: Import Modes and Status
// ============================================================================

/// Batch execution mode for an import job.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ImportMode {
    /// Each row is inserted independently; a bad row does not abort the batch.
    #[default]
    Partial,
    /// The batch fails wholesale on any SKU collision.
    AllOrNothing,
}

/// Lifecycle status of an import job.
///
/// # Invariants
/// - Terminal statuses (`Completed`, `Failed`, `Cancelled`) are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImportJobStatus {
    /// Job persisted, awaiting a worker claim.
    #[default]
    Pending,
    /// Job claimed by a worker and being processed.
    Processing,
    /// All input rows were processed (even if every row errored).
    Completed,
    /// A fatal pipeline error aborted the job.
    Failed,
    /// An admin cancelled the job; observed between batches.
    Cancelled,
}

impl ImportJobStatus {
    /// Returns true for statuses that end the job lifecycle.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

// ============================================================================
// SECTION: Row Errors
// ============================================================================

/// Structured validation error for one cell of the upload.
///
/// # Invariants
/// - `row_number` is 1-based and includes the header offset (first data row
///   is row 2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportValidationError {
    /// Row the error was found on.
    pub row_number: u32,
    /// Field the error refers to.
    pub field_name: String,
    /// Human-readable description of the problem.
    pub description: String,
    /// Suggested correction for the uploader.
    pub suggestion: String,
    /// The offending cell value as uploaded.
    pub current_value: String,
}

/// Execution-stage error accumulated on the job record.
///
/// # Invariants
/// - `row_number` is 1-based and includes the header offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRowError {
    /// Row the error was raised for.
    pub row_number: u32,
    /// Field the error refers to, when attributable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    /// Error message.
    pub message: String,
    /// SKU of the offending row, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
}

// ============================================================================
// SECTION: Import Job Record
// ============================================================================

/// Persisted bulk import job record.
///
/// # Invariants
/// - Counters are monotonic while the job is in `Processing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJob {
    /// Job identifier.
    pub job_id: JobId,
    /// Original upload filename.
    pub filename: String,
    /// Lifecycle status.
    pub status: ImportJobStatus,
    /// Total rows accepted by validation.
    pub total_rows: u32,
    /// Rows processed so far.
    pub processed_rows: u32,
    /// Rows inserted successfully.
    pub success_count: u32,
    /// Rows that failed during execution.
    pub error_count: u32,
    /// Batch execution mode.
    pub import_mode: ImportMode,
    /// Instant the job was created.
    pub started_at: Timestamp,
    /// Instant the job reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    /// Accumulated execution errors, capped at [`MAX_JOB_ERRORS`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ImportRowError>,
    /// Actor that submitted the upload, when authenticated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<ActorId>,
}

impl ImportJob {
    /// Creates a pending job for a validated upload.
    #[must_use]
    pub fn new(
        job_id: JobId,
        filename: impl Into<String>,
        total_rows: u32,
        import_mode: ImportMode,
        started_at: Timestamp,
    ) -> Self {
        Self {
            job_id,
            filename: filename.into(),
            status: ImportJobStatus::Pending,
            total_rows,
            processed_rows: 0,
            success_count: 0,
            error_count: 0,
            import_mode,
            started_at,
            completed_at: None,
            errors: Vec::new(),
            created_by: None,
        }
    }

    /// Appends an execution error, dropping it once the report cap is hit.
    pub fn push_error(&mut self, error: ImportRowError) {
        if self.errors.len() < MAX_JOB_ERRORS {
            self.errors.push(error);
        }
    }
}

// ============================================================================
// SECTION: Validated Rows
// ============================================================================

/// One validated product row from an upload.
///
/// List-valued columns are already split; `colors` and `sizes` land in the
/// product specification map when materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportProduct {
    /// Row SKU.
    pub sku: Sku,
    /// Display name.
    pub name: String,
    /// Price in the platform currency.
    pub price: f64,
    /// Long-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Brand name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Top-level taxonomy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Second-level taxonomy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Third-level taxonomy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Image URLs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Available colors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
    /// Available sizes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<String>,
}

impl Default for ImportProduct {
    fn default() -> Self {
        Self {
            sku: Sku::new(""),
            name: String::new(),
            price: 0.0,
            description: None,
            brand: None,
            department: None,
            category: None,
            subcategory: None,
            tags: Vec::new(),
            images: Vec::new(),
            colors: Vec::new(),
            sizes: Vec::new(),
        }
    }
}

impl ImportProduct {
    /// Materializes the row into an active standalone product document.
    #[must_use]
    pub fn into_product(self, id: ProductId, now: Timestamp) -> Product {
        let mut product = Product::new(id, self.name, self.price, now);
        product.sku = Some(self.sku);
        product.variation_type = VariationKind::Standalone;
        product.description = self.description;
        product.brand = self.brand;
        product.department = self.department;
        product.category = self.category;
        product.subcategory = self.subcategory;
        product.images = self.images;
        product.tags = self.tags;
        if !self.colors.is_empty() {
            product.specifications.insert("colors".to_string(), self.colors.join(", "));
        }
        if !self.sizes.is_empty() {
            product.specifications.insert("sizes".to_string(), self.sizes.join(", "));
        }
        product.created_by = Some(ActorId::new("bulk_import"));
        product.updated_by = Some(ActorId::new("bulk_import"));
        product
    }
}

// ============================================================================
// SECTION: Job Event Payload
// ============================================================================

/// Payload of `product.bulk.import.job.created` events.
///
/// # Invariants
/// - `products` contains only rows that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkImportJobEvent {
    /// Job identifier.
    pub job_id: JobId,
    /// Validated rows to import.
    pub products: Vec<ImportProduct>,
    /// Batch execution mode.
    #[serde(default)]
    pub import_mode: ImportMode,
}
