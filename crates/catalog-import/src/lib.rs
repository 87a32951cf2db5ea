// crates/catalog-import/src/lib.rs
// ============================================================================
// Module: Product Catalog Import Library
// Description: Bulk import pipeline: template, validation, submission, worker.
// Purpose: Process spreadsheet uploads into batched product insertions.
// Dependencies: catalog-core, csv, tokio
// ============================================================================

//! ## Overview
//! The import crate turns tabular uploads into products. Submission
//! validates rows and persists a pending job; the worker claims jobs and
//! executes batches in partial or all-or-nothing mode, publishing progress
//! after every batch and a completion or failure event at the end.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod submit;
pub mod template;
pub mod validate;
pub mod worker;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use submit::SubmissionReceipt;
pub use submit::cancel_job;
pub use submit::submit_upload;
pub use template::ImportColumn;
pub use template::LIST_COLUMNS;
pub use template::TEMPLATE_COLUMNS;
pub use template::csv_template;
pub use template::template_instructions;
pub use validate::ValidationOutcome;
pub use validate::row_number_for;
pub use validate::validate_upload;
pub use worker::ImportWorker;
