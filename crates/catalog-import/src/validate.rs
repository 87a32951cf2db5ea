// crates/catalog-import/src/validate.rs
// ============================================================================
// Module: Import Validation
// Description: Row parsing and per-cell validation for bulk uploads.
// Purpose: Turn an uploaded table into validated rows plus structured errors.
// Dependencies: catalog-core, crate::template, csv
// ============================================================================

//! ## Overview
//! Validation reads the uploaded table row by row, classifying each cell as
//! ok, missing-required, or invalid, and emits one structured error per
//! offense. Rows with any error are dropped from the valid set; the rest
//! become [`ImportProduct`] values ready for the worker. Row numbers are
//! 1-based and include the header row, so the first data row is row 2.

// ============================================================================
// SECTION: Imports
// ============================================================================

use catalog_core::ImportProduct;
use catalog_core::ImportValidationError;
use catalog_core::Sku;

use crate::template::LIST_COLUMNS;
use crate::template::TEMPLATE_COLUMNS;

// ============================================================================
// SECTION: Validation Outcome
// ============================================================================

/// Result of validating one upload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationOutcome {
    /// Rows that passed validation, in upload order.
    pub products: Vec<ImportProduct>,
    /// Structured errors for rejected cells.
    pub errors: Vec<ImportValidationError>,
}

// ============================================================================
// SECTION: Row Validation
// ============================================================================

/// Parses and validates an uploaded CSV document.
///
/// Headers are matched against the template headers, falling back to bare
/// field names case-insensitively so hand-written uploads work too. Empty
/// rows are skipped without error.
#[must_use]
pub fn validate_upload(content: &[u8]) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(content);
    let headers: Vec<String> = match reader.headers() {
        Ok(headers) => headers.iter().map(|header| header.trim().to_string()).collect(),
        Err(err) => {
            outcome.errors.push(ImportValidationError {
                row_number: 1,
                field_name: "header".to_string(),
                description: format!("unreadable header row: {err}"),
                suggestion: "Download a fresh template and keep the header row".to_string(),
                current_value: String::new(),
            });
            return outcome;
        }
    };

    for (index, record) in reader.records().enumerate() {
        let row_number = row_number_for(index);
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                outcome.errors.push(ImportValidationError {
                    row_number,
                    field_name: "row".to_string(),
                    description: format!("unreadable row: {err}"),
                    suggestion: "Remove stray quotes or delimiters from the row".to_string(),
                    current_value: String::new(),
                });
                continue;
            }
        };
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        match validate_row(&headers, &record, row_number) {
            Ok(product) => outcome.products.push(product),
            Err(mut errors) => outcome.errors.append(&mut errors),
        }
    }
    outcome
}

/// Returns the 1-based row number for a data record index (header offset).
#[must_use]
pub fn row_number_for(record_index: usize) -> u32 {
    u32::try_from(record_index).unwrap_or(u32::MAX).saturating_add(2)
}

/// Validates one data row against the template schema.
fn validate_row(
    headers: &[String],
    record: &csv::StringRecord,
    row_number: u32,
) -> Result<ImportProduct, Vec<ImportValidationError>> {
    let mut errors = Vec::new();
    let mut product = ImportProduct::default();

    for column in &TEMPLATE_COLUMNS {
        let value = headers
            .iter()
            .position(|header| {
                header.eq_ignore_ascii_case(column.header)
                    || header.eq_ignore_ascii_case(column.field)
            })
            .and_then(|position| record.get(position))
            .map(str::trim)
            .unwrap_or_default();

        if column.required && value.is_empty() {
            errors.push(ImportValidationError {
                row_number,
                field_name: column.field.to_string(),
                description: format!("{} is required", column.header),
                suggestion: format!("Provide a value for {}", column.header),
                current_value: "empty".to_string(),
            });
            continue;
        }
        if value.is_empty() {
            continue;
        }

        match column.field {
            "sku" => product.sku = Sku::new(value),
            "name" => product.name = value.to_string(),
            "price" => match value.parse::<f64>() {
                Ok(price) if price >= 0.0 && price.is_finite() => product.price = price,
                Ok(_) => errors.push(ImportValidationError {
                    row_number,
                    field_name: column.field.to_string(),
                    description: "Price must be non-negative".to_string(),
                    suggestion: "Provide a price >= 0".to_string(),
                    current_value: value.to_string(),
                }),
                Err(_) => errors.push(ImportValidationError {
                    row_number,
                    field_name: column.field.to_string(),
                    description: "Price must be a valid number".to_string(),
                    suggestion: "Provide a numeric value".to_string(),
                    current_value: value.to_string(),
                }),
            },
            "description" => product.description = Some(value.to_string()),
            "brand" => product.brand = Some(value.to_string()),
            "department" => product.department = Some(value.to_string()),
            "category" => product.category = Some(value.to_string()),
            "subcategory" => product.subcategory = Some(value.to_string()),
            field if LIST_COLUMNS.contains(&field) => {
                let items = split_list(value);
                match field {
                    "tags" => product.tags = items,
                    "images" => product.images = items,
                    "colors" => product.colors = items,
                    _ => product.sizes = items,
                }
            }
            _ => {}
        }
    }

    if errors.is_empty() { Ok(product) } else { Err(errors) }
}

/// Splits a comma-separated cell into trimmed, non-empty items.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}
