// crates/catalog-core/src/runtime/fields.rs
// ============================================================================
// Module: Product Field Resolution
// Description: Dot-notation field lookup over product document projections.
// Purpose: Resolve rule field paths without runtime reflection.
// Dependencies: crate::core::product, serde_json
// ============================================================================

//! ## Overview
//! Badge rules reference product fields by dot-notation strings such as
//! `salesMetrics.last30Days.units`. Resolution is a plain member walk over
//! the document's JSON projection; a missing member at any step resolves to
//! nothing, which evaluates the referencing condition to false.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::Product;

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Projects a product into its wire-shaped JSON document.
///
/// The projection uses the same serde shape as persisted documents, so rule
/// paths written against stored JSON resolve identically here.
#[must_use]
pub fn product_document(product: &Product) -> Value {
    serde_json::to_value(product).unwrap_or(Value::Null)
}

/// Resolves a dot-notation path against a JSON document.
///
/// Returns `None` when any step of the path is missing or the current value
/// is not an object. Array indexing is intentionally unsupported; rule paths
/// address named members only.
#[must_use]
pub fn resolve_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = document;
    for part in path.split('.') {
        if part.is_empty() {
            return None;
        }
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}
