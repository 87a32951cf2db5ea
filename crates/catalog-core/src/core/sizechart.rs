// crates/catalog-core/src/core/sizechart.rs
// ============================================================================
// Module: Product Catalog Size Charts
// Description: Size chart documents referenced by products.
// Purpose: Define the persisted size chart shape for assignment operations.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! Size charts are small measurement tables shared across products within a
//! department. Products reference a chart by identifier; assignment and
//! unassignment emit domain events but never mutate the chart itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ChartId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Size Chart Document
// ============================================================================

/// One measurement row of a size chart (e.g. the `M` row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeChartRow {
    /// Row label (e.g. `S`, `M`, `32x30`).
    pub label: String,
    /// Measurement name to value (e.g. `chest` -> `38-40"`).
    pub measurements: BTreeMap<String, String>,
}

/// Persisted size chart document.
///
/// # Invariants
/// - Row labels are unique within a chart (enforced at creation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeChart {
    /// Chart identifier.
    pub chart_id: ChartId,
    /// Chart display name.
    pub name: String,
    /// Department the chart applies to, when scoped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Measurement rows in display order.
    pub rows: Vec<SizeChartRow>,
    /// Creation instant.
    pub created_at: Timestamp,
}
