// crates/catalog-core/src/core/envelope.rs
// ============================================================================
// Module: Product Catalog Event Envelope
// Description: CloudEvents 1.0 envelope shape and topic catalog.
// Purpose: Define the wire shape consumed and produced on the pub/sub broker.
// Dependencies: crate::core::{identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Every event on the broker is wrapped in a CloudEvents 1.0 JSON envelope.
//! Emitted envelopes carry `specversion "1.0"`, source `/product-service`,
//! a fresh identifier, an RFC3339 UTC time, and a type in the
//! `com.aioutlet.<topic>.v1` namespace.
//! Invariants:
//! - `id` is stable per logical event and is the deduplication key.
//! - `data` is opaque to the envelope layer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::CorrelationId;
use crate::core::identifiers::EventId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// CloudEvents specification version emitted by this service.
pub const SPEC_VERSION: &str = "1.0";
/// Event source identifying this service.
pub const EVENT_SOURCE: &str = "/product-service";
/// Content type for all emitted event payloads.
pub const EVENT_CONTENT_TYPE: &str = "application/json";

/// Builds the namespaced event type for a topic.
///
/// `product.badge.assigned` becomes `com.aioutlet.product.badge.assigned.v1`.
#[must_use]
pub fn event_type_for(topic: &str) -> String {
    format!("com.aioutlet.{topic}.v1")
}

// ============================================================================
// SECTION: Topic Catalog
// ============================================================================

/// Topic names consumed and produced by the catalog service.
pub mod topics {
    /// Inbound: a review was created.
    pub const REVIEW_CREATED: &str = "review.created";
    /// Inbound: a review was updated.
    pub const REVIEW_UPDATED: &str = "review.updated";
    /// Inbound: a review was deleted.
    pub const REVIEW_DELETED: &str = "review.deleted";
    /// Inbound: inventory stock changed.
    pub const INVENTORY_STOCK_UPDATED: &str = "inventory.stock.updated";
    /// Inbound: analytics sales metrics changed.
    pub const ANALYTICS_SALES_UPDATED: &str = "analytics.product.sales.updated";
    /// Inbound: analytics view metrics changed.
    pub const ANALYTICS_VIEWS_UPDATED: &str = "analytics.product.views.updated";
    /// Inbound: a product question was created.
    pub const QUESTION_CREATED: &str = "product.question.created";
    /// Inbound: a product answer was created.
    pub const ANSWER_CREATED: &str = "product.answer.created";
    /// Inbound: a product question was deleted.
    pub const QUESTION_DELETED: &str = "product.question.deleted";
    /// Inbound: a bulk import job was created.
    pub const BULK_IMPORT_JOB_CREATED: &str = "product.bulk.import.job.created";

    /// Outbound: a product was created.
    pub const PRODUCT_CREATED: &str = "product.created";
    /// Outbound: a product was updated.
    pub const PRODUCT_UPDATED: &str = "product.updated";
    /// Outbound: a product was deleted.
    pub const PRODUCT_DELETED: &str = "product.deleted";
    /// Outbound: an out-of-stock product became purchasable again.
    pub const PRODUCT_BACK_IN_STOCK: &str = "product.back.in.stock";
    /// Outbound: a badge was manually assigned.
    pub const BADGE_ASSIGNED: &str = "product.badge.assigned";
    /// Outbound: a badge was manually removed.
    pub const BADGE_REMOVED: &str = "product.badge.removed";
    /// Outbound: a badge was assigned by the rule engine.
    pub const BADGE_AUTO_ASSIGNED: &str = "product.badge.auto.assigned";
    /// Outbound: a badge was removed by the rule engine.
    pub const BADGE_AUTO_REMOVED: &str = "product.badge.auto.removed";
    /// Outbound: a variation family or child was created.
    pub const VARIATION_CREATED: &str = "product.variation.created";
    /// Outbound: a child variation was updated.
    pub const VARIATION_UPDATED: &str = "product.variation.updated";
    /// Outbound: a child variation was soft-deleted.
    pub const VARIATION_DELETED: &str = "product.variation.deleted";
    /// Outbound: a size chart was assigned to a product.
    pub const SIZECHART_ASSIGNED: &str = "product.sizechart.assigned";
    /// Outbound: a size chart was unassigned from a product.
    pub const SIZECHART_UNASSIGNED: &str = "product.sizechart.unassigned";
    /// Outbound: batch progress for a bulk import job.
    pub const BULK_IMPORT_PROGRESS: &str = "product.bulk.import.progress";
    /// Outbound: a bulk import job completed.
    pub const BULK_IMPORT_COMPLETED: &str = "product.bulk.import.completed";
    /// Outbound: a bulk import job failed.
    pub const BULK_IMPORT_FAILED: &str = "product.bulk.import.failed";
    /// Outbound: a bulk admin operation completed.
    pub const BULK_COMPLETED: &str = "product.bulk.completed";
    /// Outbound: a bulk admin operation failed.
    pub const BULK_FAILED: &str = "product.bulk.failed";
}

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// CloudEvents 1.0 envelope consumed and produced by the service.
///
/// # Invariants
/// - `specversion` is always `"1.0"` for emitted envelopes.
/// - `id` is the broker-level deduplication key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// CloudEvents specification version.
    pub specversion: String,
    /// Namespaced event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event source path.
    pub source: String,
    /// Unique event identifier.
    pub id: EventId,
    /// Event creation instant (RFC3339 UTC).
    pub time: Timestamp,
    /// Optional subject, e.g. `product/{id}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Optional correlation identifier propagated from the originating request.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "correlationid")]
    pub correlation_id: Option<CorrelationId>,
    /// Payload content type.
    #[serde(default = "default_content_type")]
    pub datacontenttype: String,
    /// Event payload.
    pub data: Value,
}

/// Returns the default payload content type.
fn default_content_type() -> String {
    EVENT_CONTENT_TYPE.to_string()
}

impl EventEnvelope {
    /// Builds an envelope for an outbound event on the given topic.
    #[must_use]
    pub fn for_topic(
        topic: &str,
        id: EventId,
        time: Timestamp,
        data: Value,
        subject: Option<String>,
        correlation_id: Option<CorrelationId>,
    ) -> Self {
        Self {
            specversion: SPEC_VERSION.to_string(),
            event_type: event_type_for(topic),
            source: EVENT_SOURCE.to_string(),
            id,
            time,
            subject,
            correlation_id,
            datacontenttype: EVENT_CONTENT_TYPE.to_string(),
            data,
        }
    }
}
