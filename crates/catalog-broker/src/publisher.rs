// crates/catalog-broker/src/publisher.rs
// ============================================================================
// Module: Cloud Event Publisher
// Description: CloudEvents envelope construction over a transport.
// Purpose: Emit domain events with stable envelope fields and fresh ids.
// Dependencies: catalog-core, crate::transport, rand, serde_json
// ============================================================================

//! ## Overview
//! The publisher builds CloudEvents 1.0 envelopes (`specversion "1.0"`,
//! source `/product-service`, fresh id, RFC3339 UTC time) and hands them to
//! the configured [`EventTransport`]. A failed publish is logged and
//! surfaced as an error, but callers never roll back the originating state
//! change.
//! Invariants:
//! - Event identifiers are unique within the process lifetime.
//! - Envelope `type` is always `com.aioutlet.<topic>.v1`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use catalog_core::CorrelationId;
use catalog_core::EventEnvelope;
use catalog_core::EventId;
use catalog_core::Product;
use catalog_core::ProductId;
use catalog_core::Timestamp;
use catalog_core::interfaces::EventPublisher;
use catalog_core::interfaces::PublishError;
use catalog_core::interfaces::PublishOptions;
use catalog_core::topics;
use rand::RngCore;
use rand::rngs::OsRng;
use serde_json::Value;
use serde_json::json;
use tracing::error;

use crate::transport::EventTransport;

// ============================================================================
// SECTION: Event Id Generation
// ============================================================================

/// Boot-scoped event id generator.
///
/// # Invariants
/// - Issued identifiers are unique within the process lifetime.
#[derive(Debug)]
pub struct EventIdGenerator {
    /// Boot-scoped random identifier for entropy.
    boot_id: u64,
    /// Monotonic counter for ids issued in this process.
    counter: AtomicU64,
}

impl EventIdGenerator {
    /// Creates a new generator.
    #[must_use]
    pub fn new() -> Self {
        let mut bytes = [0u8; 8];
        OsRng.fill_bytes(&mut bytes);
        Self {
            boot_id: u64::from_be_bytes(bytes),
            counter: AtomicU64::new(1),
        }
    }

    /// Issues a new event id.
    #[must_use]
    pub fn issue(&self) -> EventId {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        EventId::new(format!("evt-{:016x}-{:016x}", self.boot_id, seq))
    }
}

impl Default for EventIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Cloud Publisher
// ============================================================================

/// CloudEvents publisher over a configured transport.
pub struct CloudPublisher<T> {
    /// Transport delivering built envelopes.
    transport: Arc<T>,
    /// Event id generator.
    ids: EventIdGenerator,
}

impl<T> CloudPublisher<T>
where
    T: EventTransport,
{
    /// Creates a publisher over the transport.
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            ids: EventIdGenerator::new(),
        }
    }

    /// Builds and delivers one envelope.
    async fn deliver(
        &self,
        topic: &str,
        data: Value,
        opts: PublishOptions,
    ) -> Result<(), PublishError> {
        let envelope = EventEnvelope::for_topic(
            topic,
            self.ids.issue(),
            Timestamp::now(),
            data,
            opts.subject,
            opts.correlation_id,
        );
        self.transport
            .send(topic, &envelope)
            .await
            .map_err(|err| PublishError::Transport(err.to_string()))
    }

    /// Emits `product.created` for an admin-created product.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when the transport rejects the envelope; the
    /// creation itself stays successful.
    pub async fn product_created(
        &self,
        product: &Product,
        correlation_id: Option<CorrelationId>,
    ) -> Result<(), PublishError> {
        let data = json!({
            "productId": product.id,
            "sku": product.sku,
            "name": product.name,
            "price": product.price,
        });
        self.publish(
            topics::PRODUCT_CREATED,
            data,
            PublishOptions::for_product(&product.id, correlation_id),
        )
        .await
    }

    /// Emits `product.updated` with the changed field set.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when the transport rejects the envelope.
    pub async fn product_updated(
        &self,
        product_id: &ProductId,
        changes: Value,
        correlation_id: Option<CorrelationId>,
    ) -> Result<(), PublishError> {
        let data = json!({
            "productId": product_id,
            "changes": changes,
        });
        self.publish(
            topics::PRODUCT_UPDATED,
            data,
            PublishOptions::for_product(product_id, correlation_id),
        )
        .await
    }

    /// Emits `product.deleted` for a soft-deleted product.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when the transport rejects the envelope.
    pub async fn product_deleted(
        &self,
        product_id: &ProductId,
        deleted_at: Timestamp,
        correlation_id: Option<CorrelationId>,
    ) -> Result<(), PublishError> {
        let data = json!({
            "productId": product_id,
            "deletedAt": deleted_at,
        });
        self.publish(
            topics::PRODUCT_DELETED,
            data,
            PublishOptions::for_product(product_id, correlation_id),
        )
        .await
    }

    /// Emits `product.bulk.completed` for a finished bulk admin operation.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when the transport rejects the envelope.
    pub async fn bulk_completed(
        &self,
        operation: &str,
        affected: u64,
        correlation_id: Option<CorrelationId>,
    ) -> Result<(), PublishError> {
        let data = json!({
            "operation": operation,
            "affectedCount": affected,
        });
        self.publish(topics::BULK_COMPLETED, data, PublishOptions {
            subject: None,
            correlation_id,
        })
        .await
    }

    /// Emits `product.bulk.failed` for a failed bulk admin operation.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when the transport rejects the envelope.
    pub async fn bulk_failed(
        &self,
        operation: &str,
        reason: &str,
        correlation_id: Option<CorrelationId>,
    ) -> Result<(), PublishError> {
        let data = json!({
            "operation": operation,
            "error": reason,
        });
        self.publish(topics::BULK_FAILED, data, PublishOptions {
            subject: None,
            correlation_id,
        })
        .await
    }
}

#[async_trait]
impl<T> EventPublisher for CloudPublisher<T>
where
    T: EventTransport,
{
    async fn publish(
        &self,
        topic: &str,
        data: Value,
        opts: PublishOptions,
    ) -> Result<(), PublishError> {
        let result = self.deliver(topic, data, opts).await;
        if let Err(err) = &result {
            error!(topic, error = %err, "event publish failed");
        }
        result
    }
}
