// crates/catalog-broker/src/transport/log.rs
// ============================================================================
// Module: Log Transport
// Description: Transport recording envelopes to the structured log.
// Purpose: Provide a no-backend delivery target for development wiring.
// Dependencies: catalog-core, tracing
// ============================================================================

//! ## Overview
//! The log transport writes each envelope to the structured log and reports
//! success. It is useful for development and for environments where the
//! broker daemon is absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use catalog_core::EventEnvelope;
use tracing::info;

use crate::transport::EventTransport;
use crate::transport::TransportError;

// ============================================================================
// SECTION: Log Transport
// ============================================================================

/// Transport recording envelopes to the structured log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

impl LogTransport {
    /// Creates a log transport.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventTransport for LogTransport {
    async fn send(&self, topic: &str, envelope: &EventEnvelope) -> Result<(), TransportError> {
        info!(
            topic,
            event_id = %envelope.id,
            event_type = %envelope.event_type,
            correlation_id = envelope.correlation_id.as_ref().map(catalog_core::CorrelationId::as_str),
            "event published"
        );
        Ok(())
    }
}
