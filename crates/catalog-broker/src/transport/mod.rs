// crates/catalog-broker/src/transport/mod.rs
// ============================================================================
// Module: Broker Transports
// Description: Transport trait and reference implementations for envelope delivery.
// Purpose: Deliver built envelopes to the pub/sub backend.
// Dependencies: catalog-core, async-trait, thiserror
// ============================================================================

//! ## Overview
//! Transports accept fully built [`catalog_core::EventEnvelope`] values for a
//! topic and hand them to the backing pub/sub system. Implementations must
//! fail closed on delivery errors; the publisher logs the failure without
//! rolling back the originating operation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use catalog_core::EventEnvelope;
use thiserror::Error;

// ============================================================================
// SECTION: Transport Errors
// ============================================================================

/// Errors emitted by broker transports.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Delivery to the backend failed.
    #[error("transport delivery failed: {0}")]
    DeliveryFailed(String),
    /// The transport has been closed.
    #[error("transport closed")]
    Closed,
}

// ============================================================================
// SECTION: Transport Trait
// ============================================================================

/// Delivers built envelopes to the pub/sub backend.
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Delivers the envelope on the topic.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when delivery fails.
    async fn send(&self, topic: &str, envelope: &EventEnvelope) -> Result<(), TransportError>;
}

// ============================================================================
// SECTION: Implementations
// ============================================================================

pub mod channel;
pub mod log;

pub use channel::ChannelTransport;
pub use channel::PublishedEvent;
pub use log::LogTransport;
