// crates/catalog-broker/src/lib.rs
// ============================================================================
// Module: Product Catalog Broker Library
// Description: Event publication, correlation policy, and inbound routing.
// Purpose: Connect the catalog engines to the pub/sub broker.
// Dependencies: catalog-core, rand, serde_json, tokio
// ============================================================================

//! ## Overview
//! The broker crate provides the CloudEvents publisher with its reference
//! transports, the correlation-id policy applied at ingress, and the
//! inbound event router that dispatches broker deliveries to the catalog
//! engines with ack/retry/drop classification.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod correlation;
pub mod publisher;
pub mod router;
pub mod transport;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use correlation::CORRELATION_HEADER;
pub use correlation::CorrelationIdGenerator;
pub use correlation::CorrelationIdRejection;
pub use correlation::MAX_CORRELATION_ID_LENGTH;
pub use correlation::resolve_correlation_id;
pub use correlation::sanitize_correlation_id;
pub use publisher::CloudPublisher;
pub use publisher::EventIdGenerator;
pub use router::DEAD_LETTER_CAPACITY;
pub use router::DeadLetter;
pub use router::EventRouter;
pub use router::RouterOutcome;
pub use router::SEEN_SET_CAPACITY;
pub use router::Subscription;
pub use transport::ChannelTransport;
pub use transport::EventTransport;
pub use transport::LogTransport;
pub use transport::PublishedEvent;
pub use transport::TransportError;
