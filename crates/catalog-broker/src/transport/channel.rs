// crates/catalog-broker/src/transport/channel.rs
// ============================================================================
// Module: Channel Transport
// Description: Transport delivering envelopes to an in-process channel.
// Purpose: Back local wiring and tests with observable deliveries.
// Dependencies: catalog-core, tokio
// ============================================================================

//! ## Overview
//! The channel transport hands each envelope to a tokio unbounded channel.
//! Consumers drain [`PublishedEvent`] values in publish order; a dropped
//! receiver turns every subsequent send into [`TransportError::Closed`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use catalog_core::EventEnvelope;
use tokio::sync::mpsc;

use crate::transport::EventTransport;
use crate::transport::TransportError;

// ============================================================================
// SECTION: Channel Transport
// ============================================================================

/// One delivered envelope with its topic.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    /// Topic the envelope was published on.
    pub topic: String,
    /// The delivered envelope.
    pub envelope: EventEnvelope,
}

/// Transport delivering envelopes to an in-process channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    /// Sender side of the delivery channel.
    sender: mpsc::UnboundedSender<PublishedEvent>,
}

impl ChannelTransport {
    /// Creates a transport and the receiver draining its deliveries.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PublishedEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
            },
            receiver,
        )
    }
}

#[async_trait]
impl EventTransport for ChannelTransport {
    async fn send(&self, topic: &str, envelope: &EventEnvelope) -> Result<(), TransportError> {
        self.sender
            .send(PublishedEvent {
                topic: topic.to_string(),
                envelope: envelope.clone(),
            })
            .map_err(|_| TransportError::Closed)
    }
}
