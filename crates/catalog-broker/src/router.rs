// crates/catalog-broker/src/router.rs
// ============================================================================
// Module: Inbound Event Router
// Description: Topic subscription table and envelope dispatch with outcomes.
// Purpose: Route broker deliveries to projection handlers and classify results.
// Dependencies: catalog-core, tokio, serde_json, tracing
// ============================================================================

//! ## Overview
//! The router owns the subscription table the broker is pointed at and
//! dispatches each delivered envelope to the matching handler. Outcomes map
//! onto broker signals: `Success` acks, `Retry` nacks for redelivery, and
//! `Drop` acks while recording the envelope to a bounded dead-letter log.
//! Invariants:
//! - Duplicate envelope ids within the seen-window are acked without
//!   re-invoking handlers.
//! - Only transient failures produce `Retry`; malformed payloads and
//!   validation failures are dropped.
//! - A missing target product is a successful delivery.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::Mutex;

use catalog_core::BulkImportJobEvent;
use catalog_core::CatalogError;
use catalog_core::CorrelationId;
use catalog_core::EventEnvelope;
use catalog_core::EventId;
use catalog_core::Timestamp;
use catalog_core::interfaces::EventPublisher;
use catalog_core::interfaces::ProductStore;
use catalog_core::runtime::ProjectionEngine;
use catalog_core::topics;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Envelope ids remembered for deduplication.
pub const SEEN_SET_CAPACITY: usize = 4_096;
/// Dead letters retained for inspection.
pub const DEAD_LETTER_CAPACITY: usize = 1_024;

// ============================================================================
// SECTION: Outcomes and Records
// ============================================================================

/// Broker signal for one dispatched envelope.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterOutcome {
    /// Handler completed; ack the delivery.
    Success,
    /// Transient failure; nack for redelivery.
    Retry,
    /// Permanent failure; ack and record a dead letter.
    Drop,
}

/// One subscription entry for broker discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Pub/sub component name.
    pub pubsub_name: String,
    /// Subscribed topic.
    pub topic: String,
    /// Internal route identifier.
    pub route: String,
}

/// Record of a dropped envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    /// Topic the envelope arrived on.
    pub topic: String,
    /// Envelope identifier, when present.
    pub event_id: EventId,
    /// Drop reason.
    pub reason: String,
    /// Instant the drop was recorded.
    pub time: Timestamp,
}

// ============================================================================
// SECTION: Seen Set
// ============================================================================

/// Bounded FIFO set of recently dispatched envelope ids.
#[derive(Debug, Default)]
struct SeenSet {
    /// Ids in arrival order for eviction.
    order: VecDeque<EventId>,
    /// Ids currently remembered.
    members: HashSet<EventId>,
}

impl SeenSet {
    /// Returns true when the id was already dispatched.
    fn contains(&self, id: &EventId) -> bool {
        self.members.contains(id)
    }

    /// Remembers an id, evicting the oldest past capacity.
    fn insert(&mut self, id: EventId) {
        if self.members.insert(id.clone()) {
            self.order.push_back(id);
            if self.order.len() > SEEN_SET_CAPACITY
                && let Some(evicted) = self.order.pop_front()
            {
                self.members.remove(&evicted);
            }
        }
    }
}

// ============================================================================
// SECTION: Event Router
// ============================================================================

/// Routes inbound envelopes to handlers and classifies outcomes.
pub struct EventRouter<S, P> {
    /// Projection engine owning the topic handlers.
    projections: ProjectionEngine<S, P>,
    /// Queue feeding the bulk import worker.
    jobs: mpsc::UnboundedSender<BulkImportJobEvent>,
    /// Pub/sub component name advertised in subscriptions.
    pubsub_name: String,
    /// Bounded deduplication window.
    seen: Mutex<SeenSet>,
    /// Bounded dead-letter log.
    dead_letters: Mutex<VecDeque<DeadLetter>>,
}

impl<S, P> EventRouter<S, P>
where
    S: ProductStore,
    P: EventPublisher,
{
    /// Creates a router over the projection engine and job queue.
    #[must_use]
    pub fn new(
        projections: ProjectionEngine<S, P>,
        jobs: mpsc::UnboundedSender<BulkImportJobEvent>,
        pubsub_name: impl Into<String>,
    ) -> Self {
        Self {
            projections,
            jobs,
            pubsub_name: pubsub_name.into(),
            seen: Mutex::new(SeenSet::default()),
            dead_letters: Mutex::new(VecDeque::new()),
        }
    }

    /// Enumerates the topics this service subscribes to.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<Subscription> {
        const ROUTES: [(&str, &str); 10] = [
            (topics::REVIEW_CREATED, "/events/review-created"),
            (topics::REVIEW_UPDATED, "/events/review-updated"),
            (topics::REVIEW_DELETED, "/events/review-deleted"),
            (topics::INVENTORY_STOCK_UPDATED, "/events/inventory-updated"),
            (topics::ANALYTICS_SALES_UPDATED, "/events/sales-updated"),
            (topics::ANALYTICS_VIEWS_UPDATED, "/events/views-updated"),
            (topics::QUESTION_CREATED, "/events/question-created"),
            (topics::ANSWER_CREATED, "/events/answer-created"),
            (topics::QUESTION_DELETED, "/events/question-deleted"),
            (topics::BULK_IMPORT_JOB_CREATED, "/events/bulk-import-job-created"),
        ];
        ROUTES
            .iter()
            .map(|(topic, route)| Subscription {
                pubsub_name: self.pubsub_name.clone(),
                topic: (*topic).to_string(),
                route: (*route).to_string(),
            })
            .collect()
    }

    /// Returns the recorded dead letters, oldest first.
    #[must_use]
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters
            .lock()
            .map(|letters| letters.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Dispatches one delivered envelope and classifies the outcome.
    pub async fn dispatch(&self, topic: &str, envelope: &EventEnvelope) -> RouterOutcome {
        if self.already_seen(&envelope.id) {
            info!(topic, event_id = %envelope.id, "duplicate delivery acked");
            return RouterOutcome::Success;
        }
        let correlation_id = envelope.correlation_id.clone();
        let now = Timestamp::now();
        let outcome = self
            .route(topic, &envelope.data, now, correlation_id.as_ref())
            .await;
        match outcome {
            Ok(()) => {
                self.mark_seen(envelope.id.clone());
                RouterOutcome::Success
            }
            Err(err) if err.is_transient() => {
                warn!(topic, event_id = %envelope.id, error = %err, "transient handler failure; retrying");
                RouterOutcome::Retry
            }
            Err(err) => {
                self.mark_seen(envelope.id.clone());
                self.record_dead_letter(topic, &envelope.id, &err.to_string(), now);
                RouterOutcome::Drop
            }
        }
    }

    /// Routes the payload to the topic's handler.
    async fn route(
        &self,
        topic: &str,
        data: &Value,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<(), CatalogError> {
        match topic {
            topics::REVIEW_CREATED => {
                let event = decode(data)?;
                self.projections.handle_review_created(&event, correlation_id).await
            }
            topics::REVIEW_UPDATED => {
                let event = decode(data)?;
                self.projections.handle_review_updated(&event, correlation_id).await
            }
            topics::REVIEW_DELETED => {
                let event = decode(data)?;
                self.projections.handle_review_deleted(&event, correlation_id).await
            }
            topics::INVENTORY_STOCK_UPDATED => {
                let event = decode(data)?;
                self.projections.handle_stock_updated(&event, now, correlation_id).await
            }
            topics::ANALYTICS_SALES_UPDATED => {
                let event = decode(data)?;
                self.projections.handle_sales_updated(&event, now, correlation_id).await
            }
            topics::ANALYTICS_VIEWS_UPDATED => {
                let event = decode(data)?;
                self.projections.handle_views_updated(&event, now, correlation_id).await
            }
            topics::QUESTION_CREATED => {
                let event = decode(data)?;
                self.projections.handle_question_created(&event, now, correlation_id).await
            }
            topics::ANSWER_CREATED => {
                let event = decode(data)?;
                self.projections.handle_answer_created(&event, now, correlation_id).await
            }
            topics::QUESTION_DELETED => {
                let event = decode(data)?;
                self.projections.handle_question_deleted(&event, now, correlation_id).await
            }
            topics::BULK_IMPORT_JOB_CREATED => {
                let event: BulkImportJobEvent = decode(data)?;
                info!(
                    job_id = %event.job_id,
                    products = event.products.len(),
                    "bulk import job received"
                );
                self.jobs.send(event).map_err(|_| {
                    CatalogError::StoreUnavailable("bulk import worker queue closed".to_string())
                })
            }
            _ => Err(CatalogError::Validation(format!("unknown topic: {topic}"))),
        }
    }

    /// Returns true when the envelope id is in the seen-window.
    fn already_seen(&self, id: &EventId) -> bool {
        self.seen.lock().map(|seen| seen.contains(id)).unwrap_or(false)
    }

    /// Remembers an envelope id.
    fn mark_seen(&self, id: EventId) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.insert(id);
        }
    }

    /// Records a dropped envelope, evicting the oldest past capacity.
    fn record_dead_letter(&self, topic: &str, event_id: &EventId, reason: &str, time: Timestamp) {
        warn!(topic, event_id = %event_id, reason, "envelope dropped to dead-letter log");
        if let Ok(mut letters) = self.dead_letters.lock() {
            letters.push_back(DeadLetter {
                topic: topic.to_string(),
                event_id: event_id.clone(),
                reason: reason.to_string(),
                time,
            });
            if letters.len() > DEAD_LETTER_CAPACITY {
                letters.pop_front();
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Decodes an envelope payload into a typed event.
fn decode<T: DeserializeOwned>(data: &Value) -> Result<T, CatalogError> {
    serde_json::from_value(data.clone())
        .map_err(|err| CatalogError::Validation(format!("malformed event payload: {err}")))
}
