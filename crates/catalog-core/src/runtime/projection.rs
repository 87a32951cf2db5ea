// crates/catalog-core/src/runtime/projection.rs
// ============================================================================
// Module: Projection Engine
// Description: Applies upstream events to denormalized product projections.
// Purpose: Keep review, availability, Q&A, and metric projections in sync.
// Dependencies: crate::{core, interfaces, runtime::badges}, serde, tracing
// ============================================================================

//! ## Overview
//! The projection engine consumes upstream events and mutates the
//! denormalized fields on product documents through the store's atomic
//! update primitives. Handlers locate targets by product id, falling back
//! to SKU; an unresolvable target is logged and treated as delivered (late
//! product creation does not replay past events).
//! Invariants:
//! - Review aggregates keep the distribution summing to the total and reset
//!   the average to zero when the last review is removed.
//! - Availability state is recomputed from quantity and threshold on every
//!   stock event; an `outOfStock -> purchasable` transition emits exactly one
//!   back-in-stock event.
//! - Re-executing the same logical event never corrupts these invariants.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing::warn;

use crate::core::AvailabilityStatus;
use crate::core::BadgeType;
use crate::core::CatalogError;
use crate::core::CorrelationId;
use crate::core::DEFAULT_LOW_STOCK_THRESHOLD;
use crate::core::Product;
use crate::core::ProductId;
use crate::core::SalesPeriod;
use crate::core::Sku;
use crate::core::StockState;
use crate::core::Timestamp;
use crate::core::ViewMetrics;
use crate::core::ViewPeriod;
use crate::core::round_to_2dp;
use crate::core::topics;
use crate::interfaces::EventPublisher;
use crate::interfaces::ProductStore;
use crate::interfaces::PublishOptions;
use crate::runtime::badges::BadgeEngine;
use crate::runtime::badges::EvaluateOptions;

// ============================================================================
// SECTION: Inbound Payloads
// ============================================================================

/// Payload of `review.created` and `review.deleted` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEvent {
    /// Target product.
    pub product_id: ProductId,
    /// Star rating in `1..=5`.
    pub rating: u8,
    /// True for verified-purchase reviews.
    #[serde(default)]
    pub verified_purchase: bool,
}

/// Payload of `review.updated` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUpdatedEvent {
    /// Target product.
    pub product_id: ProductId,
    /// Previous star rating, when the rating changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_rating: Option<u8>,
    /// New star rating in `1..=5`.
    pub rating: u8,
    /// True for verified-purchase reviews.
    #[serde(default)]
    pub verified_purchase: bool,
}

/// Payload of `inventory.stock.updated` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockEvent {
    /// Target SKU.
    pub sku: Sku,
    /// Target product id, when the inventory service knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    /// Current available quantity.
    pub available_quantity: u32,
    /// Low-stock threshold; defaults when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<u32>,
}

/// Payload of `analytics.product.sales.updated` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesEvent {
    /// Target product.
    pub product_id: ProductId,
    /// Category the ranking refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Units sold over the trailing 30 days.
    #[serde(default)]
    pub sales_last30_days: u64,
    /// Rank of the product within its category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_rank: Option<u32>,
}

/// Payload of `analytics.product.views.updated` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewsEvent {
    /// Target product.
    pub product_id: ProductId,
    /// Views over the trailing 7 days.
    #[serde(default)]
    pub views_last7_days: u64,
    /// Views over the 7 days before the trailing window.
    #[serde(default)]
    pub views_prior7_days: u64,
}

/// Payload of the Q&A topics; all three carry only the product id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaEvent {
    /// Target product.
    pub product_id: ProductId,
}

// ============================================================================
// SECTION: Projection Engine
// ============================================================================

/// Applies upstream events to denormalized product projections.
pub struct ProjectionEngine<S, P> {
    /// Product store used for lookups and atomic updates.
    store: Arc<S>,
    /// Publisher for fan-out events (back-in-stock).
    publisher: Arc<P>,
    /// Badge engine invoked after metric updates.
    badges: BadgeEngine<S, P>,
}

impl<S, P> ProjectionEngine<S, P>
where
    S: ProductStore,
    P: EventPublisher,
{
    /// Creates a projection engine.
    #[must_use]
    pub const fn new(store: Arc<S>, publisher: Arc<P>, badges: BadgeEngine<S, P>) -> Self {
        Self {
            store,
            publisher,
            badges,
        }
    }

    /// Handles `review.created`: folds one sample into the aggregates.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] on out-of-range ratings and
    /// [`CatalogError::StoreUnavailable`] on transient store failures.
    pub async fn handle_review_created(
        &self,
        event: &ReviewEvent,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<(), CatalogError> {
        validate_rating(event.rating)?;
        let Some(product) = self.load_target(Some(&event.product_id), None).await? else {
            log_missing_target(topics::REVIEW_CREATED, Some(&event.product_id), correlation_id);
            return Ok(());
        };
        let mut aggregates = product.review_aggregates.clone();
        aggregates.apply_add(event.rating, event.verified_purchase);
        self.store
            .atomic_set(&product.id, &[(
                "reviewAggregates".to_string(),
                serde_json::to_value(&aggregates)
                    .map_err(|err| CatalogError::Internal(err.to_string()))?,
            )])
            .await?;
        info!(
            product_id = %product.id,
            rating = event.rating,
            average = aggregates.average_rating,
            total = aggregates.total_reviews,
            correlation_id = correlation_id.map(CorrelationId::as_str),
            "review aggregates updated"
        );
        Ok(())
    }

    /// Handles `review.updated`: removes the old sample, folds in the new one.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] on out-of-range ratings and
    /// [`CatalogError::StoreUnavailable`] on transient store failures.
    pub async fn handle_review_updated(
        &self,
        event: &ReviewUpdatedEvent,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<(), CatalogError> {
        validate_rating(event.rating)?;
        let Some(product) = self.load_target(Some(&event.product_id), None).await? else {
            log_missing_target(topics::REVIEW_UPDATED, Some(&event.product_id), correlation_id);
            return Ok(());
        };
        let mut aggregates = product.review_aggregates.clone();
        if let Some(old_rating) = event.old_rating {
            validate_rating(old_rating)?;
            aggregates.apply_delete(old_rating, event.verified_purchase);
        }
        aggregates.apply_add(event.rating, event.verified_purchase);
        self.store
            .atomic_set(&product.id, &[(
                "reviewAggregates".to_string(),
                serde_json::to_value(&aggregates)
                    .map_err(|err| CatalogError::Internal(err.to_string()))?,
            )])
            .await?;
        Ok(())
    }

    /// Handles `review.deleted`: reverses one sample with clamping.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] on out-of-range ratings and
    /// [`CatalogError::StoreUnavailable`] on transient store failures.
    pub async fn handle_review_deleted(
        &self,
        event: &ReviewEvent,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<(), CatalogError> {
        validate_rating(event.rating)?;
        let Some(product) = self.load_target(Some(&event.product_id), None).await? else {
            log_missing_target(topics::REVIEW_DELETED, Some(&event.product_id), correlation_id);
            return Ok(());
        };
        let mut aggregates = product.review_aggregates.clone();
        aggregates.apply_delete(event.rating, event.verified_purchase);
        self.store
            .atomic_set(&product.id, &[(
                "reviewAggregates".to_string(),
                serde_json::to_value(&aggregates)
                    .map_err(|err| CatalogError::Internal(err.to_string()))?,
            )])
            .await?;
        Ok(())
    }

    /// Handles `inventory.stock.updated`: recomputes availability and emits
    /// a back-in-stock event on an `outOfStock -> purchasable` transition.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StoreUnavailable`] on transient store failures.
    pub async fn handle_stock_updated(
        &self,
        event: &StockEvent,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<(), CatalogError> {
        let Some(product) =
            self.load_target(event.product_id.as_ref(), Some(&event.sku)).await?
        else {
            log_missing_target(
                topics::INVENTORY_STOCK_UPDATED,
                event.product_id.as_ref(),
                correlation_id,
            );
            return Ok(());
        };
        let was_out_of_stock = product.availability_status.state == StockState::OutOfStock;
        let threshold = event.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
        let status = AvailabilityStatus::from_quantities(event.available_quantity, threshold, now);
        let back_in_stock = was_out_of_stock && status.state != StockState::OutOfStock;
        self.store
            .atomic_set(&product.id, &[(
                "availabilityStatus".to_string(),
                serde_json::to_value(&status)
                    .map_err(|err| CatalogError::Internal(err.to_string()))?,
            )])
            .await?;
        if back_in_stock {
            let payload = json!({
                "productId": product.id,
                "sku": event.sku,
                "availableQuantity": event.available_quantity,
            });
            if let Err(err) = self
                .publisher
                .publish(
                    topics::PRODUCT_BACK_IN_STOCK,
                    payload,
                    PublishOptions::for_product(&product.id, correlation_id.cloned()),
                )
                .await
            {
                warn!(product_id = %product.id, error = %err, "back-in-stock publish failed");
            }
        }
        info!(
            product_id = %product.id,
            state = ?status.state,
            quantity = event.available_quantity,
            back_in_stock,
            "availability status updated"
        );
        Ok(())
    }

    /// Handles `product.question.created`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StoreUnavailable`] on transient store failures.
    pub async fn handle_question_created(
        &self,
        event: &QaEvent,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<(), CatalogError> {
        self.apply_qa_update(event, now, correlation_id, QaUpdate::QuestionAdded).await
    }

    /// Handles `product.answer.created`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StoreUnavailable`] on transient store failures.
    pub async fn handle_answer_created(
        &self,
        event: &QaEvent,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<(), CatalogError> {
        self.apply_qa_update(event, now, correlation_id, QaUpdate::AnswerAdded).await
    }

    /// Handles `product.question.deleted`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StoreUnavailable`] on transient store failures.
    pub async fn handle_question_deleted(
        &self,
        event: &QaEvent,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<(), CatalogError> {
        self.apply_qa_update(event, now, correlation_id, QaUpdate::QuestionRemoved).await
    }

    /// Handles `analytics.product.sales.updated`: caches the metrics and
    /// re-evaluates the sales-driven badge rules.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StoreUnavailable`] on transient store failures.
    pub async fn handle_sales_updated(
        &self,
        event: &SalesEvent,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<(), CatalogError> {
        let Some(product) = self.load_target(Some(&event.product_id), None).await? else {
            log_missing_target(
                topics::ANALYTICS_SALES_UPDATED,
                Some(&event.product_id),
                correlation_id,
            );
            return Ok(());
        };
        let mut metrics = product.sales_metrics.clone().unwrap_or_default();
        metrics.last30_days = Some(SalesPeriod {
            units: event.sales_last30_days,
        });
        metrics.category.clone_from(&event.category);
        metrics.category_rank = event.category_rank;
        metrics.last_updated = Some(now);
        self.store
            .atomic_set(&product.id, &[(
                "salesMetrics".to_string(),
                serde_json::to_value(&metrics)
                    .map_err(|err| CatalogError::Internal(err.to_string()))?,
            )])
            .await?;
        self.badges
            .evaluate_rules(
                EvaluateOptions {
                    product_ids: Some(vec![product.id.clone()]),
                    badge_types: Some(vec![BadgeType::BestSeller, BadgeType::Trending]),
                    dry_run: false,
                },
                now,
                correlation_id,
            )
            .await?;
        Ok(())
    }

    /// Handles `analytics.product.views.updated`: caches the metrics with the
    /// derived growth percentage and re-evaluates the trending rule.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StoreUnavailable`] on transient store failures.
    pub async fn handle_views_updated(
        &self,
        event: &ViewsEvent,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<(), CatalogError> {
        let Some(product) = self.load_target(Some(&event.product_id), None).await? else {
            log_missing_target(
                topics::ANALYTICS_VIEWS_UPDATED,
                Some(&event.product_id),
                correlation_id,
            );
            return Ok(());
        };
        let growth_percent = view_growth_percent(event.views_last7_days, event.views_prior7_days);
        let metrics = ViewMetrics {
            last7_days: Some(ViewPeriod {
                views: event.views_last7_days,
            }),
            prior7_days: Some(ViewPeriod {
                views: event.views_prior7_days,
            }),
            growth_percent: Some(growth_percent),
            last_updated: Some(now),
        };
        self.store
            .atomic_set(&product.id, &[(
                "viewMetrics".to_string(),
                serde_json::to_value(&metrics)
                    .map_err(|err| CatalogError::Internal(err.to_string()))?,
            )])
            .await?;
        self.badges
            .evaluate_rules(
                EvaluateOptions {
                    product_ids: Some(vec![product.id.clone()]),
                    badge_types: Some(vec![BadgeType::Trending]),
                    dry_run: false,
                },
                now,
                correlation_id,
            )
            .await?;
        Ok(())
    }

    /// Applies one Q&A counter change through an atomic sub-document update.
    async fn apply_qa_update(
        &self,
        event: &QaEvent,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
        update: QaUpdate,
    ) -> Result<(), CatalogError> {
        let Some(product) = self.load_target(Some(&event.product_id), None).await? else {
            log_missing_target("product.question", Some(&event.product_id), correlation_id);
            return Ok(());
        };
        let mut stats = product.qa_stats.clone();
        match update {
            QaUpdate::QuestionAdded => stats.total_questions += 1,
            QaUpdate::AnswerAdded => stats.answered_questions += 1,
            QaUpdate::QuestionRemoved => {
                stats.total_questions = stats.total_questions.saturating_sub(1);
            }
        }
        stats.last_updated = Some(now);
        self.store
            .atomic_set(&product.id, &[(
                "qaStats".to_string(),
                serde_json::to_value(&stats)
                    .map_err(|err| CatalogError::Internal(err.to_string()))?,
            )])
            .await?;
        Ok(())
    }

    /// Resolves the target product by id, falling back to SKU.
    async fn load_target(
        &self,
        product_id: Option<&ProductId>,
        sku: Option<&Sku>,
    ) -> Result<Option<Product>, CatalogError> {
        if let Some(id) = product_id
            && let Some(product) = self.store.get_product(id).await?
        {
            return Ok(Some(product));
        }
        if let Some(sku) = sku {
            return Ok(self.store.find_by_sku(sku, true).await?);
        }
        Ok(None)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Q&A counter mutation applied by the shared update path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QaUpdate {
    /// A question was created.
    QuestionAdded,
    /// An answer was created.
    AnswerAdded,
    /// A question was deleted.
    QuestionRemoved,
}

/// Validates that a rating is in `1..=5`.
fn validate_rating(rating: u8) -> Result<(), CatalogError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(CatalogError::Validation(format!("rating {rating} outside 1..=5")))
    }
}

/// Computes the week-over-week view growth percentage.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "View counts fit comfortably in f64.")]
pub fn view_growth_percent(last7: u64, prior7: u64) -> f64 {
    if prior7 == 0 {
        return 0.0;
    }
    round_to_2dp(((last7 as f64) - (prior7 as f64)) / (prior7 as f64) * 100.0)
}

/// Logs an unresolvable event target; the event is considered delivered.
fn log_missing_target(
    topic: &str,
    product_id: Option<&ProductId>,
    correlation_id: Option<&CorrelationId>,
) {
    warn!(
        topic,
        product_id = product_id.map(ProductId::as_str),
        correlation_id = correlation_id.map(CorrelationId::as_str),
        "event target product not found; dropping projection update"
    );
}
