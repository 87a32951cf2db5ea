// crates/catalog-core/src/runtime/sizecharts.rs
// ============================================================================
// Module: Size Chart Assignment
// Description: Assign and unassign size charts on product documents.
// Purpose: Maintain the sizeChartId reference with lifecycle events.
// Dependencies: crate::{core, interfaces}, serde_json, tracing
// ============================================================================

//! ## Overview
//! Size chart assignment only touches the `sizeChartId` reference on the
//! product; charts themselves are immutable once stored. Both operations
//! emit lifecycle events for downstream caches.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use serde_json::json;
use tracing::warn;

use crate::core::CatalogError;
use crate::core::ChartId;
use crate::core::CorrelationId;
use crate::core::ProductId;
use crate::core::SizeChart;
use crate::core::Timestamp;
use crate::core::topics;
use crate::interfaces::EventPublisher;
use crate::interfaces::ProductStore;
use crate::interfaces::PublishOptions;

// ============================================================================
// SECTION: Size Chart Engine
// ============================================================================

/// Maintains size chart references on products.
pub struct SizeChartEngine<S, P> {
    /// Product store used for lookups and writes.
    store: Arc<S>,
    /// Publisher for size chart lifecycle events.
    publisher: Arc<P>,
}

impl<S, P> SizeChartEngine<S, P>
where
    S: ProductStore,
    P: EventPublisher,
{
    /// Creates a size chart engine.
    #[must_use]
    pub const fn new(store: Arc<S>, publisher: Arc<P>) -> Self {
        Self {
            store,
            publisher,
        }
    }

    /// Persists a size chart document.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for charts without rows or with
    /// duplicate row labels.
    pub async fn put_chart(&self, chart: &SizeChart) -> Result<(), CatalogError> {
        if chart.rows.is_empty() {
            return Err(CatalogError::Validation(
                "size chart requires at least one row".to_string(),
            ));
        }
        let mut labels = std::collections::BTreeSet::new();
        for row in &chart.rows {
            if !labels.insert(row.label.to_lowercase()) {
                return Err(CatalogError::Validation(format!(
                    "duplicate size chart row label '{}'",
                    row.label
                )));
            }
        }
        self.store.put_size_chart(chart).await?;
        Ok(())
    }

    /// Assigns a chart to a product.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when the product or chart is
    /// missing.
    pub async fn assign(
        &self,
        product_id: &ProductId,
        chart_id: &ChartId,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<(), CatalogError> {
        if self.store.get_product(product_id).await?.is_none() {
            return Err(CatalogError::NotFound(format!("product {product_id} not found")));
        }
        if self.store.get_size_chart(chart_id).await?.is_none() {
            return Err(CatalogError::NotFound(format!("size chart {chart_id} not found")));
        }
        self.write_reference(product_id, Some(chart_id), now).await?;
        self.emit(
            topics::SIZECHART_ASSIGNED,
            product_id,
            json!({ "productId": product_id, "chartId": chart_id }),
            correlation_id,
        )
        .await;
        Ok(())
    }

    /// Removes the chart reference from a product.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when the product is missing or
    /// carries no chart.
    pub async fn unassign(
        &self,
        product_id: &ProductId,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<(), CatalogError> {
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("product {product_id} not found")))?;
        let Some(chart_id) = product.size_chart_id else {
            return Err(CatalogError::NotFound(format!(
                "product {product_id} has no size chart assigned"
            )));
        };
        self.write_reference(product_id, None, now).await?;
        self.emit(
            topics::SIZECHART_UNASSIGNED,
            product_id,
            json!({ "productId": product_id, "chartId": chart_id }),
            correlation_id,
        )
        .await;
        Ok(())
    }

    /// Writes the chart reference through one atomic field update.
    async fn write_reference(
        &self,
        product_id: &ProductId,
        chart_id: Option<&ChartId>,
        now: Timestamp,
    ) -> Result<(), CatalogError> {
        let chart_value = chart_id.map_or(Value::Null, |id| {
            serde_json::to_value(id).unwrap_or(Value::Null)
        });
        self.store
            .atomic_set(product_id, &[
                ("sizeChartId".to_string(), chart_value),
                (
                    "updatedAt".to_string(),
                    serde_json::to_value(now)
                        .map_err(|err| CatalogError::Internal(err.to_string()))?,
                ),
            ])
            .await?;
        Ok(())
    }

    /// Emits a size chart lifecycle event; failures are logged, never raised.
    async fn emit(
        &self,
        topic: &str,
        product_id: &ProductId,
        payload: Value,
        correlation_id: Option<&CorrelationId>,
    ) {
        if let Err(err) = self
            .publisher
            .publish(
                topic,
                payload,
                PublishOptions::for_product(product_id, correlation_id.cloned()),
            )
            .await
        {
            warn!(topic, product_id = %product_id, error = %err, "size chart event publish failed");
        }
    }
}
