// crates/catalog-core/src/runtime/badges.rs
// ============================================================================
// Module: Badge Rule Engine
// Description: Manual badge operations, automated rule evaluation, and sweeps.
// Purpose: Maintain the badges field under admin and rule-engine control.
// Dependencies: crate::{core, interfaces, runtime::{conditions, fields}}, tracing
// ============================================================================

//! ## Overview
//! The badge engine owns every mutation of a product's `badges` field.
//! Manual assignments carry the acting admin in `assignedBy`; rule-driven
//! assignments carry none. Rules may only remove badges they assigned:
//! manually-assigned badges are never auto-removed, and a rule whose badge
//! type is already present manually skips with a `manual-precedence`
//! classification.
//! Invariants:
//! - At most one badge per type on any product.
//! - Dry-run evaluation leaves every product document unchanged.
//! - Expired badges are dropped by the sweep and excluded from the active
//!   badge projection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use tracing::info;
use tracing::warn;

use crate::core::ActorId;
use crate::core::Badge;
use crate::core::BadgeRule;
use crate::core::BadgeType;
use crate::core::CatalogError;
use crate::core::CorrelationId;
use crate::core::Product;
use crate::core::ProductId;
use crate::core::Timestamp;
use crate::core::default_badge_rules;
use crate::core::topics;
use crate::interfaces::EventPublisher;
use crate::interfaces::Paging;
use crate::interfaces::ProductFilter;
use crate::interfaces::ProductStore;
use crate::interfaces::PublishOptions;
use crate::runtime::conditions::evaluate_rule;
use crate::runtime::fields::product_document;

// ============================================================================
// SECTION: Operation Inputs
// ============================================================================

/// Optional attributes for a badge assignment.
#[derive(Debug, Clone, Default)]
pub struct AssignOptions {
    /// Acting admin; leave absent only on the automated path.
    pub assigned_by: Option<ActorId>,
    /// Optional expiry instant.
    pub expires_at: Option<Timestamp>,
    /// Additional badge metadata.
    pub metadata: BTreeMap<String, Value>,
}

/// Scope and mode for a rule evaluation sweep.
#[derive(Debug, Clone, Default)]
pub struct EvaluateOptions {
    /// Restrict evaluation to these products; all active products otherwise.
    pub product_ids: Option<Vec<ProductId>>,
    /// Restrict evaluation to rules for these badge types; all otherwise.
    pub badge_types: Option<Vec<BadgeType>>,
    /// Compute outcomes without applying any change.
    pub dry_run: bool,
}

// ============================================================================
// SECTION: Operation Reports
// ============================================================================

/// Reason a rule outcome was skipped for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedBadge {
    /// Badge type the rule would have touched.
    pub badge_type: BadgeType,
    /// Stable skip classification (e.g. `manual-precedence`).
    pub reason: String,
}

/// Evaluation outcome for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductEvaluation {
    /// Evaluated product.
    pub product_id: ProductId,
    /// Badge types added (or that would be added under dry-run).
    pub badges_added: Vec<BadgeType>,
    /// Badge types removed (or that would be removed under dry-run).
    pub badges_removed: Vec<BadgeType>,
    /// Rule outcomes skipped with their classification.
    pub skipped: Vec<SkippedBadge>,
    /// Per-rule errors that did not abort the sweep.
    pub errors: Vec<String>,
}

/// Aggregate report for a rule evaluation sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    /// Products examined.
    pub products_evaluated: u64,
    /// Total badges added.
    pub badges_added: u64,
    /// Total badges removed.
    pub badges_removed: u64,
    /// Per-product outcomes.
    pub results: Vec<ProductEvaluation>,
}

/// Per-product failure in a bulk assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkFailure {
    /// Product the assignment failed for.
    pub product_id: ProductId,
    /// Failure description.
    pub error: String,
}

/// Outcome report for a bulk badge assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BulkAssignReport {
    /// Products processed.
    pub total_processed: u64,
    /// Products that received the badge.
    pub success: Vec<ProductId>,
    /// Products skipped because the badge was already present.
    pub skipped: Vec<BulkSkip>,
    /// Products that failed.
    pub failed: Vec<BulkFailure>,
}

/// Per-product skip in a bulk assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSkip {
    /// Product the assignment was skipped for.
    pub product_id: ProductId,
    /// Skip reason.
    pub reason: String,
}

/// Active badges of a product with the selected display badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductBadges {
    /// Product the badges belong to.
    pub product_id: ProductId,
    /// Non-expired badges.
    pub badges: Vec<Badge>,
    /// Highest-priority badge for storefront display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_badge: Option<Badge>,
}

/// Report for an expiry sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Expired badge instances dropped.
    pub badges_removed: u64,
    /// Products whose badge list changed.
    pub products_updated: Vec<ProductId>,
}

/// Aggregate badge usage statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BadgeStatistics {
    /// Badge instances across all products.
    pub total_badges: u64,
    /// Badge instances by type.
    pub badges_by_type: BTreeMap<BadgeType, u64>,
    /// Products carrying at least one badge.
    pub products_with_badges: u64,
    /// Automated badge instances.
    pub automated_badges: u64,
    /// Manually assigned badge instances.
    pub manual_badges: u64,
    /// Expired badge instances not yet swept.
    pub expired_badges: u64,
}

// ============================================================================
// SECTION: Badge Engine
// ============================================================================

/// Maintains the `badges` field under manual and automated control.
pub struct BadgeEngine<S, P> {
    /// Product store used for lookups and atomic updates.
    store: Arc<S>,
    /// Publisher for badge lifecycle events.
    publisher: Arc<P>,
    /// Rule set evaluated by sweeps.
    rules: Arc<Vec<BadgeRule>>,
}

impl<S, P> Clone for BadgeEngine<S, P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            publisher: Arc::clone(&self.publisher),
            rules: Arc::clone(&self.rules),
        }
    }
}

impl<S, P> BadgeEngine<S, P>
where
    S: ProductStore,
    P: EventPublisher,
{
    /// Creates a badge engine with an explicit rule set.
    #[must_use]
    pub fn new(store: Arc<S>, publisher: Arc<P>, rules: Vec<BadgeRule>) -> Self {
        Self {
            store,
            publisher,
            rules: Arc::new(rules),
        }
    }

    /// Creates a badge engine with the built-in rule set.
    #[must_use]
    pub fn with_default_rules(store: Arc<S>, publisher: Arc<P>) -> Self {
        Self::new(store, publisher, default_badge_rules())
    }

    /// Returns the rule set evaluated by sweeps.
    #[must_use]
    pub fn rules(&self) -> &[BadgeRule] {
        &self.rules
    }

    /// Manually assigns a badge.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for a missing product and a
    /// duplicate-badge conflict when the type is already attached.
    pub async fn assign_badge(
        &self,
        product_id: &ProductId,
        badge_type: BadgeType,
        opts: AssignOptions,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<Badge, CatalogError> {
        let product = self.require_product(product_id).await?;
        if product.has_badge(badge_type) {
            return Err(CatalogError::duplicate_badge(badge_type));
        }
        let badge = Badge {
            badge_type,
            assigned_at: now,
            assigned_by: opts.assigned_by,
            expires_at: opts.expires_at,
            metadata: opts.metadata,
        };
        let mut badges = product.badges;
        badges.push(badge.clone());
        self.write_badges(product_id, &badges).await?;
        let topic =
            if badge.is_automated() { topics::BADGE_AUTO_ASSIGNED } else { topics::BADGE_ASSIGNED };
        self.emit_badge_event(topic, product_id, badge_type, correlation_id).await;
        info!(product_id = %product_id, badge = %badge_type, "badge assigned");
        Ok(badge)
    }

    /// Manually removes a badge.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for a missing product or a badge
    /// type that is not attached.
    pub async fn remove_badge(
        &self,
        product_id: &ProductId,
        badge_type: BadgeType,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<(), CatalogError> {
        let product = self.require_product(product_id).await?;
        let before = product.badges.len();
        let badges: Vec<Badge> =
            product.badges.into_iter().filter(|badge| badge.badge_type != badge_type).collect();
        if badges.len() == before {
            return Err(CatalogError::NotFound(format!(
                "badge '{badge_type}' not present on product {product_id}"
            )));
        }
        self.write_badges(product_id, &badges).await?;
        self.emit_badge_event(topics::BADGE_REMOVED, product_id, badge_type, correlation_id).await;
        info!(product_id = %product_id, badge = %badge_type, "badge removed");
        Ok(())
    }

    /// Assigns a badge to many products with per-item outcome classification.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StoreUnavailable`] only when the store fails
    /// transiently before any product is processed; per-product failures are
    /// reported, not raised.
    pub async fn bulk_assign(
        &self,
        product_ids: &[ProductId],
        badge_type: BadgeType,
        opts: AssignOptions,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<BulkAssignReport, CatalogError> {
        let mut report = BulkAssignReport {
            total_processed: product_ids.len() as u64,
            ..BulkAssignReport::default()
        };
        for product_id in product_ids {
            match self
                .assign_badge(product_id, badge_type, opts.clone(), now, correlation_id)
                .await
            {
                Ok(_) => report.success.push(product_id.clone()),
                Err(CatalogError::Conflict {
                    message, ..
                }) => {
                    report.skipped.push(BulkSkip {
                        product_id: product_id.clone(),
                        reason: message,
                    });
                }
                Err(err) => {
                    report.failed.push(BulkFailure {
                        product_id: product_id.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    /// Evaluates the configured rules over the selected products.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StoreUnavailable`] on transient store
    /// failures while enumerating products; per-rule failures are recorded
    /// in the report instead.
    pub async fn evaluate_rules(
        &self,
        opts: EvaluateOptions,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
    ) -> Result<EvaluationReport, CatalogError> {
        let products = self.select_products(opts.product_ids.as_deref()).await?;
        let rules: Vec<&BadgeRule> = self
            .rules
            .iter()
            .filter(|rule| rule.is_active)
            .filter(|rule| {
                opts.badge_types
                    .as_ref()
                    .is_none_or(|badge_types| badge_types.contains(&rule.badge_type))
            })
            .collect();
        let mut report = EvaluationReport {
            products_evaluated: products.len() as u64,
            ..EvaluationReport::default()
        };
        for product in products {
            let evaluation =
                self.evaluate_product(&product, &rules, opts.dry_run, now, correlation_id).await;
            report.badges_added += evaluation.badges_added.len() as u64;
            report.badges_removed += evaluation.badges_removed.len() as u64;
            report.results.push(evaluation);
        }
        Ok(report)
    }

    /// Returns the active badges and the display badge for a product.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for a missing product.
    pub async fn product_badges(
        &self,
        product_id: &ProductId,
        now: Timestamp,
    ) -> Result<ProductBadges, CatalogError> {
        let product = self.require_product(product_id).await?;
        let badges = product.active_badges(now);
        let display_badge =
            badges.iter().max_by_key(|badge| badge.badge_type.priority()).cloned();
        Ok(ProductBadges {
            product_id: product_id.clone(),
            badges,
            display_badge,
        })
    }

    /// Drops expired badges from every product carrying badges.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StoreUnavailable`] on transient store failures.
    pub async fn remove_expired_badges(&self, now: Timestamp) -> Result<SweepReport, CatalogError> {
        let mut report = SweepReport::default();
        for product in self.badged_products().await? {
            let badges: Vec<Badge> =
                product.badges.iter().filter(|badge| !badge.is_expired(now)).cloned().collect();
            let removed = product.badges.len() - badges.len();
            if removed > 0 {
                self.write_badges(&product.id, &badges).await?;
                report.badges_removed += removed as u64;
                report.products_updated.push(product.id.clone());
            }
        }
        if report.badges_removed > 0 {
            info!(
                removed = report.badges_removed,
                products = report.products_updated.len(),
                "expired badges swept"
            );
        }
        Ok(report)
    }

    /// Computes aggregate badge usage statistics.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StoreUnavailable`] on transient store failures.
    pub async fn statistics(&self, now: Timestamp) -> Result<BadgeStatistics, CatalogError> {
        let mut stats = BadgeStatistics::default();
        for product in self.badged_products().await? {
            if product.badges.is_empty() {
                continue;
            }
            stats.products_with_badges += 1;
            for badge in &product.badges {
                stats.total_badges += 1;
                *stats.badges_by_type.entry(badge.badge_type).or_insert(0) += 1;
                if badge.is_automated() {
                    stats.automated_badges += 1;
                } else {
                    stats.manual_badges += 1;
                }
                if badge.is_expired(now) {
                    stats.expired_badges += 1;
                }
            }
        }
        Ok(stats)
    }

    /// Evaluates every selected rule against one product.
    async fn evaluate_product(
        &self,
        product: &Product,
        rules: &[&BadgeRule],
        dry_run: bool,
        now: Timestamp,
        correlation_id: Option<&CorrelationId>,
    ) -> ProductEvaluation {
        let document = product_document(product);
        let mut working = product.badges.clone();
        let mut evaluation = ProductEvaluation {
            product_id: product.id.clone(),
            badges_added: Vec::new(),
            badges_removed: Vec::new(),
            skipped: Vec::new(),
            errors: Vec::new(),
        };
        for rule in rules {
            let satisfied = evaluate_rule(rule, &document, now);
            let existing_automated = working
                .iter()
                .find(|badge| badge.badge_type == rule.badge_type)
                .map(Badge::is_automated);
            if satisfied {
                match existing_automated {
                    None => {
                        let mut metadata = BTreeMap::new();
                        metadata.insert("rule".to_string(), json!(rule.name.clone()));
                        working.push(Badge {
                            badge_type: rule.badge_type,
                            assigned_at: now,
                            assigned_by: None,
                            expires_at: None,
                            metadata,
                        });
                        evaluation.badges_added.push(rule.badge_type);
                    }
                    Some(false) => {
                        evaluation.skipped.push(SkippedBadge {
                            badge_type: rule.badge_type,
                            reason: "manual-precedence".to_string(),
                        });
                    }
                    Some(true) => {}
                }
            } else if rule.auto_remove_when_invalid && existing_automated == Some(true) {
                working.retain(|badge| badge.badge_type != rule.badge_type);
                evaluation.badges_removed.push(rule.badge_type);
            }
        }
        let changed =
            !evaluation.badges_added.is_empty() || !evaluation.badges_removed.is_empty();
        if changed && !dry_run {
            if let Err(err) = self.write_badges(&product.id, &working).await {
                evaluation.errors.push(err.to_string());
                evaluation.badges_added.clear();
                evaluation.badges_removed.clear();
                return evaluation;
            }
            for badge_type in &evaluation.badges_added {
                self.emit_badge_event(
                    topics::BADGE_AUTO_ASSIGNED,
                    &product.id,
                    *badge_type,
                    correlation_id,
                )
                .await;
            }
            for badge_type in &evaluation.badges_removed {
                self.emit_badge_event(
                    topics::BADGE_AUTO_REMOVED,
                    &product.id,
                    *badge_type,
                    correlation_id,
                )
                .await;
            }
        }
        evaluation
    }

    /// Loads the evaluation targets: explicit ids or all active products.
    async fn select_products(
        &self,
        product_ids: Option<&[ProductId]>,
    ) -> Result<Vec<Product>, CatalogError> {
        if let Some(ids) = product_ids {
            let mut products = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(product) = self.store.get_product(id).await?
                    && product.is_active
                {
                    products.push(product);
                }
            }
            return Ok(products);
        }
        self.collect_pages(&ProductFilter::active()).await
    }

    /// Loads every product carrying at least one badge.
    async fn badged_products(&self) -> Result<Vec<Product>, CatalogError> {
        let filter = ProductFilter {
            has_badges: Some(true),
            ..ProductFilter::default()
        };
        self.collect_pages(&filter).await
    }

    /// Drains every page of a filtered query.
    async fn collect_pages(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogError> {
        let mut products = Vec::new();
        let mut offset = 0_u64;
        loop {
            let page = self
                .store
                .find_many(filter, Paging::new(offset, Paging::MAX_LIMIT))
                .await?;
            let fetched = page.items.len() as u64;
            products.extend(page.items);
            offset += fetched;
            if fetched == 0 || offset >= page.total {
                return Ok(products);
            }
        }
    }

    /// Loads a product or fails with `NotFound`.
    async fn require_product(&self, product_id: &ProductId) -> Result<Product, CatalogError> {
        self.store
            .get_product(product_id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("product {product_id} not found")))
    }

    /// Writes the badge array through one atomic field update.
    async fn write_badges(
        &self,
        product_id: &ProductId,
        badges: &[Badge],
    ) -> Result<(), CatalogError> {
        let value = serde_json::to_value(badges)
            .map_err(|err| CatalogError::Internal(err.to_string()))?;
        self.store.atomic_set(product_id, &[("badges".to_string(), value)]).await?;
        Ok(())
    }

    /// Emits a badge lifecycle event; failures are logged, never raised.
    async fn emit_badge_event(
        &self,
        topic: &str,
        product_id: &ProductId,
        badge_type: BadgeType,
        correlation_id: Option<&CorrelationId>,
    ) {
        let payload = json!({
            "productId": product_id,
            "badgeType": badge_type,
        });
        if let Err(err) = self
            .publisher
            .publish(
                topic,
                payload,
                PublishOptions::for_product(product_id, correlation_id.cloned()),
            )
            .await
        {
            warn!(topic, product_id = %product_id, error = %err, "badge event publish failed");
        }
    }
}
