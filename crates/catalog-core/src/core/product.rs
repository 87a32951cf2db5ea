// crates/catalog-core/src/core/product.rs
// ============================================================================
// Module: Product Catalog Product Model
// Description: Product documents, variation attributes, and denormalized projections.
// Purpose: Define the central catalog entity and its derived sub-documents.
// Dependencies: crate::core::{badge, identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! The product document is the central entity of the catalog. Upstream
//! services own reviews, inventory, Q&A, and analytics; this model only
//! carries denormalized projections of them. Wire names are camelCase to
//! match the platform contract.
//! Invariants:
//! - `price` is non-negative.
//! - A `child` product carries `parentId` and `variantAttributes`.
//! - Review aggregates keep `ratingDistribution` summing to `totalReviews`.
//! - Availability state is a pure function of quantity and threshold.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::badge::Badge;
use crate::core::identifiers::ActorId;
use crate::core::identifiers::ChartId;
use crate::core::identifiers::ProductId;
use crate::core::identifiers::Sku;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default low-stock threshold applied when upstream omits one.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

/// Rounds a value to two decimal places (monetary and rating precision).
#[must_use]
pub fn round_to_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// SECTION: Variation Attributes
// ============================================================================

/// Variation relationship of a product document.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VariationKind {
    /// Product without variations.
    #[default]
    Standalone,
    /// Parent grouping N child variations.
    Parent,
    /// Child variation referencing a parent.
    Child,
}

/// Single variant attribute such as `color=red` or `size=XL`.
///
/// # Invariants
/// - `name` and `value` are compared case-insensitively for uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantAttribute {
    /// Attribute name (e.g. `color`).
    pub name: String,
    /// Attribute value (e.g. `red`).
    pub value: String,
    /// Optional display name for storefront rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl VariantAttribute {
    /// Creates an attribute without a display name.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            display_name: None,
        }
    }

    /// Returns the lowercased `(name, value)` pair used for uniqueness checks.
    #[must_use]
    pub fn normalized_pair(&self) -> (String, String) {
        (self.name.to_lowercase(), self.value.to_lowercase())
    }
}

/// Normalizes an attribute tuple for uniqueness comparison.
///
/// Pairs are lowercased and sorted by attribute name so that two equivalent
/// tuples compare equal regardless of declaration order or casing.
#[must_use]
pub fn normalize_attribute_tuple(attributes: &[VariantAttribute]) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> =
        attributes.iter().map(VariantAttribute::normalized_pair).collect();
    pairs.sort();
    pairs
}

/// Builds the lowercased `name -> value` index used for attribute filtering.
#[must_use]
pub fn attribute_index(attributes: &[VariantAttribute]) -> BTreeMap<String, String> {
    attributes
        .iter()
        .map(|attr| (attr.name.to_lowercase(), attr.value.clone()))
        .collect()
}

// ============================================================================
// SECTION: Availability
// ============================================================================

/// Stock availability state derived from quantity and threshold.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum StockState {
    /// Quantity exceeds the low-stock threshold.
    InStock,
    /// Quantity is positive but at or below the threshold.
    LowStock,
    /// Quantity is zero.
    #[default]
    OutOfStock,
}

impl StockState {
    /// Derives the state from available quantity and low-stock threshold.
    #[must_use]
    pub const fn derive(available_quantity: u32, low_stock_threshold: u32) -> Self {
        if available_quantity == 0 {
            Self::OutOfStock
        } else if available_quantity <= low_stock_threshold {
            Self::LowStock
        } else {
            Self::InStock
        }
    }
}

/// Denormalized availability projection maintained from inventory events.
///
/// # Invariants
/// - `state` equals [`StockState::derive`] of the other two fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityStatus {
    /// Derived availability state.
    pub state: StockState,
    /// Available quantity reported by the inventory service.
    pub available_quantity: u32,
    /// Low-stock threshold for the product.
    pub low_stock_threshold: u32,
    /// Instant of the last inventory update applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
}

impl AvailabilityStatus {
    /// Builds a consistent availability projection from an inventory sample.
    #[must_use]
    pub const fn from_quantities(
        available_quantity: u32,
        low_stock_threshold: u32,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            state: StockState::derive(available_quantity, low_stock_threshold),
            available_quantity,
            low_stock_threshold,
            last_updated: Some(updated_at),
        }
    }
}

// ============================================================================
// SECTION: Review Aggregates
// ============================================================================

/// Per-star review counts.
///
/// # Invariants
/// - Counts never underflow; deletes clamp at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RatingDistribution {
    /// Count of 1-star reviews.
    #[serde(rename = "1")]
    pub one: u32,
    /// Count of 2-star reviews.
    #[serde(rename = "2")]
    pub two: u32,
    /// Count of 3-star reviews.
    #[serde(rename = "3")]
    pub three: u32,
    /// Count of 4-star reviews.
    #[serde(rename = "4")]
    pub four: u32,
    /// Count of 5-star reviews.
    #[serde(rename = "5")]
    pub five: u32,
}

impl RatingDistribution {
    /// Returns the count slot for a rating, if the rating is in `1..=5`.
    const fn slot_mut(&mut self, rating: u8) -> Option<&mut u32> {
        match rating {
            1 => Some(&mut self.one),
            2 => Some(&mut self.two),
            3 => Some(&mut self.three),
            4 => Some(&mut self.four),
            5 => Some(&mut self.five),
            _ => None,
        }
    }

    /// Returns the count for a rating, or zero for out-of-range ratings.
    #[must_use]
    pub const fn count(&self, rating: u8) -> u32 {
        match rating {
            1 => self.one,
            2 => self.two,
            3 => self.three,
            4 => self.four,
            5 => self.five,
            _ => 0,
        }
    }

    /// Sums all per-star counts.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.one + self.two + self.three + self.four + self.five
    }
}

/// Denormalized review projection maintained from review events.
///
/// # Invariants
/// - `average_rating` is the weighted mean to two decimals, or `0.0` when
///   `total_reviews` is zero.
/// - `rating_distribution` sums to `total_reviews`.
/// - `verified_purchase_count <= total_reviews`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAggregates {
    /// Average rating to two decimal places.
    pub average_rating: f64,
    /// Total number of reviews aggregated.
    pub total_reviews: u32,
    /// Number of reviews from verified purchases.
    pub verified_purchase_count: u32,
    /// Per-star review counts.
    pub rating_distribution: RatingDistribution,
}

impl ReviewAggregates {
    /// Applies one review sample using the incremental mean formula.
    ///
    /// Ratings outside `1..=5` are ignored entirely so the distribution stays
    /// consistent with the total.
    pub fn apply_add(&mut self, rating: u8, verified_purchase: bool) {
        let Some(slot) = self.rating_distribution.slot_mut(rating) else {
            return;
        };
        *slot += 1;
        let total = f64::from(self.total_reviews);
        let new_total = self.total_reviews + 1;
        self.average_rating = round_to_2dp(
            self.average_rating.mul_add(total, f64::from(rating)) / f64::from(new_total),
        );
        self.total_reviews = new_total;
        if verified_purchase {
            self.verified_purchase_count += 1;
        }
    }

    /// Reverses one review sample; counts clamp at zero.
    ///
    /// When the last review is removed the average resets to `0.0`.
    pub fn apply_delete(&mut self, rating: u8, verified_purchase: bool) {
        if self.total_reviews == 0 {
            return;
        }
        let Some(slot) = self.rating_distribution.slot_mut(rating) else {
            return;
        };
        *slot = slot.saturating_sub(1);
        let total = f64::from(self.total_reviews);
        let new_total = self.total_reviews - 1;
        if new_total == 0 {
            self.average_rating = 0.0;
        } else {
            self.average_rating = round_to_2dp(
                self.average_rating.mul_add(total, -f64::from(rating)) / f64::from(new_total),
            );
        }
        self.total_reviews = new_total;
        if verified_purchase {
            self.verified_purchase_count = self.verified_purchase_count.saturating_sub(1);
        }
    }
}

// ============================================================================
// SECTION: Q&A Statistics
// ============================================================================

/// Denormalized Q&A projection maintained from Q&A events.
///
/// # Invariants
/// - Counts never underflow; deletes clamp at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct QaStats {
    /// Total questions asked for the product.
    pub total_questions: u32,
    /// Questions with at least one answer.
    pub answered_questions: u32,
    /// Instant of the last Q&A update applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
}

// ============================================================================
// SECTION: Sales and View Metrics
// ============================================================================

/// Units sold within one reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SalesPeriod {
    /// Units sold in the period.
    pub units: u64,
}

/// Sales metrics cached from analytics events for badge evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SalesMetrics {
    /// Sales over the trailing 7 days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last7_days: Option<SalesPeriod>,
    /// Sales over the trailing 30 days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last30_days: Option<SalesPeriod>,
    /// Category the analytics ranking refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Rank of the product within its category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_rank: Option<u32>,
    /// Instant of the last analytics update applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
}

/// Views counted within one reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ViewPeriod {
    /// Views counted in the period.
    pub views: u64,
}

/// View metrics cached from analytics events for badge evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ViewMetrics {
    /// Views over the trailing 7 days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last7_days: Option<ViewPeriod>,
    /// Views over the 7 days before the trailing window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior7_days: Option<ViewPeriod>,
    /// Week-over-week growth percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_percent: Option<f64>,
    /// Instant of the last analytics update applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
}

// ============================================================================
// SECTION: Audit History
// ============================================================================

/// Append-only audit entry recorded on mutating operations.
///
/// # Invariants
/// - Entries are never rewritten after being appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Actor that performed the change.
    pub actor: ActorId,
    /// Instant of the change.
    pub timestamp: Timestamp,
    /// Changed fields and their summary values.
    pub changes: BTreeMap<String, Value>,
}

// ============================================================================
// SECTION: Product Document
// ============================================================================

/// The central catalog entity.
///
/// # Invariants
/// - `price >= 0`.
/// - `variation_type == Child` implies `parent_id` and `variant_attributes`
///   are present; other kinds carry neither.
/// - At most one badge per badge type (enforced by the badge engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product identifier.
    pub id: ProductId,
    /// Optional SKU; unique across active products when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    /// Variation relationship of this document.
    #[serde(default)]
    pub variation_type: VariationKind,
    /// Parent product reference for child variations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ProductId>,
    /// Variant attribute tuple for child variations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_attributes: Option<Vec<VariantAttribute>>,
    /// Lowercased attribute index derived from `variant_attributes`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variant_attributes_index: BTreeMap<String, String>,
    /// Number of active child variations (parents only).
    #[serde(default)]
    pub variation_count: u32,
    /// Display name.
    pub name: String,
    /// Long-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Brand name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Price in the platform currency; non-negative.
    pub price: f64,
    /// Top-level taxonomy (e.g. Men, Women, Kids).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Second-level taxonomy (e.g. Clothing).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Third-level taxonomy (e.g. Tops).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Product type within the subcategory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    /// Image URLs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Additional search keywords.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_keywords: Vec<String>,
    /// Specification name/value pairs.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub specifications: BTreeMap<String, String>,
    /// Badges currently attached to the product.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub badges: Vec<Badge>,
    /// Denormalized review projection.
    #[serde(default)]
    pub review_aggregates: ReviewAggregates,
    /// Denormalized availability projection.
    #[serde(default)]
    pub availability_status: AvailabilityStatus,
    /// Denormalized Q&A projection.
    #[serde(default)]
    pub qa_stats: QaStats,
    /// Cached sales metrics from analytics events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_metrics: Option<SalesMetrics>,
    /// Cached view metrics from analytics events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_metrics: Option<ViewMetrics>,
    /// Assigned size chart, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_chart_id: Option<ChartId>,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Creation instant.
    pub created_at: Timestamp,
    /// Last-update instant.
    pub updated_at: Timestamp,
    /// Creating actor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<ActorId>,
    /// Last-updating actor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<ActorId>,
    /// Append-only audit trail.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
}

impl Product {
    /// Creates a minimal active standalone product.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: f64, now: Timestamp) -> Self {
        Self {
            id,
            sku: None,
            variation_type: VariationKind::Standalone,
            parent_id: None,
            variant_attributes: None,
            variant_attributes_index: BTreeMap::new(),
            variation_count: 0,
            name: name.into(),
            description: None,
            brand: None,
            price,
            department: None,
            category: None,
            subcategory: None,
            product_type: None,
            images: Vec::new(),
            tags: Vec::new(),
            search_keywords: Vec::new(),
            specifications: BTreeMap::new(),
            badges: Vec::new(),
            review_aggregates: ReviewAggregates::default(),
            availability_status: AvailabilityStatus::default(),
            qa_stats: QaStats::default(),
            sales_metrics: None,
            view_metrics: None,
            size_chart_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
            created_by: None,
            updated_by: None,
            history: Vec::new(),
        }
    }

    /// Validates document-level invariants.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("product name must not be empty".to_string());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err("product price must be a non-negative number".to_string());
        }
        match self.variation_type {
            VariationKind::Child => {
                if self.parent_id.is_none() {
                    return Err("child product requires a parent reference".to_string());
                }
                match &self.variant_attributes {
                    Some(attributes) if !attributes.is_empty() => {}
                    _ => {
                        return Err("child product requires variant attributes".to_string());
                    }
                }
            }
            VariationKind::Standalone | VariationKind::Parent => {
                if self.parent_id.is_some() {
                    return Err("only child products may reference a parent".to_string());
                }
                if self.variant_attributes.is_some() {
                    return Err("only child products may carry variant attributes".to_string());
                }
            }
        }
        Ok(())
    }

    /// Returns true when a badge of the given type is attached.
    #[must_use]
    pub fn has_badge(&self, badge_type: crate::core::badge::BadgeType) -> bool {
        self.badges.iter().any(|badge| badge.badge_type == badge_type)
    }

    /// Returns the badges that are not expired at `now`.
    #[must_use]
    pub fn active_badges(&self, now: Timestamp) -> Vec<Badge> {
        self.badges.iter().filter(|badge| !badge.is_expired(now)).cloned().collect()
    }
}

// ============================================================================
// SECTION: Product Draft
// ============================================================================

/// Caller-supplied fields for creating a standalone product.
///
/// Drafts carry no identity or audit fields; those are assigned when the
/// draft is materialized into a [`Product`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    /// Optional SKU.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    /// Display name.
    pub name: String,
    /// Long-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Brand name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Price in the platform currency.
    pub price: f64,
    /// Top-level taxonomy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Second-level taxonomy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Third-level taxonomy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Product type within the subcategory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    /// Image URLs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Additional search keywords.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_keywords: Vec<String>,
    /// Specification name/value pairs.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub specifications: BTreeMap<String, String>,
}

impl ProductDraft {
    /// Materializes the draft into an active standalone product.
    #[must_use]
    pub fn into_product(
        self,
        id: ProductId,
        created_by: Option<ActorId>,
        now: Timestamp,
    ) -> Product {
        let mut product = Product::new(id, self.name, self.price, now);
        product.sku = self.sku;
        product.description = self.description;
        product.brand = self.brand;
        product.department = self.department;
        product.category = self.category;
        product.subcategory = self.subcategory;
        product.product_type = self.product_type;
        product.images = self.images;
        product.tags = self.tags;
        product.search_keywords = self.search_keywords;
        product.specifications = self.specifications;
        product.created_by = created_by.clone();
        product.updated_by = created_by;
        product
    }
}
