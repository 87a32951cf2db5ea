// crates/catalog-core/src/core/badge.rs
// ============================================================================
// Module: Product Catalog Badge Model
// Description: Badge types, badge instances, and declarative badge rules.
// Purpose: Define badge identity, display priority, and rule condition shapes.
// Dependencies: crate::core::{identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Badges are tags attached to products either manually by an admin or
//! automatically by the rule engine. A badge is automated iff `assignedBy`
//! is absent; automated badges may be removed when their rule no longer
//! holds, manual badges never are. Each badge type carries a fixed display
//! priority used to select the single storefront display badge.
//! Invariants:
//! - A product holds at most one badge per type (engine-enforced).
//! - Priorities are total and stable: new < lowStock < sale < trending <
//!   bestSeller < featured.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::core::identifiers::ActorId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Badge Types
// ============================================================================

/// Closed set of badge types supported by the catalog.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BadgeType {
    /// Recently created product.
    New,
    /// Discounted product.
    Sale,
    /// Product with accelerating views.
    Trending,
    /// Editorially featured product.
    Featured,
    /// Top-selling product.
    BestSeller,
    /// Product with little stock remaining.
    LowStock,
}

impl BadgeType {
    /// All badge types in declaration order.
    pub const ALL: [Self; 6] =
        [Self::New, Self::Sale, Self::Trending, Self::Featured, Self::BestSeller, Self::LowStock];

    /// Returns the display priority (higher wins the display slot).
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::New => 1,
            Self::LowStock => 2,
            Self::Sale => 3,
            Self::Trending => 4,
            Self::BestSeller => 5,
            Self::Featured => 6,
        }
    }

    /// Returns the stable wire label for this badge type.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Sale => "sale",
            Self::Trending => "trending",
            Self::Featured => "featured",
            Self::BestSeller => "bestSeller",
            Self::LowStock => "lowStock",
        }
    }
}

impl fmt::Display for BadgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Badge Instances
// ============================================================================

/// Badge attached to a product.
///
/// # Invariants
/// - Automated badges carry no `assigned_by`.
/// - An expired badge is excluded from the active-badge projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    /// Badge type.
    #[serde(rename = "type")]
    pub badge_type: BadgeType,
    /// Instant the badge was attached.
    pub assigned_at: Timestamp,
    /// Actor that attached the badge; absent for automated assignments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_by: Option<ActorId>,
    /// Optional expiry instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    /// Additional badge-specific metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl Badge {
    /// Returns true when the badge was assigned by the rule engine.
    #[must_use]
    pub const fn is_automated(&self) -> bool {
        self.assigned_by.is_none()
    }

    /// Returns true when the badge has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

// ============================================================================
// SECTION: Rule Conditions
// ============================================================================

/// Comparison operator for a rule condition.
///
/// # Invariants
/// - Wire labels match the platform rule contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOperator {
    /// Greater than or equal.
    #[serde(rename = ">=")]
    Gte,
    /// Less than or equal.
    #[serde(rename = "<=")]
    Lte,
    /// Equal.
    #[serde(rename = "==")]
    Eq,
    /// Greater than.
    #[serde(rename = ">")]
    Gt,
    /// Less than.
    #[serde(rename = "<")]
    Lt,
    /// Not equal.
    #[serde(rename = "!=")]
    Ne,
    /// Inclusive two-ended range; the expected value is a two-element array.
    #[serde(rename = "between")]
    Between,
    /// Set membership; the expected value is an array.
    #[serde(rename = "in")]
    In,
    /// Set exclusion; the expected value is an array.
    #[serde(rename = "not_in")]
    NotIn,
}

/// Single condition over a product field.
///
/// # Invariants
/// - `field_path` is dot-notation into the product document; a missing path
///   evaluates the condition to false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    /// Dot-notation path into the product document.
    pub field_path: String,
    /// Comparison operator.
    pub operator: ConditionOperator,
    /// Expected value; the sentinel string `"30_days_ago"` resolves to
    /// `now - 30 days` at evaluation time.
    pub value: Value,
}

impl RuleCondition {
    /// Creates a condition.
    #[must_use]
    pub fn new(field_path: impl Into<String>, operator: ConditionOperator, value: Value) -> Self {
        Self {
            field_path: field_path.into(),
            operator,
            value,
        }
    }
}

// ============================================================================
// SECTION: Badge Rules
// ============================================================================

/// Declarative rule that assigns a badge when its conditions hold.
///
/// # Invariants
/// - `conditions` is non-empty for active rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeRule {
    /// Badge type assigned when the rule fires.
    pub badge_type: BadgeType,
    /// Human-readable rule name, recorded in badge metadata.
    pub name: String,
    /// Optional rule description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Conditions combined by `requires_all_conditions`.
    pub conditions: Vec<RuleCondition>,
    /// AND semantics when true, OR semantics when false.
    pub requires_all_conditions: bool,
    /// Inactive rules are skipped by evaluation.
    pub is_active: bool,
    /// Remove the automated badge when the rule no longer holds.
    pub auto_remove_when_invalid: bool,
}

/// Returns the built-in rule set restored from the production service.
///
/// Callers may evaluate any rule set they like; these defaults are a
/// constructor convenience for the badge engine.
#[must_use]
pub fn default_badge_rules() -> Vec<BadgeRule> {
    vec![
        BadgeRule {
            badge_type: BadgeType::New,
            name: "New Product Rule".to_string(),
            description: Some("Products created within last 30 days".to_string()),
            conditions: vec![RuleCondition::new(
                "createdAt",
                ConditionOperator::Gte,
                json!("30_days_ago"),
            )],
            requires_all_conditions: true,
            is_active: true,
            auto_remove_when_invalid: true,
        },
        BadgeRule {
            badge_type: BadgeType::BestSeller,
            name: "Best Seller Rule".to_string(),
            description: Some("Products with 1000+ sales in last 30 days".to_string()),
            conditions: vec![RuleCondition::new(
                "salesMetrics.last30Days.units",
                ConditionOperator::Gte,
                json!(1000),
            )],
            requires_all_conditions: true,
            is_active: true,
            auto_remove_when_invalid: true,
        },
        BadgeRule {
            badge_type: BadgeType::Trending,
            name: "Trending Product Rule".to_string(),
            description: Some("Products with 50+ sales and 500+ views in last 7 days".to_string()),
            conditions: vec![
                RuleCondition::new(
                    "salesMetrics.last7Days.units",
                    ConditionOperator::Gte,
                    json!(50),
                ),
                RuleCondition::new(
                    "viewMetrics.last7Days.views",
                    ConditionOperator::Gte,
                    json!(500),
                ),
            ],
            requires_all_conditions: true,
            is_active: true,
            auto_remove_when_invalid: true,
        },
        BadgeRule {
            badge_type: BadgeType::LowStock,
            name: "Low Stock Rule".to_string(),
            description: Some("Products with less than 10 units in stock".to_string()),
            conditions: vec![
                RuleCondition::new(
                    "availabilityStatus.availableQuantity",
                    ConditionOperator::Lte,
                    json!(10),
                ),
                RuleCondition::new(
                    "availabilityStatus.availableQuantity",
                    ConditionOperator::Gt,
                    json!(0),
                ),
            ],
            requires_all_conditions: true,
            is_active: true,
            auto_remove_when_invalid: true,
        },
    ]
}
