// crates/catalog-core/tests/conditions_unit.rs
// ============================================================================
// Module: Condition Evaluation Unit Tests
// Description: Operator semantics for badge rule conditions.
// Purpose: Validate ordering, range, set, and sentinel handling.
// ============================================================================

//! ## Overview
//! Validates the condition evaluator: mathematical operator semantics,
//! inclusive `between`, set membership, the `30_days_ago` sentinel, and the
//! missing-path-is-false rule.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions are permitted."
)]

use catalog_core::BadgeRule;
use catalog_core::BadgeType;
use catalog_core::ConditionOperator;
use catalog_core::RuleCondition;
use catalog_core::Timestamp;
use catalog_core::runtime::evaluate_condition;
use catalog_core::runtime::evaluate_rule;
use serde_json::json;

/// Shorthand for evaluating one condition against a document.
fn eval(path: &str, operator: ConditionOperator, expected: serde_json::Value, doc: &serde_json::Value) -> bool {
    evaluate_condition(&RuleCondition::new(path, operator, expected), doc, Timestamp::now())
}

#[test]
fn ordering_operators_are_mathematical() {
    let doc = json!({ "price": 10.5 });
    assert!(eval("price", ConditionOperator::Gte, json!(10.5), &doc));
    assert!(eval("price", ConditionOperator::Lte, json!(10.5), &doc));
    assert!(eval("price", ConditionOperator::Gt, json!(10), &doc));
    assert!(eval("price", ConditionOperator::Lt, json!(11), &doc));
    assert!(!eval("price", ConditionOperator::Gt, json!(10.5), &doc));
}

#[test]
fn equality_is_decimal_aware() {
    let doc = json!({ "units": 100 });
    assert!(eval("units", ConditionOperator::Eq, json!(100.0), &doc));
    assert!(!eval("units", ConditionOperator::Ne, json!(100.0), &doc));
    assert!(eval("units", ConditionOperator::Ne, json!(99), &doc));
}

#[test]
fn between_is_inclusive_on_both_ends() {
    let doc = json!({ "rank": 50 });
    assert!(eval("rank", ConditionOperator::Between, json!([50, 100]), &doc));
    assert!(eval("rank", ConditionOperator::Between, json!([1, 50]), &doc));
    assert!(!eval("rank", ConditionOperator::Between, json!([51, 100]), &doc));
    assert!(!eval("rank", ConditionOperator::Between, json!([50]), &doc));
    assert!(!eval("rank", ConditionOperator::Between, json!(50), &doc));
}

#[test]
fn set_membership_handles_in_and_not_in() {
    let doc = json!({ "category": "Clothing" });
    assert!(eval("category", ConditionOperator::In, json!(["Clothing", "Shoes"]), &doc));
    assert!(!eval("category", ConditionOperator::In, json!(["Shoes"]), &doc));
    assert!(eval("category", ConditionOperator::NotIn, json!(["Shoes"]), &doc));
    assert!(!eval("category", ConditionOperator::NotIn, json!(["Clothing"]), &doc));
    assert!(!eval("category", ConditionOperator::NotIn, json!("Clothing"), &doc));
}

#[test]
fn numeric_set_membership_is_decimal_aware() {
    let doc = json!({ "rank": 3 });
    assert!(eval("rank", ConditionOperator::In, json!([1.0, 2.0, 3.0]), &doc));
}

#[test]
fn a_missing_field_path_is_false() {
    let doc = json!({ "salesMetrics": { "last30Days": { "units": 10 } } });
    assert!(!eval("salesMetrics.last7Days.units", ConditionOperator::Gte, json!(0), &doc));
    assert!(!eval("viewMetrics.last7Days.views", ConditionOperator::Gte, json!(0), &doc));
    assert!(eval("salesMetrics.last30Days.units", ConditionOperator::Gte, json!(10), &doc));
}

#[test]
fn the_thirty_days_sentinel_resolves_against_now() {
    let now = Timestamp::now();
    let fresh = json!({ "createdAt": now.minus_days(5).to_rfc3339() });
    let stale = json!({ "createdAt": now.minus_days(45).to_rfc3339() });
    let condition =
        RuleCondition::new("createdAt", ConditionOperator::Gte, json!("30_days_ago"));
    assert!(evaluate_condition(&condition, &fresh, now));
    assert!(!evaluate_condition(&condition, &stale, now));
}

#[test]
fn type_mismatches_are_false_rather_than_errors() {
    let doc = json!({ "price": "not-a-number" });
    assert!(!eval("price", ConditionOperator::Gte, json!(10), &doc));
    assert!(!eval("price", ConditionOperator::Between, json!([1, 2]), &doc));
}

#[test]
fn and_rules_require_every_condition_and_or_rules_any() {
    let doc = json!({ "a": 5, "b": 1 });
    let mut rule = BadgeRule {
        badge_type: BadgeType::Featured,
        name: "combo".to_string(),
        description: None,
        conditions: vec![
            RuleCondition::new("a", ConditionOperator::Gte, json!(5)),
            RuleCondition::new("b", ConditionOperator::Gte, json!(5)),
        ],
        requires_all_conditions: true,
        is_active: true,
        auto_remove_when_invalid: true,
    };
    assert!(!evaluate_rule(&rule, &doc, Timestamp::now()));
    rule.requires_all_conditions = false;
    assert!(evaluate_rule(&rule, &doc, Timestamp::now()));
    rule.conditions.clear();
    assert!(!evaluate_rule(&rule, &doc, Timestamp::now()));
}
