// crates/catalog-core/src/runtime/conditions.rs
// ============================================================================
// Module: Badge Rule Condition Evaluation
// Description: Operator evaluation for badge rule conditions.
// Purpose: Convert product field values into boolean condition outcomes.
// Dependencies: crate::core, crate::runtime::fields, bigdecimal, time
// ============================================================================

//! ## Overview
//! Condition evaluation compares resolved product fields against expected
//! values. Numeric ordering is decimal-aware and deterministic; temporal
//! ordering accepts RFC3339 date-times and date-only strings. A missing
//! field path or a type mismatch evaluates to false rather than erroring,
//! so one malformed rule cannot poison an evaluation sweep.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde_json::Number;
use serde_json::Value;
use time::Date;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::BadgeRule;
use crate::core::ConditionOperator;
use crate::core::RuleCondition;
use crate::core::Timestamp;
use crate::runtime::fields::resolve_path;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Sentinel expected value resolved to `now - 30 days` at evaluation time.
pub const THIRTY_DAYS_AGO_SENTINEL: &str = "30_days_ago";

// ============================================================================
// SECTION: Rule Evaluation
// ============================================================================

/// Evaluates a rule's condition tree against a product document.
///
/// AND semantics require every condition to hold; OR semantics require at
/// least one. A rule with no conditions never holds.
#[must_use]
pub fn evaluate_rule(rule: &BadgeRule, document: &Value, now: Timestamp) -> bool {
    if rule.conditions.is_empty() {
        return false;
    }
    if rule.requires_all_conditions {
        rule.conditions.iter().all(|condition| evaluate_condition(condition, document, now))
    } else {
        rule.conditions.iter().any(|condition| evaluate_condition(condition, document, now))
    }
}

/// Evaluates a single condition against a product document.
#[must_use]
pub fn evaluate_condition(condition: &RuleCondition, document: &Value, now: Timestamp) -> bool {
    let Some(actual) = resolve_path(document, &condition.field_path) else {
        return false;
    };
    let expected = resolve_sentinel(&condition.value, now);
    match condition.operator {
        ConditionOperator::Eq => compare_equals(actual, &expected),
        ConditionOperator::Ne => !compare_equals(actual, &expected),
        ConditionOperator::Gt
        | ConditionOperator::Gte
        | ConditionOperator::Lt
        | ConditionOperator::Lte => compare_ordering(condition.operator, actual, &expected),
        ConditionOperator::Between => compare_between(actual, &expected),
        ConditionOperator::In => compare_in_set(actual, &expected),
        ConditionOperator::NotIn => {
            let Value::Array(_) = expected else {
                return false;
            };
            !compare_in_set(actual, &expected)
        }
    }
}

/// Resolves temporal sentinel values in the expected operand.
fn resolve_sentinel(expected: &Value, now: Timestamp) -> Value {
    if let Value::String(text) = expected
        && text == THIRTY_DAYS_AGO_SENTINEL
    {
        return Value::String(now.minus_days(30).to_rfc3339());
    }
    expected.clone()
}

// ============================================================================
// SECTION: Comparison Helpers
// ============================================================================

/// Compares values for equality, with decimal-aware numeric handling.
fn compare_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left_num), Value::Number(right_num)) => {
            matches!(decimal_cmp(left_num, right_num), Some(Ordering::Equal))
        }
        _ => left == right,
    }
}

/// Compares numeric or temporal values using an ordering operator.
fn compare_ordering(operator: ConditionOperator, left: &Value, right: &Value) -> bool {
    let ordering = value_cmp(left, right);
    let Some(ordering) = ordering else {
        return false;
    };
    match operator {
        ConditionOperator::Gt => ordering.is_gt(),
        ConditionOperator::Gte => ordering.is_ge(),
        ConditionOperator::Lt => ordering.is_lt(),
        ConditionOperator::Lte => ordering.is_le(),
        _ => false,
    }
}

/// Evaluates an inclusive two-ended range.
fn compare_between(value: &Value, expected: &Value) -> bool {
    let Value::Array(bounds) = expected else {
        return false;
    };
    let [low, high] = bounds.as_slice() else {
        return false;
    };
    let Some(low_cmp) = value_cmp(value, low) else {
        return false;
    };
    let Some(high_cmp) = value_cmp(value, high) else {
        return false;
    };
    low_cmp.is_ge() && high_cmp.is_le()
}

/// Evaluates set membership; only scalar values participate.
fn compare_in_set(value: &Value, expected: &Value) -> bool {
    let Value::Array(values) = expected else {
        return false;
    };
    match value {
        Value::Array(_) | Value::Object(_) => false,
        Value::Number(needle) => values.iter().any(|candidate| {
            candidate
                .as_number()
                .is_some_and(|num| matches!(decimal_cmp(needle, num), Some(Ordering::Equal)))
        }),
        _ => values.contains(value),
    }
}

/// Orders two values numerically or temporally.
fn value_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(left_num), Some(right_num)) = (left.as_number(), right.as_number()) {
        return decimal_cmp(left_num, right_num);
    }
    if let (Value::String(left_str), Value::String(right_str)) = (left, right) {
        return temporal_cmp(left_str, right_str);
    }
    None
}

/// Orders numeric values using decimal-aware comparison.
fn decimal_cmp(left: &Number, right: &Number) -> Option<Ordering> {
    let left = decimal_from_number(left)?;
    let right = decimal_from_number(right)?;
    Some(left.cmp(&right))
}

/// Parses a JSON number into `BigDecimal` with a stable string representation.
fn decimal_from_number(number: &Number) -> Option<BigDecimal> {
    let rendered = number.to_string();
    BigDecimal::from_str(&rendered).ok()
}

/// Compares RFC3339 date-time or date-only strings.
fn temporal_cmp(left: &str, right: &str) -> Option<Ordering> {
    if let (Ok(left), Ok(right)) =
        (OffsetDateTime::parse(left, &Rfc3339), OffsetDateTime::parse(right, &Rfc3339))
    {
        return Some(left.cmp(&right));
    }
    let left = parse_rfc3339_date(left)?;
    let right = parse_rfc3339_date(right)?;
    Some(left.cmp(&right))
}

/// Parses an RFC3339 date-only value (YYYY-MM-DD).
fn parse_rfc3339_date(value: &str) -> Option<Date> {
    let mut parts = value.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let month = time::Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}
