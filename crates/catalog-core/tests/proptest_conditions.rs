// crates/catalog-core/tests/proptest_conditions.rs
// ============================================================================
// Module: Condition Property-Based Tests
// Description: Property tests for condition evaluation stability.
// Purpose: Detect panics and operator inconsistencies across wide inputs.
// ============================================================================

//! Property-based tests for condition evaluator invariants.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions and helpers are permitted."
)]

use catalog_core::ConditionOperator;
use catalog_core::RuleCondition;
use catalog_core::Timestamp;
use catalog_core::VariantAttribute;
use catalog_core::normalize_attribute_tuple;
use catalog_core::runtime::evaluate_condition;
use proptest::prelude::*;
use serde_json::Value;
use serde_json::json;

fn eval(operator: ConditionOperator, expected: &Value, doc: &Value) -> bool {
    evaluate_condition(
        &RuleCondition::new("field", operator, expected.clone()),
        doc,
        Timestamp::now(),
    )
}

fn json_value_strategy(max_depth: u32) -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|v| Value::Number(v.into())),
        any::<f64>()
            .prop_filter("finite", |v| v.is_finite())
            .prop_map(|v| { serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number) }),
        ".*".prop_map(Value::String),
    ];

    leaf.prop_recursive(max_depth, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0 .. 4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0 .. 4).prop_map(|map| {
                let mut object = serde_json::Map::new();
                for (key, value) in map {
                    object.insert(key, value);
                }
                Value::Object(object)
            }),
        ]
    })
}

proptest! {
    #[test]
    fn ordering_is_consistent_with_integer_comparison(a in any::<i64>(), b in any::<i64>()) {
        let doc = json!({ "field": a });
        let expected = json!(b);
        prop_assert_eq!(eval(ConditionOperator::Gte, &expected, &doc), a >= b);
        prop_assert_eq!(eval(ConditionOperator::Lte, &expected, &doc), a <= b);
        prop_assert_eq!(eval(ConditionOperator::Gt, &expected, &doc), a > b);
        prop_assert_eq!(eval(ConditionOperator::Lt, &expected, &doc), a < b);
        prop_assert_eq!(eval(ConditionOperator::Eq, &expected, &doc), a == b);
        prop_assert_eq!(eval(ConditionOperator::Ne, &expected, &doc), a != b);
    }

    #[test]
    fn between_matches_its_ordering_expansion(v in any::<i64>(), low in any::<i64>(), high in any::<i64>()) {
        let doc = json!({ "field": v });
        let expected = json!([low, high]);
        prop_assert_eq!(eval(ConditionOperator::Between, &expected, &doc), v >= low && v <= high);
    }

    #[test]
    fn evaluation_never_panics_on_random_json(
        expected in json_value_strategy(2),
        field in json_value_strategy(2),
    ) {
        let doc = json!({ "field": field });
        for operator in [
            ConditionOperator::Gte,
            ConditionOperator::Lte,
            ConditionOperator::Eq,
            ConditionOperator::Gt,
            ConditionOperator::Lt,
            ConditionOperator::Ne,
            ConditionOperator::Between,
            ConditionOperator::In,
            ConditionOperator::NotIn,
        ] {
            let _ = eval(operator, &expected, &doc);
        }
    }

    #[test]
    fn tuple_normalization_ignores_declaration_order(
        pairs in prop::collection::vec(("[a-zA-Z]{1,6}", "[a-zA-Z0-9]{1,6}"), 1 .. 6)
    ) {
        let forward: Vec<VariantAttribute> = pairs
            .iter()
            .map(|(name, value)| VariantAttribute::new(name.clone(), value.clone()))
            .collect();
        let mut reversed = forward.clone();
        reversed.reverse();
        prop_assert_eq!(normalize_attribute_tuple(&forward), normalize_attribute_tuple(&reversed));
    }
}
