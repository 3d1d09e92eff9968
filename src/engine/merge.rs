//! Combining reduced values.
//!
//! Two merge flavors exist:
//!
//! - `union`: sibling fields contribute keys side by side. A later sibling
//!   with the same key replaces the earlier value in place.
//! - `deep_merge`: expansion instances of a `DynamicObject` accumulate. A
//!   colliding key keeps *both* values:
//!
//! ```text
//! {A: "x"}          + {A: "y"}          = {A: ["x", "y"]}
//! {A: ["x"]}        + {A: "y"}          = {A: ["x", "y"]}
//! {A: {B: "1"}}     + {A: {C: "2"}}     = {A: {B: "1", C: "2"}}
//! {A: {B: "1"}}     + {A: {B: "2"}}     = {A: {B: ["1", "2"]}}
//! ```

use crate::{Map, Value, is_empty_value};

/// Merge `contribution` into `acc` as a sibling contribution.
///
/// When `acc` is a non-empty array or scalar and the contribution is a
/// mapping, `acc` is first turned into a mapping keyed `"0"`, `"1"`, ...
pub(crate) fn union(acc: Value, contribution: Value) -> Value {
    if is_empty_value(&contribution) {
        return acc;
    }
    if is_empty_value(&acc) {
        return contribution;
    }

    match (acc, contribution) {
        (Value::Object(mut left), Value::Object(right)) => {
            left.extend(right);
            Value::Object(left)
        }
        (left, Value::Object(right)) => {
            let mut map = positional(left);
            map.extend(right);
            Value::Object(map)
        }
        (Value::Object(mut left), other) => {
            let key = left.len().to_string();
            left.insert(key, other);
            Value::Object(left)
        }
        (Value::Array(mut items), other) => {
            items.push(other);
            Value::Array(items)
        }
        (left, other) => Value::Array(vec![left, other]),
    }
}

/// Accumulate `incoming` into `acc`, combining colliding keys.
pub(crate) fn deep_merge(acc: Value, incoming: Value) -> Value {
    if is_empty_value(&incoming) {
        return acc;
    }
    if is_empty_value(&acc) {
        return incoming;
    }

    match (acc, incoming) {
        (Value::Object(mut left), Value::Object(right)) => {
            for (key, value) in right {
                match left.get_mut(&key) {
                    Some(slot) => {
                        let existing = std::mem::take(slot);
                        *slot = deep_merge(existing, value);
                    }
                    None => {
                        left.insert(key, value);
                    }
                }
            }
            Value::Object(left)
        }
        (Value::Array(mut left), Value::Array(right)) => {
            left.extend(right);
            Value::Array(left)
        }
        (Value::Array(mut left), other) => {
            left.push(other);
            Value::Array(left)
        }
        (other, Value::Array(right)) => {
            let mut items = Vec::with_capacity(right.len() + 1);
            items.push(other);
            items.extend(right);
            Value::Array(items)
        }
        (left, right) => Value::Array(vec![left, right]),
    }
}

fn positional(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Array(items) => items.into_iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect(),
        other => {
            let mut map = Map::new();
            map.insert("0".to_string(), other);
            map
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn union_of_siblings_keeps_insertion_order() {
        let out = union(json!({"B": "1"}), json!({"A": "2"}));
        assert_eq!(out, json!({"B": "1", "A": "2"}));
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["B", "A"]);
    }

    #[test]
    fn union_skips_empty_sides() {
        assert_eq!(union(json!([]), json!({"A": "1"})), json!({"A": "1"}));
        assert_eq!(union(json!({"A": "1"}), json!({})), json!({"A": "1"}));
        assert_eq!(union(json!(""), json!("")), json!(""));
    }

    #[test]
    fn union_turns_own_sequence_into_positional_keys() {
        let out = union(json!(["text"]), json!({"TITLE": "t"}));
        assert_eq!(out, json!({"0": "text", "TITLE": "t"}));
    }

    #[test]
    fn union_of_scalars_collects_them() {
        assert_eq!(union(json!("a"), json!("b")), json!(["a", "b"]));
        assert_eq!(union(json!(["a"]), json!("b")), json!(["a", "b"]));
    }

    #[test]
    fn deep_merge_accumulates_colliding_scalars() {
        let acc = deep_merge(json!({"A": "x"}), json!({"A": "y"}));
        let acc = deep_merge(acc, json!({"A": "z", "B": "w"}));
        assert_eq!(acc, json!({"A": ["x", "y", "z"], "B": "w"}));
    }

    #[test]
    fn deep_merge_recurses_into_mappings() {
        let out = deep_merge(json!({"A": {"B": "1"}}), json!({"A": {"C": "2", "B": "3"}}));
        assert_eq!(out, json!({"A": {"B": ["1", "3"], "C": "2"}}));
    }

    #[test]
    fn deep_merge_concatenates_arrays() {
        assert_eq!(deep_merge(json!({"A": ["1"]}), json!({"A": ["2", "3"]})), json!({"A": ["1", "2", "3"]}));
        assert_eq!(deep_merge(json!({"A": "0"}), json!({"A": ["1"]})), json!({"A": ["0", "1"]}));
    }
}
