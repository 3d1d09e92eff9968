//! Value coercion by kind.
//!
//! ```text
//! kind            bound value           output
//! Object, Array   Matches(texts)        ["t1", "t2", ...]
//!                 Absent / Text         []
//! Atomic          Absent / Matches([])  ""
//!                 Text(t)               "t"
//!                 Matches(texts)        "t1 t2 ..."
//! Collection      Groups                [ {..group 1..}, {..group 2..} ]
//! DynamicObject   Groups                {..group 1.. deep-merged with ..group 2..}
//! ```
//!
//! The value filter runs last and only on non-empty output.

use super::binding::{BoundNode, BoundValue};
use super::merge::{deep_merge, union};
use super::reduce::reduce;
use crate::{MapError, Map, Mapping, Value, ValueKind, is_empty_value};

pub(crate) fn value_as_type(mapping: &Mapping, node: &BoundNode) -> Result<Value, MapError> {
    let def = mapping.def(node.def);
    let kind = def.kind();

    let coerced = match kind {
        ValueKind::Object | ValueKind::Array => match &node.value {
            BoundValue::Matches(texts) => Value::Array(texts.iter().cloned().map(Value::String).collect()),
            BoundValue::Absent | BoundValue::Text(_) => Value::Array(Vec::new()),
            BoundValue::Groups(_) => return Err(MapError::KindMismatch { name: node.name.clone(), kind }),
        },
        ValueKind::Atomic => match &node.value {
            BoundValue::Absent => Value::String(String::new()),
            BoundValue::Text(text) => Value::String(text.clone()),
            BoundValue::Matches(texts) => Value::String(texts.join(" ")),
            BoundValue::Groups(_) => return Err(MapError::KindMismatch { name: node.name.clone(), kind }),
        },
        ValueKind::Collection => {
            let groups = expanded_groups(node, kind)?;
            let mut items = Vec::with_capacity(groups.len());
            for group in groups {
                items.push(group_mapping(mapping, group)?);
            }
            Value::Array(items)
        }
        ValueKind::DynamicObject => {
            let mut merged = Value::Object(Map::new());
            for group in expanded_groups(node, kind)? {
                merged = deep_merge(merged, group_mapping(mapping, group)?);
            }
            merged
        }
    };

    // Empty output never reaches the filter, even when one is configured.
    match &def.options().value_filter {
        Some(filter) if !is_empty_value(&coerced) => Ok(filter(coerced)),
        _ => Ok(coerced),
    }
}

fn expanded_groups(node: &BoundNode, kind: ValueKind) -> Result<&[Vec<BoundNode>], MapError> {
    match &node.value {
        BoundValue::Groups(groups) => Ok(groups),
        _ => Err(MapError::UnexpandedCollection { name: node.name.clone(), kind }),
    }
}

/// Reduce one expansion instance into a single mapping.
fn group_mapping(mapping: &Mapping, group: &[BoundNode]) -> Result<Value, MapError> {
    let mut acc = Value::Object(Map::new());
    for child in group {
        acc = union(acc, reduce(mapping, child)?);
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldDef, FieldOptions};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn single(def: FieldDef, value: BoundValue) -> (Mapping, BoundNode) {
        let mapping = Mapping::with_root(def);
        let node = BoundNode { def: mapping.root(), name: "F".into(), value, children: Vec::new() };
        (mapping, node)
    }

    fn matches(texts: &[&str]) -> BoundValue {
        BoundValue::Matches(texts.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn arrays_keep_match_order() {
        let (m, n) = single(FieldDef::new("F", ValueKind::Array, Some("x")), matches(&["b", "a", "c"]));
        assert_eq!(value_as_type(&m, &n).unwrap(), json!(["b", "a", "c"]));

        let (m, n) = single(FieldDef::new("F", ValueKind::Object, Some("x")), BoundValue::Absent);
        assert_eq!(value_as_type(&m, &n).unwrap(), json!([]));
    }

    #[test]
    fn atomic_collapses_matches() {
        let (m, n) = single(FieldDef::new("F", ValueKind::Atomic, Some("x")), matches(&["a", "b"]));
        assert_eq!(value_as_type(&m, &n).unwrap(), json!("a b"));

        let (m, n) = single(FieldDef::new("F", ValueKind::Atomic, Some("x")), matches(&[]));
        assert_eq!(value_as_type(&m, &n).unwrap(), json!(""));

        let (m, n) = single(FieldDef::new("F", ValueKind::Atomic, None), BoundValue::Text("raw".into()));
        assert_eq!(value_as_type(&m, &n).unwrap(), json!("raw"));
    }

    #[test]
    fn value_filter_skips_empty_results() {
        let opts = FieldOptions::new().value_filter(|_| json!("default"));
        let def = FieldDef::new("F", ValueKind::Atomic, Some("x")).with_options(opts);

        let (m, n) = single(def.clone(), matches(&[]));
        assert_eq!(value_as_type(&m, &n).unwrap(), json!(""));

        let (m, n) = single(def, matches(&["x"]));
        assert_eq!(value_as_type(&m, &n).unwrap(), json!("default"));
    }

    #[test]
    fn unexpanded_collection_is_rejected() {
        let (m, n) = single(FieldDef::new("ROWS", ValueKind::Collection, None), BoundValue::Absent);
        let err = value_as_type(&m, &n).unwrap_err();
        assert!(matches!(err, MapError::UnexpandedCollection { kind: ValueKind::Collection, .. }));
    }

    #[test]
    fn groups_on_plain_kind_are_rejected() {
        let (m, n) = single(FieldDef::new("F", ValueKind::Atomic, None), BoundValue::Groups(vec![]));
        assert!(matches!(value_as_type(&m, &n).unwrap_err(), MapError::KindMismatch { .. }));
    }
}
