//! Bottom-up reduction of a bound tree.
//!
//! Per bound node:
//!
//! ```text
//! own      = value_as_type(node)
//! merged   = own ∪ reduce(child_1) ∪ reduce(child_2) ∪ ...
//! merged is empty          -> {}              (the field is omitted)
//! node has a resolved name -> { name: merged }
//! otherwise                -> merged
//! ```

use super::binding::BoundNode;
use super::coerce::value_as_type;
use super::merge::union;
use crate::{MapError, Map, Mapping, Value, is_empty_value};

pub(crate) fn reduce(mapping: &Mapping, node: &BoundNode) -> Result<Value, MapError> {
    let mut result = value_as_type(mapping, node)?;
    for child in &node.children {
        result = union(result, reduce(mapping, child)?);
    }

    if is_empty_value(&result) {
        return Ok(Value::Object(Map::new()));
    }

    if node.name.is_empty() {
        return Ok(result);
    }

    let mut wrapped = Map::new();
    wrapped.insert(node.name.clone(), result);
    Ok(Value::Object(wrapped))
}
