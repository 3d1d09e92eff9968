//! Ready-made name and value filters for [`FieldOptions`](crate::FieldOptions).
//!
//! Name filters have the shape `fn(&str) -> String`, value filters
//! `fn(Value) -> Value`; both plug straight into the option builders:
//!
//! ```
//! use docshape::{FieldOptions, filters};
//!
//! let options = FieldOptions::new().name_filter(filters::strip_index_suffix).value_filter(filters::trim_text);
//! # let _ = options;
//! ```

use crate::Value;

/// Drop a trailing `_<digits>` index: `"AMOUNT_2"` becomes `"AMOUNT"`.
///
/// Handy with dynamic objects, where indexed names then deep-merge into one
/// key holding all values.
pub fn strip_index_suffix(name: &str) -> String {
    regex!(r"_\d+$").replace(name, "").into_owned()
}

/// `"Order Line-Id"` -> `"order_line_id"`, `"orderLineId"` -> `"order_line_id"`.
pub fn snake_case(name: &str) -> String {
    let spaced = regex!(r"([a-z0-9])([A-Z])").replace_all(name, "${1}_${2}");
    let joined = regex!(r"[^A-Za-z0-9]+").replace_all(&spaced, "_");
    joined.trim_matches('_').to_lowercase()
}

/// Trim surrounding whitespace from every string, recursively.
pub fn trim_text(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        Value::Array(items) => Value::Array(items.into_iter().map(trim_text).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, trim_text(v))).collect()),
        other => other,
    }
}

/// Keep only the first element of an array; other values pass through.
pub fn first(value: Value) -> Value {
    match value {
        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
        other => other,
    }
}
