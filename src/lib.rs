//! Declarative mapping of markup documents into nested structures.
//!
//! A [`Mapping`] is a tree of field definitions. Each field carries a name
//! template, a [`ValueKind`] and an optional path query. Applying the mapping
//! to a document binds every field to a document context and the resulting
//! [`Binding`] reduces to a plain [`Value`].
//!
//! ```
//! use docshape::{Mapping, ValueKind, map_str};
//! use serde_json::json;
//!
//! let mut mapping = Mapping::new();
//! mapping.field("ITEMS", ValueKind::Array, Some("//item/@id"));
//!
//! let out = map_str(&mapping, r#"<list><item id="a"/><item id="b"/><item id="c"/></list>"#).unwrap();
//! assert_eq!(out, json!({ "ITEMS": ["a", "b", "c"] }));
//! ```

extern crate self as docshape;

#[macro_use]
mod macros;
mod api;
mod definition;
mod engine;
mod error;
pub mod filters;
mod query;
pub mod xml;

use std::fmt;
use std::sync::Arc;

pub use api::{MapDetails, MapOutput, MapOutputVerbose, Options, map_str, map_verbose_with, map_with};
pub use definition::{FieldDef, Mapping, NameTemplate, NodeId};
pub use engine::{ApplyMetrics, Binding, BoundNode, BoundValue, Evaluator, RunResult};
pub use error::{MapError, QueryError, XmlError};
pub use query::{QueryEngine, SELF_NAME_QUERY, Scope};
pub use serde_json::{Map, Value};

// --- Value kinds ------------------------------------------------------------

/// How a field's query result is turned into output.
///
/// `Collection` and `DynamicObject` are the only kinds that introduce
/// multiplicity: their children are evaluated once per matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Matches as an array of strings; children merge in as named keys.
    Object,
    /// Matches as an array of strings.
    Array,
    /// Matches collapsed into a single string.
    Atomic,
    /// One mapping per matched element.
    Collection,
    /// One mapping per matched element, deep-merged into a single mapping.
    DynamicObject,
}

impl ValueKind {
    /// Whether this kind evaluates its children once per matched element.
    pub fn expands(self) -> bool {
        matches!(self, ValueKind::Collection | ValueKind::DynamicObject)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Object => "object",
            ValueKind::Array => "array",
            ValueKind::Atomic => "atomic",
            ValueKind::Collection => "collection",
            ValueKind::DynamicObject => "dynamic-object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Field options ----------------------------------------------------------

/// Post-processing applied to a resolved field name.
pub type NameFilter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Post-processing applied to a non-empty coerced value.
pub type ValueFilter = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Per-field filters.
///
/// Both filters are pure functions. The value filter only runs when the
/// coerced value is non-empty.
#[derive(Clone, Default)]
pub struct FieldOptions {
    pub name_filter: Option<NameFilter>,
    pub value_filter: Option<ValueFilter>,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name_filter(mut self, filter: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.name_filter = Some(Arc::new(filter));
        self
    }

    pub fn value_filter(mut self, filter: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.value_filter = Some(Arc::new(filter));
        self
    }

    pub(crate) fn apply_name(&self, name: String) -> String {
        match &self.name_filter {
            Some(filter) => filter(&name),
            None => name,
        }
    }
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("name_filter", &self.name_filter.as_ref().map(|_| "<function>"))
            .field("value_filter", &self.value_filter.as_ref().map(|_| "<function>"))
            .finish()
    }
}

/// Whether `value` counts as "nothing" for pruning and filter purposes.
///
/// `null`, `""`, `[]` and `{}` are empty. Numbers and booleans never are.
pub(crate) fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
