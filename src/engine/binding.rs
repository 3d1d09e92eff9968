//! The bound tree.
//!
//! A `BoundNode` is one field instance after evaluation: which definition it
//! came from, the name it resolved to and the raw value it bound. Fields that
//! expand (`Collection`, `DynamicObject`) keep their per-element children in
//! [`BoundValue::Groups`] and have no direct children.
//!
//! ```text
//! ROWS (Collection, query "//row", 2 matches)
//!   value: Groups [
//!     [ ID(value "1"), NAME(value "a") ],   <- instance for row #1
//!     [ ID(value "2"), NAME(value "b") ],   <- instance for row #2
//!   ]
//!   children: []
//! ```

use super::reduce::reduce;
use crate::{MapError, Mapping, NodeId, Value};

/// Raw value bound to a field instance, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// Nothing bound (inherited single node for sequence kinds, or an
    /// expanding kind outside of a node sequence).
    Absent,
    /// One non-sequence value: the text of an inherited node or a local name.
    Text(String),
    /// Texts of an ordered query result.
    Matches(Vec<String>),
    /// One evaluated child group per matched element.
    Groups(Vec<Vec<BoundNode>>),
}

/// One evaluated field instance.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundNode {
    pub(crate) def: NodeId,
    pub(crate) name: String,
    pub(crate) value: BoundValue,
    pub(crate) children: Vec<BoundNode>,
}

impl BoundNode {
    /// Definition this instance was stamped from.
    pub fn def(&self) -> NodeId {
        self.def
    }

    /// Resolved name (placeholder substituted, name filter applied).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &BoundValue {
        &self.value
    }

    /// Directly bound children. Empty for expanded fields.
    pub fn children(&self) -> &[BoundNode] {
        &self.children
    }

    /// Per-element child groups of an expanded field.
    pub fn groups(&self) -> &[Vec<BoundNode>] {
        match &self.value {
            BoundValue::Groups(groups) => groups,
            _ => &[],
        }
    }

    /// First direct child with the given resolved name.
    pub fn child(&self, name: &str) -> Option<&BoundNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// A mapping bound to one document.
///
/// Produced by [`Mapping::apply`]. Reduction only reads the bound tree, so
/// [`Binding::result`] may be called repeatedly and always yields the same
/// value.
#[derive(Debug, Clone)]
pub struct Binding<'m> {
    pub(crate) mapping: &'m Mapping,
    pub(crate) root: BoundNode,
}

impl<'m> Binding<'m> {
    pub fn mapping(&self) -> &'m Mapping {
        self.mapping
    }

    pub fn root(&self) -> &BoundNode {
        &self.root
    }

    /// Reduce the bound tree into a nested value.
    pub fn result(&self) -> Result<Value, MapError> {
        reduce(self.mapping, &self.root)
    }
}
