//! Field definitions and the fluent builder.
//!
//! A [`Mapping`] owns every definition in a flat arena. Parent, root and
//! children are stored as [`NodeId`] handles, so the tree has a single owner
//! and no reference cycles:
//!
//! ```text
//! slots: [ root | HEADER | TITLE | ROWS | CELL ]
//!           0      1        2       3      4
//!
//! root ──┬─ HEADER (1) ── TITLE (2)
//!        └─ ROWS   (3) ── CELL  (4)
//! ```
//!
//! The builder keeps a cursor: [`Mapping::field`] appends under the cursor and
//! descends into the new field, [`Mapping::end`] climbs back to the parent.
//!
//! Definitions are never mutated by evaluation. Per-document state lives in
//! the bound tree produced by [`Mapping::apply`].

use crate::{FieldOptions, ValueKind};

/// Handle of a definition inside its [`Mapping`].
pub type NodeId = usize;

const ROOT: NodeId = 0;

// --- Name templates -----------------------------------------------------------

/// A field name with at most one `{...}` placeholder.
///
/// The placeholder holds either a query (`{@key}`), whose first match's text
/// is substituted, or `count(query)` (`{count(row)}`), whose number of matches
/// is substituted. Only the first brace pair is a placeholder; anything after
/// it is kept literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    raw: String,
    placeholder: Option<Placeholder>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Placeholder {
    /// Byte range of the whole `{...}` region in the raw template.
    pub start: usize,
    pub end: usize,
    pub expr: PlaceholderExpr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PlaceholderExpr {
    Count(String),
    Text(String),
}

impl NameTemplate {
    pub fn parse(raw: &str) -> Self {
        let placeholder = regex!(r"\{([^{}]+)\}").captures(raw).and_then(|caps| {
            let region = caps.get(0)?;
            let inner = caps.get(1)?.as_str().trim();
            if inner.is_empty() {
                return None;
            }
            let expr = match regex!(r"^count\(\s*(.+?)\s*\)$").captures(inner) {
                Some(count) => PlaceholderExpr::Count(count[1].to_string()),
                None => PlaceholderExpr::Text(inner.to_string()),
            };
            Some(Placeholder { start: region.start(), end: region.end(), expr })
        });

        NameTemplate { raw: raw.to_string(), placeholder }
    }

    /// The template exactly as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_templated(&self) -> bool {
        self.placeholder.is_some()
    }

    pub(crate) fn placeholder(&self) -> Option<&Placeholder> {
        self.placeholder.as_ref()
    }

    /// Replace the placeholder region with `value`. Plain names come back unchanged.
    pub(crate) fn substitute(&self, value: &str) -> String {
        match &self.placeholder {
            Some(p) => format!("{}{}{}", &self.raw[..p.start], value, &self.raw[p.end..]),
            None => self.raw.clone(),
        }
    }
}

// --- Field definitions --------------------------------------------------------

/// One entry of the static mapping shape.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub(crate) name: NameTemplate,
    pub(crate) kind: ValueKind,
    pub(crate) query: Option<String>,
    pub(crate) options: FieldOptions,
}

impl FieldDef {
    /// A field without filters. `query: None` inherits the parent's context.
    pub fn new(name: &str, kind: ValueKind, query: Option<&str>) -> Self {
        FieldDef { name: NameTemplate::parse(name), kind, query: query.map(str::to_string), options: FieldOptions::default() }
    }

    pub fn with_options(mut self, options: FieldOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &NameTemplate {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn options(&self) -> &FieldOptions {
        &self.options
    }
}

#[derive(Debug, Clone)]
struct Slot {
    def: FieldDef,
    root: NodeId,
    parent: NodeId,
    children: Vec<NodeId>,
}

// --- Mapping ------------------------------------------------------------------

/// A rooted tree of [`FieldDef`]s plus a builder cursor.
///
/// # Example
/// ```
/// use docshape::{Mapping, ValueKind};
///
/// let mut mapping = Mapping::new();
/// mapping
///     .field("HEADER", ValueKind::Object, None)
///         .field("TITLE", ValueKind::Atomic, Some("/doc/title"))
///         .end()
///     .end()
///     .field("ROWS", ValueKind::Collection, Some("//row"))
///         .field("ID", ValueKind::Atomic, Some("@id"));
///
/// assert_eq!(mapping.children(mapping.root()).len(), 2);
/// ```
///
/// Ids handed out by one mapping are only meaningful for that mapping;
/// accessors panic on ids that are out of range, [`Mapping::focus`] rejects them.
#[derive(Debug, Clone)]
pub struct Mapping {
    slots: Vec<Slot>,
    cursor: NodeId,
}

impl Default for Mapping {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapping {
    /// An empty mapping whose root is an unnamed object field.
    pub fn new() -> Self {
        Self::with_root(FieldDef::new("", ValueKind::Object, None))
    }

    /// A one-node tree rooted at `def`. The root is its own root and parent.
    pub fn with_root(def: FieldDef) -> Self {
        Mapping { slots: vec![Slot { def, root: ROOT, parent: ROOT, children: Vec::new() }], cursor: ROOT }
    }

    /// Append a field under the cursor and move the cursor onto it.
    pub fn field(&mut self, name: &str, kind: ValueKind, query: Option<&str>) -> &mut Self {
        self.field_with(name, kind, query, FieldOptions::default())
    }

    /// Like [`Mapping::field`] with name/value filters.
    pub fn field_with(&mut self, name: &str, kind: ValueKind, query: Option<&str>, options: FieldOptions) -> &mut Self {
        let id = self.push(self.cursor, FieldDef::new(name, kind, query).with_options(options));
        self.cursor = id;
        self
    }

    /// Move the cursor to its parent. At the root this is a no-op.
    pub fn end(&mut self) -> &mut Self {
        self.cursor = self.slots[self.cursor].parent;
        self
    }

    /// Append `def` under the cursor without moving the cursor.
    pub fn add_child(&mut self, def: FieldDef) -> NodeId {
        self.push(self.cursor, def)
    }

    /// Deep-copy `other` (its root and every descendant) under the cursor.
    ///
    /// Returns the id of the copied root. The cursor does not move.
    pub fn add_subtree(&mut self, other: &Mapping) -> NodeId {
        self.copy_from(other, other.root(), self.cursor)
    }

    /// First child of the cursor whose name template equals `name`.
    pub fn get_child(&self, name: &str) -> Option<NodeId> {
        self.child_named(self.cursor, name)
    }

    /// First child of `parent` whose name template equals `name`.
    pub fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.slots[parent].children.iter().copied().find(|&id| self.slots[id].def.name.as_str() == name)
    }

    /// Move the cursor to `id`. Returns `None`, leaving the cursor where it
    /// was, when `id` does not belong to this mapping.
    pub fn focus(&mut self, id: NodeId) -> Option<&mut Self> {
        if id >= self.slots.len() {
            return None;
        }
        self.cursor = id;
        Some(self)
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn cursor(&self) -> NodeId {
        self.cursor
    }

    pub fn parent(&self, id: NodeId) -> NodeId {
        self.slots[id].parent
    }

    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.slots[id].root
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slots[id].children
    }

    pub fn def(&self, id: NodeId) -> &FieldDef {
        &self.slots[id].def
    }

    /// Number of definitions, root included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when nothing has been added under the root.
    pub fn is_empty(&self) -> bool {
        self.slots[ROOT].children.is_empty()
    }

    fn push(&mut self, parent: NodeId, def: FieldDef) -> NodeId {
        let id = self.slots.len();
        let root = self.slots[parent].root;
        self.slots.push(Slot { def, root, parent, children: Vec::new() });
        self.slots[parent].children.push(id);
        id
    }

    fn copy_from(&mut self, other: &Mapping, source: NodeId, parent: NodeId) -> NodeId {
        let id = self.push(parent, other.slots[source].def.clone());
        for &child in &other.slots[source].children {
            self.copy_from(other, child, id);
        }
        id
    }
}
