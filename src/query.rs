//! Path query adapter contract.
//!
//! The mapping engine never looks inside a document. Everything it needs is
//! expressed by [`QueryEngine`]: run a query against a context node, read a
//! node's text, read a node's local name.
//!
//! A query may run against three shapes of context, modeled by [`Scope`]:
//!
//! ```text
//! Scope::Node(n)       one node (document root, or one expansion instance)
//! Scope::Nodes([..])   the ordered matches of a previous query
//! Scope::Name(s)       the result of the reserved self-name query
//! ```

use crate::QueryError;
use std::collections::HashSet;
use std::hash::Hash;

/// Reserved query meaning "the context node's own local name".
///
/// The engine answers it through [`QueryEngine::local_name`] and binds a
/// plain string instead of a node sequence.
pub const SELF_NAME_QUERY: &str = "local-name()";

/// Evaluates path queries over one document.
pub trait QueryEngine {
    /// Handle of an addressable node. Handles are compared to remove
    /// duplicates when a query runs against several context nodes.
    type Node: Clone + Eq + Hash;

    /// Matches of `query` relative to `context`, in document order.
    fn select(&self, context: &Self::Node, query: &str) -> Result<Vec<Self::Node>, QueryError>;

    /// Textual content of `node`.
    fn text(&self, node: &Self::Node) -> String;

    /// Local (unprefixed) name of `node`.
    fn local_name(&self, node: &Self::Node) -> String;
}

/// Document context a field is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope<N> {
    Node(N),
    Nodes(Vec<N>),
    Name(String),
}

impl<N: Clone + Eq + Hash> Scope<N> {
    /// Whether this scope is a node sequence (the shape that triggers expansion).
    pub fn is_sequence(&self) -> bool {
        matches!(self, Scope::Nodes(_))
    }

    /// Context nodes a query runs from.
    pub fn nodes(&self) -> &[N] {
        match self {
            Scope::Node(node) => std::slice::from_ref(node),
            Scope::Nodes(nodes) => nodes,
            Scope::Name(_) => &[],
        }
    }

    /// Run `query` from every context node and return the ordered union.
    ///
    /// `self_name_query` is the reserved query string answered with the local
    /// name of the first context node.
    pub(crate) fn select<Q>(&self, engine: &Q, query: &str, self_name_query: &str) -> Result<Scope<N>, QueryError>
    where
        Q: QueryEngine<Node = N> + ?Sized,
    {
        if query.trim() == self_name_query {
            return Ok(match self.nodes().first() {
                Some(node) => Scope::Name(engine.local_name(node)),
                None => Scope::Nodes(Vec::new()),
            });
        }

        match self {
            Scope::Node(node) => Ok(Scope::Nodes(engine.select(node, query)?)),
            Scope::Nodes(nodes) => {
                let mut seen: HashSet<N> = HashSet::new();
                let mut out = Vec::new();
                for node in nodes {
                    for found in engine.select(node, query)? {
                        if seen.insert(found.clone()) {
                            out.push(found);
                        }
                    }
                }
                Ok(Scope::Nodes(out))
            }
            Scope::Name(_) => {
                log::trace!("query '{}' against a name scope yields nothing", query);
                Ok(Scope::Nodes(Vec::new()))
            }
        }
    }

    /// Number of matches this scope represents.
    pub(crate) fn count(&self) -> usize {
        match self {
            Scope::Node(_) | Scope::Name(_) => 1,
            Scope::Nodes(nodes) => nodes.len(),
        }
    }

    /// Text of the first match, if any.
    pub(crate) fn first_text<Q>(&self, engine: &Q) -> Option<String>
    where
        Q: QueryEngine<Node = N> + ?Sized,
    {
        match self {
            Scope::Name(name) => Some(name.clone()),
            Scope::Node(node) => Some(engine.text(node)),
            Scope::Nodes(nodes) => nodes.first().map(|node| engine.text(node)),
        }
    }
}
