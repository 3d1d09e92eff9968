//! Context-passing evaluation of a mapping against one document.
//!
//! Per field, given the inbound context:
//!
//! ```text
//! 1. name   <- template resolved against the inbound context
//! 2. scope  <- query evaluated against the inbound context
//!              (no query: the inbound context itself)
//! 3. expanding kind and scope is a node sequence?
//!      yes -> for each node: bind all children with Scope::Node(node)
//!             value = Groups([...]), no direct children
//!      no  -> value bound from scope, children bound with scope
//! ```

use super::binding::{Binding, BoundNode, BoundValue};
use super::metrics::{ApplyMetrics, RunResult};
use crate::{MapError, Mapping, NodeId, Options, QueryEngine, QueryError, Scope, Value, ValueKind};
use std::time::Instant;

/// Binds a [`Mapping`] to a document through a [`QueryEngine`].
///
/// Usage: `Evaluator::new(&mapping, &engine, &options).run(&context)`.
/// Evaluators are single-use; each run yields an independent [`Binding`].
pub struct Evaluator<'m, 'e, Q: QueryEngine + ?Sized> {
    pub(super) mapping: &'m Mapping,
    pub(super) engine: &'e Q,
    pub(super) options: &'e Options,
    pub(super) metrics: ApplyMetrics,
}

impl<'m, 'e, Q: QueryEngine + ?Sized> Evaluator<'m, 'e, Q> {
    pub fn new(mapping: &'m Mapping, engine: &'e Q, options: &'e Options) -> Self {
        Evaluator { mapping, engine, options, metrics: ApplyMetrics::default() }
    }

    /// Bind the whole mapping with `context` as the root context and return
    /// counters and timings alongside the binding.
    pub fn run_with_metrics(mut self, context: &Q::Node) -> Result<RunResult<'m>, MapError> {
        let start = Instant::now();
        let root = self.bind(self.mapping.root(), &Scope::Node(context.clone()))?;
        self.metrics.total = start.elapsed();

        log::debug!(
            "bound {} field instance(s) in {:?}: {} expansion(s), {} instance(s), {} quer(ies)",
            self.metrics.nodes_bound,
            self.metrics.total,
            self.metrics.expansions,
            self.metrics.instances,
            self.metrics.queries
        );

        Ok(RunResult { binding: Binding { mapping: self.mapping, root }, metrics: self.metrics })
    }

    /// Bind the whole mapping with `context` as the root context.
    pub fn run(self, context: &Q::Node) -> Result<Binding<'m>, MapError> {
        self.run_with_metrics(context).map(|run| run.binding)
    }

    fn bind(&mut self, id: NodeId, context: &Scope<Q::Node>) -> Result<BoundNode, MapError> {
        let mapping = self.mapping;
        let def = mapping.def(id);
        let children = mapping.children(id);
        self.metrics.nodes_bound += 1;

        let name = self.resolve_name(def, context)?;
        let selected = match def.query() {
            Some(query) => Some(self.select(context, query)?),
            None => None,
        };
        let scope = selected.as_ref().unwrap_or(context);

        if def.kind().expands() {
            if let Scope::Nodes(items) = scope {
                log::trace!("expanding '{}' ({}) over {} element(s)", name, def.kind(), items.len());
                self.metrics.expansions += 1;
                self.metrics.instances += items.len();

                let mut groups = Vec::with_capacity(items.len());
                for item in items {
                    let instance = Scope::Node(item.clone());
                    let group = children.iter().map(|&child| self.bind(child, &instance)).collect::<Result<Vec<_>, _>>()?;
                    groups.push(group);
                }

                return Ok(BoundNode { def: id, name, value: BoundValue::Groups(groups), children: Vec::new() });
            }
        }

        let value = self.bind_value(def.kind(), scope);
        log::trace!("bound '{}' ({}) -> {:?}", name, def.kind(), value);

        let children = children.iter().map(|&child| self.bind(child, scope)).collect::<Result<Vec<_>, _>>()?;
        Ok(BoundNode { def: id, name, value, children })
    }

    /// Raw value for a non-expanded field.
    ///
    /// Sequence kinds only read node sequences, so the text of an inherited
    /// single node is only materialized for `Atomic` fields.
    fn bind_value(&self, kind: ValueKind, scope: &Scope<Q::Node>) -> BoundValue {
        match (kind, scope) {
            (ValueKind::Collection | ValueKind::DynamicObject, _) => BoundValue::Absent,
            (_, Scope::Name(name)) => BoundValue::Text(name.clone()),
            (_, Scope::Nodes(nodes)) => BoundValue::Matches(nodes.iter().map(|n| self.engine.text(n)).collect()),
            (ValueKind::Atomic, Scope::Node(node)) => BoundValue::Text(self.engine.text(node)),
            (ValueKind::Object | ValueKind::Array, Scope::Node(_)) => BoundValue::Absent,
        }
    }

    pub(super) fn select(&mut self, context: &Scope<Q::Node>, query: &str) -> Result<Scope<Q::Node>, QueryError> {
        self.metrics.queries += 1;
        let out = context.select(self.engine, query, &self.options.self_name_query)?;
        log::trace!("query '{}' -> {} match(es)", query, out.count());
        Ok(out)
    }
}

impl Mapping {
    /// Bind this mapping to a document, starting at `context`.
    ///
    /// The mapping is not modified; applying it again (to the same or another
    /// document) produces a fresh, independent [`Binding`].
    pub fn apply<'m, Q>(&'m self, engine: &Q, context: &Q::Node) -> Result<Binding<'m>, MapError>
    where
        Q: QueryEngine + ?Sized,
    {
        let options = Options::default();
        Evaluator::new(self, engine, &options).run(context)
    }

    /// [`Mapping::apply`] followed by [`Binding::result`].
    pub fn map<Q>(&self, engine: &Q, context: &Q::Node) -> Result<Value, MapError>
    where
        Q: QueryEngine + ?Sized,
    {
        self.apply(engine, context)?.result()
    }
}
