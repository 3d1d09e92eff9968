use crate::engine::Evaluator;
use crate::xml::Document;
use crate::{MapError, Mapping, QueryEngine, SELF_NAME_QUERY, Value};
use std::time::{Duration, Instant};

/// Options that affect evaluation.
#[derive(Debug, Clone)]
pub struct Options {
    /// Query string answered with the context node's local name instead of
    /// a node sequence. Defaults to [`SELF_NAME_QUERY`].
    pub self_name_query: String,
}

impl Default for Options {
    fn default() -> Self {
        Self { self_name_query: SELF_NAME_QUERY.to_string() }
    }
}

/// Result from [`map_with`].
#[derive(Debug, Clone)]
pub struct MapOutput {
    /// Reduced, nested result.
    pub value: Value,
    /// Total time spent binding + reducing.
    pub elapsed: Duration,
}

/// Counters and timings returned by [`map_verbose_with`].
#[derive(Debug, Clone)]
pub struct MapDetails {
    /// Total elapsed time.
    pub total: Duration,
    /// Time spent binding the mapping to the document.
    pub apply: Duration,
    /// Time spent reducing the bound tree.
    pub reduce: Duration,
    pub nodes_bound: usize,
    pub expansions: usize,
    pub instances: usize,
    pub queries: usize,
}

/// Result from [`map_verbose_with`].
#[derive(Debug, Clone)]
pub struct MapOutputVerbose {
    pub value: Value,
    pub elapsed: Duration,
    pub details: MapDetails,
}

/// Parse `xml` and map it, starting at the document node.
///
/// # Example
/// ```
/// use docshape::{Mapping, ValueKind, map_str};
///
/// let mut mapping = Mapping::new();
/// mapping.field("ITEMS", ValueKind::Array, Some("//item/@id"));
///
/// let out = map_str(&mapping, "<list/>").unwrap();
/// assert_eq!(out, serde_json::json!({}));
/// ```
pub fn map_str(mapping: &Mapping, xml: &str) -> Result<Value, MapError> {
    let doc = Document::parse(xml)?;
    mapping.map(&doc, &doc.root())
}

/// Map the document behind `engine`, starting at `context`.
pub fn map_with<Q>(mapping: &Mapping, engine: &Q, context: &Q::Node, options: &Options) -> Result<MapOutput, MapError>
where
    Q: QueryEngine + ?Sized,
{
    let start = Instant::now();
    let binding = Evaluator::new(mapping, engine, options).run(context)?;
    let value = binding.result()?;

    Ok(MapOutput { value, elapsed: start.elapsed() })
}

/// Map like [`map_with`] and also return evaluation counters and timings.
///
/// The plain [`map_with`] path skips the per-phase bookkeeping.
pub fn map_verbose_with<Q>(
    mapping: &Mapping,
    engine: &Q,
    context: &Q::Node,
    options: &Options,
) -> Result<MapOutputVerbose, MapError>
where
    Q: QueryEngine + ?Sized,
{
    let start = Instant::now();
    let run = Evaluator::new(mapping, engine, options).run_with_metrics(context)?;

    let reduce_start = Instant::now();
    let value = run.binding.result()?;
    let reduce = reduce_start.elapsed();
    let total = start.elapsed();

    log::debug!("reduced in {:?} (total {:?})", reduce, total);

    let details = MapDetails {
        total,
        apply: run.metrics.total,
        reduce,
        nodes_bound: run.metrics.nodes_bound,
        expansions: run.metrics.expansions,
        instances: run.metrics.instances,
        queries: run.metrics.queries,
    };

    Ok(MapOutputVerbose { value, elapsed: total, details })
}
