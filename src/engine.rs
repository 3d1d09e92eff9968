//! Evaluation and reduction engine.
//!
//! Mapping a document is a two-phase pipeline:
//!
//! ```text
//! Mapping (static shape)
//!     │
//!     │  Evaluator::run                 (evaluator.rs, name.rs)
//!     │   - resolve each field's name    (placeholders + name filter)
//!     │   - run its query, or inherit the parent's context
//!     │   - Collection / DynamicObject: bind the children once per match
//!     v
//! Binding (bound tree, one BoundNode per field instance)
//!     │
//!     │  Binding::result                (reduce.rs, coerce.rs, merge.rs)
//!     │   - coerce each bound value by its ValueKind
//!     │   - merge children, prune empties, wrap under the resolved name
//!     v
//! serde_json::Value
//! ```
//!
//! The definition tree is only ever read. Every expansion instance gets its
//! own `BoundNode`s, so instances cannot observe each other and a mapping can
//! be applied to any number of documents.
//!
//! ## Responsibilities by module
//!
//! - `binding.rs`: the bound tree (`Binding`, `BoundNode`, `BoundValue`).
//! - `evaluator.rs`: context passing, query evaluation and expansion.
//! - `name.rs`: placeholder substitution and name filters.
//! - `coerce.rs`: per-kind conversion of a bound value into output.
//! - `merge.rs`: sibling union and the deep merge used by `DynamicObject`.
//! - `reduce.rs`: bottom-up reduction with pruning and name wrapping.
//! - `metrics.rs`: counters and timings for a run.
//!
//! ## Debugging
//!
//! The engine logs through the `log` facade: `debug` for per-run summaries,
//! `trace` for every bound field and query.

#[path = "engine/binding.rs"]
mod binding;
#[path = "engine/coerce.rs"]
mod coerce;
#[path = "engine/evaluator.rs"]
mod evaluator;
#[path = "engine/merge.rs"]
mod merge;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/name.rs"]
mod name;
#[path = "engine/reduce.rs"]
mod reduce;

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;

pub use binding::{Binding, BoundNode, BoundValue};
pub use evaluator::Evaluator;
pub use metrics::{ApplyMetrics, RunResult};
