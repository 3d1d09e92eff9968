//! Evaluation run metrics.
//!
//! `Evaluator::run` is the normal entry point. `Evaluator::run_with_metrics`
//! also returns the counters below, which are cheap enough to always collect
//! and useful when a mapping produces less (or more) than expected.

use super::binding::Binding;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct ApplyMetrics {
    /// Elapsed time binding the mapping.
    pub total: Duration,
    /// Field instances bound, expansion instances included.
    pub nodes_bound: usize,
    /// Fields that expanded over a node sequence.
    pub expansions: usize,
    /// Per-element instances created by those expansions.
    pub instances: usize,
    /// Queries evaluated, placeholder queries included.
    pub queries: usize,
}

/// Evaluator output bundled with its metrics.
#[derive(Debug, Clone)]
pub struct RunResult<'m> {
    pub binding: Binding<'m>,
    pub metrics: ApplyMetrics,
}
