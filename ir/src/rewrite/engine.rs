//! Greedy rewrite driver.
//!
//! Sweeps the live operations in program order, offering each to the matcher.
//! A match replaces the op's results with the returned values and erases the op;
//! the replacement ops are created in front of it during the sweep and are
//! visited in the next one. Dead removable ops are dropped after every sweep. The driver stops at
//! the first sweep that rewrites nothing.

use crate::Result;
use crate::graph::{Graph, OpId};
use crate::pattern::{PatternMatcher, RewriteResult};

/// Upper bound on sweeps. Hitting it means two patterns undo each other.
const MAX_ITERATIONS: usize = 1000;

/// Apply `matcher` until no pattern matches. Returns the number of rewrites.
///
/// # Panics
///
/// Panics if the graph has not converged after `MAX_ITERATIONS` sweeps.
#[tracing::instrument(skip_all, fields(patterns = matcher.len()))]
pub fn apply_patterns_greedily(graph: &mut Graph, matcher: &PatternMatcher) -> Result<usize> {
    let mut total = 0;
    for iteration in 0..MAX_ITERATIONS {
        let rewritten = sweep(graph, matcher)?;
        let removed = graph.remove_dead_ops();
        tracing::debug!(iteration, rewritten, removed, "rewrite sweep finished");
        if rewritten == 0 {
            return Ok(total);
        }
        total += rewritten;
    }
    panic!("rewrite did not converge after {MAX_ITERATIONS} iterations ({total} rewrites applied)");
}

fn sweep(graph: &mut Graph, matcher: &PatternMatcher) -> Result<usize> {
    let ops: Vec<OpId> = graph.live_ops().collect();
    let mut rewritten = 0;
    for op in ops {
        // An earlier rewrite in this sweep may have erased it.
        if graph.op(op).is_erased() {
            continue;
        }
        // Replacements take the place of the op they replace.
        let previous = graph.set_insertion_point(Some(op));
        let result = matcher.rewrite(graph, op);
        graph.set_insertion_point(previous);
        if let RewriteResult::Rewritten(replacements) = result? {
            tracing::trace!(%op, op.name = graph.kind(op).name(), "replacing op");
            graph.replace_op(op, &replacements)?;
            rewritten += 1;
        }
    }
    Ok(rewritten)
}
