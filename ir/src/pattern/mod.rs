//! Rewrite patterns with OpKey-based dispatch.
//!
//! A pattern is a closure over `(graph, op)`. It inspects the op, and on a
//! match builds the replacement operations in the graph and returns the values
//! standing in for the op's results. The rewrite driver performs the actual
//! replacement, so a pattern never erases anything itself.
//!
//! Patterns are indexed by [`OpKey`] in a `HashMap`, so only the patterns
//! registered for an op's kind are tried.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::Result;
use crate::graph::{Graph, OpId, ValueId};
use crate::op::OpKey;

/// Result of applying a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteResult {
    /// Pattern didn't match or declined to rewrite.
    NoMatch,
    /// Replacement for each result of the matched op.
    Rewritten(SmallVec<[ValueId; 2]>),
}

impl RewriteResult {
    pub fn replaced_by(value: ValueId) -> Self {
        Self::Rewritten(smallvec::smallvec![value])
    }
}

/// Closure type for pattern matching + rewriting.
pub type PatternClosure = Box<dyn Fn(&mut Graph, OpId) -> Result<RewriteResult> + Send + Sync>;

/// Pattern set with O(1) dispatch on the op kind.
#[derive(Default)]
pub struct PatternMatcher {
    indexed: HashMap<OpKey, Vec<PatternClosure>>,
}

impl PatternMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern for one op kind.
    pub fn add<F>(&mut self, key: OpKey, closure: F)
    where
        F: Fn(&mut Graph, OpId) -> Result<RewriteResult> + Send + Sync + 'static,
    {
        self.indexed.entry(key).or_default().push(Box::new(closure));
    }

    /// Number of registered patterns.
    pub fn len(&self) -> usize {
        self.indexed.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.indexed.is_empty()
    }

    /// Try the patterns for `op` in registration order and return the first match.
    pub fn rewrite(&self, graph: &mut Graph, op: OpId) -> Result<RewriteResult> {
        let key = graph.op(op).key();
        let Some(patterns) = self.indexed.get(&key) else {
            return Ok(RewriteResult::NoMatch);
        };
        tracing::trace!(op_key = ?key, pattern_count = patterns.len(), "trying indexed patterns");
        for (idx, closure) in patterns.iter().enumerate() {
            let result = closure(graph, op)?;
            if result != RewriteResult::NoMatch {
                tracing::debug!(op_key = ?key, pattern_idx = idx, "pattern matched");
                return Ok(result);
            }
        }
        Ok(RewriteResult::NoMatch)
    }
}
