//! Canonicalization: the per-kind rewrites from the capability table, run greedily.

pub mod memref;
pub mod vectors;

use strum::IntoEnumIterator;

use crate::Result;
use crate::graph::{Graph, OpId};
use crate::op::OpKey;
use crate::pattern::{PatternMatcher, RewriteResult};
use crate::rewrite::apply_patterns_greedily;
use crate::verify::capabilities;

/// Canonicalizer of one op kind.
pub type CanonicalizeFn = fn(&mut Graph, OpId) -> Result<RewriteResult>;

/// Every canonicalizer in the capability table, indexed by kind.
pub fn canonicalization_patterns() -> PatternMatcher {
    let mut matcher = PatternMatcher::new();
    for key in OpKey::iter() {
        if let Some(canonicalize) = capabilities(key).canonicalize {
            matcher.add(key, canonicalize);
        }
    }
    matcher
}

impl Graph {
    /// Canonicalize to a fixed point. Returns the number of rewrites applied.
    #[tracing::instrument(skip_all, fields(ops = self.num_live_ops()))]
    pub fn canonicalize(&mut self) -> Result<usize> {
        let rewrites = apply_patterns_greedily(self, &canonicalization_patterns())?;
        tracing::debug!(rewrites, ops = self.num_live_ops(), "canonicalization finished");
        Ok(rewrites)
    }
}
