//! Folds over tile-grid bookkeeping ops.

use crate::Result;
use crate::graph::{Graph, OpId};
use crate::op::OpKey;
use crate::pattern::RewriteResult;

/// `unroll(roll(tiles))` is `tiles` when the tile count and types agree.
pub fn fold_unroll_of_roll(graph: &mut Graph, op: OpId) -> Result<RewriteResult> {
    let Some(&input) = graph.operands(op).first() else {
        return Ok(RewriteResult::NoMatch);
    };
    let Some(roll) = graph.defining_op(input).filter(|&roll| graph.op(roll).key() == OpKey::RollVectors) else {
        return Ok(RewriteResult::NoMatch);
    };
    let tiles = graph.operands(roll);
    let results = graph.results(op);
    if tiles.len() != results.len() || tiles.iter().zip(results).any(|(&tile, &result)| graph.ty(tile) != graph.ty(result)) {
        return Ok(RewriteResult::NoMatch);
    }
    tracing::trace!(%op, %roll, tiles = tiles.len(), "folding unroll of roll");
    Ok(RewriteResult::Rewritten(tiles.into_iter().collect()))
}
