//! Decomposition of vectors into tile grids and back.
//!
//! Both directions are pure bookkeeping: `disassemble` unrolls a vector into
//! one tile handle per grid cell and `assemble` rolls a grid into a vector.
//! Neither moves data. An unroll fed by a roll under the same layout is
//! recognized here and by the IR canonicalizer, so a round trip leaves no ops.

use ndarray::{ArrayD, IxDyn};
use smallvec::SmallVec;
use snafu::ensure;
use tessel_ir::{Graph, OpKey, ValueId, VectorType};

use crate::annotations::LayoutAnnotations;
use crate::context::RewriteContext;
use crate::error::*;
use crate::vector_layout::VectorLayout;

/// Physical tiles of a vector, indexed by the implicit-shape tile grid.
pub type TileGrid = ArrayD<ValueId>;

fn check_vector(ctx: &RewriteContext, layout: &VectorLayout, vty: &VectorType) -> Result<()> {
    layout.validate(ctx.target_shape)?;
    layout.check_element(vty.element())?;
    ensure!(vty.rank() >= layout.layout_rank(), RankTooSmallSnafu { rank: vty.rank(), needed: layout.layout_rank() });
    Ok(())
}

pub(crate) fn grid_from_tiles(shape: &[usize], tiles: Vec<ValueId>) -> Result<TileGrid> {
    let actual = SmallVec::from_slice(&[tiles.len()]);
    ArrayD::from_shape_vec(IxDyn(shape), tiles)
        .map_err(|_| GridShapeMismatchSnafu { expected: shape, actual }.build())
}

/// Split `value` into its tile grid under `layout`.
///
/// The grid has the implicit shape, ending in exactly two tiled dimensions.
pub fn disassemble(
    ctx: &RewriteContext,
    graph: &mut Graph,
    layouts: &LayoutAnnotations,
    layout: &VectorLayout,
    value: ValueId,
) -> Result<TileGrid> {
    let vty = graph.vector_type(value)?;
    check_vector(ctx, layout, &vty)?;
    let shape = layout.tile_array_shape(vty.shape(), true, ctx.target_shape)?;
    let count: usize = shape.iter().product();

    let rolled = graph
        .defining_op(value)
        .filter(|&op| graph.op(op).key() == OpKey::RollVectors && layouts.output(value) == Some(*layout))
        .map(|op| graph.operands(op))
        .filter(|tiles| tiles.len() == count);
    let tiles = match rolled {
        Some(tiles) => tiles.to_vec(),
        None => {
            let tile = layout.tile_type(vty.element(), ctx.target_shape);
            graph.unroll_vectors(value, &tile, count).to_vec()
        }
    };
    tracing::trace!(%value, %layout, grid = ?shape.as_slice(), "disassembled vector");
    grid_from_tiles(&shape, tiles)
}

/// Roll `grid` into a vector of type `vty` produced in `layout`.
///
/// Accepts the grid with or without the implicit dimension.
pub fn assemble(
    ctx: &RewriteContext,
    graph: &mut Graph,
    layouts: &mut LayoutAnnotations,
    vty: &VectorType,
    layout: &VectorLayout,
    grid: &TileGrid,
) -> Result<ValueId> {
    check_vector(ctx, layout, vty)?;
    let implicit = layout.tile_array_shape(vty.shape(), true, ctx.target_shape)?;
    let explicit = layout.tile_array_shape(vty.shape(), false, ctx.target_shape)?;
    ensure!(
        grid.shape() == implicit.as_slice() || grid.shape() == explicit.as_slice(),
        GridShapeMismatchSnafu { expected: implicit, actual: grid.shape() }
    );
    let value = graph.roll_vectors(grid.iter().copied(), vty.clone());
    layouts.set_output(value, *layout);
    Ok(value)
}
