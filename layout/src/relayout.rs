//! Conversion of vector values between layouts.
//!
//! [`plan_relayout`] picks a strategy from what differs between the two
//! layouts, and [`relayout`] carries it out:
//!
//! 1. Equal layouts: the value is returned as is.
//! 2. Bitwidth or tiling change: through scratch memory.
//! 3. Implicit dimension change: the tile grid is reshaped when both layouts
//!    tile the same trailing extents, otherwise through scratch memory.
//! 4. Offset change: replicated dimensions are broadcast, concrete offsets
//!    shift by rotating tiles and splicing neighbours. Shifts need the native
//!    tiling and, along sublanes, whole packed rows; otherwise through
//!    scratch memory. Replicating a concrete dimension is unsupported.
//!
//! The memory path stores the value into the internal scratch buffer viewed
//! as the padded vector shape, and loads it back in the target layout.

use std::collections::HashMap;

use ndarray::{Dimension, IxDyn};
use smallvec::SmallVec;
use snafu::ensure;
use tessel_dtype::{DType, MemorySpace};
use tessel_ir::shape::static_shape;
use tessel_ir::{Graph, MemLayout, MemRefType, Tile, TiledLayout, ValueId, VectorType};

use crate::annotations::LayoutAnnotations;
use crate::assemble::{TileGrid, assemble, disassemble, grid_from_tiles};
use crate::context::RewriteContext;
use crate::error::*;
use crate::vector_layout::VectorLayout;

/// How a relayout is carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayoutPlan {
    Identity,
    /// Data stays in registers.
    Registers { reshape_grid: bool, move_offsets: bool },
    /// Round trip through scratch memory.
    Memory { reason: &'static str },
}

/// Decide how to convert a vector of `shape` from `src` to `dst`.
pub fn plan_relayout(ctx: &RewriteContext, shape: &[usize], src: &VectorLayout, dst: &VectorLayout) -> Result<RelayoutPlan> {
    for layout in [src, dst] {
        ensure!(
            shape.len() >= layout.layout_rank(),
            RankTooSmallSnafu { rank: shape.len(), needed: layout.layout_rank() }
        );
    }
    if src == dst {
        return Ok(RelayoutPlan::Identity);
    }
    if src.bitwidth() != dst.bitwidth() {
        return Ok(RelayoutPlan::Memory { reason: "bitwidth change" });
    }
    if src.tiling() != dst.tiling() {
        return Ok(RelayoutPlan::Memory { reason: "tiling change" });
    }

    let reshape_grid = src.implicit_dim() != dst.implicit_dim();
    if reshape_grid {
        let (src_shape, dst_shape) = (src.implicit_shape(shape), dst.implicit_shape(shape));
        if src_shape[src_shape.len() - 2..] != dst_shape[dst_shape.len() - 2..] {
            return Ok(RelayoutPlan::Memory { reason: "implicit dimension change moves data" });
        }
    }

    let slice = src.vreg_slice(ctx.target_shape);
    let mut move_offsets = false;
    for dim in 0..2 {
        match (src.offsets()[dim], dst.offsets()[dim]) {
            (from, to) if from == to => {}
            (Some(_), None) => {
                return UnsupportedRelayoutSnafu {
                    src: *src,
                    dst: *dst,
                    shape,
                    reason: "cannot replicate a dimension with a concrete offset",
                }
                .fail();
            }
            (None, Some(_)) => move_offsets = true,
            (Some(from), Some(to)) => {
                if !src.has_native_tiling(ctx.target_shape) {
                    return Ok(RelayoutPlan::Memory { reason: "offset change on non-native tiling" });
                }
                let shift = (to as isize - from as isize).rem_euclid(slice[dim] as isize) as usize;
                if dim == 0 && shift % src.packing() != 0 {
                    return Ok(RelayoutPlan::Memory { reason: "sublane shift splits packed rows" });
                }
                move_offsets = true;
            }
            (None, None) => {}
        }
    }
    Ok(RelayoutPlan::Registers { reshape_grid, move_offsets })
}

/// Convert `value` from layout `src` to `dst`, preserving its logical contents.
///
/// The result is annotated with `dst` in `layouts`.
#[tracing::instrument(skip_all, fields(%value, %src, %dst))]
pub fn relayout(
    ctx: &RewriteContext,
    graph: &mut Graph,
    layouts: &mut LayoutAnnotations,
    value: ValueId,
    src: &VectorLayout,
    dst: &VectorLayout,
) -> Result<ValueId> {
    // Fast path
    if src == dst {
        return Ok(value);
    }
    src.validate(ctx.target_shape)?;
    dst.validate(ctx.target_shape)?;
    let vty = graph.vector_type(value)?;
    let plan = plan_relayout(ctx, vty.shape(), src, dst)?;
    tracing::debug!(?plan, shape = ?vty.shape(), "relayout");

    if vty.num_elements() == 0 && plan != RelayoutPlan::Identity {
        // Nothing to move: any tiles fill the target grid.
        let grid = disassemble(ctx, graph, layouts, dst, value)?;
        return assemble(ctx, graph, layouts, &vty, dst, &grid);
    }

    match plan {
        RelayoutPlan::Identity => Ok(value),
        RelayoutPlan::Registers { reshape_grid, move_offsets } => {
            let mut grid = disassemble(ctx, graph, layouts, src, value)?;
            let mut current = *src;
            if reshape_grid {
                current = current.with_implicit_dim(dst.implicit_dim());
                let shape = current.tile_array_shape(vty.shape(), true, ctx.target_shape)?;
                grid = grid_from_tiles(&shape, grid.iter().copied().collect())?;
            }
            if move_offsets {
                let dst_shape = dst.tile_array_shape(vty.shape(), true, ctx.target_shape)?;
                let slice = current.vreg_slice(ctx.target_shape);
                let rank = dst_shape.len();
                for dim in 0..2 {
                    let (from, to) = (current.offsets()[dim], dst.offsets()[dim]);
                    if from == to {
                        continue;
                    }
                    let Some(to) = to else { unreachable!("replication is rejected by planning") };
                    let shift = Shift { axis: rank - 2 + dim, dim, slice: slice[dim], extent: dst_shape[rank - 2 + dim] };
                    grid = match from {
                        None => shift.broadcast(&grid)?,
                        Some(from) => {
                            let packing = if dim == 0 { current.packing() } else { 1 };
                            shift.offset(graph, &grid, from, to, packing)?
                        }
                    };
                    current = current.with_offset(dim, Some(to));
                }
            }
            assemble(ctx, graph, layouts, &vty, dst, &grid)
        }
        RelayoutPlan::Memory { reason } => {
            tracing::debug!(reason, "relayout through scratch memory");
            via_memory(ctx, graph, layouts, value, &vty, src, dst).map_err(|error| match error {
                Error::UnsupportedRelayout { .. } => error,
                other => Error::UnsupportedRelayout {
                    src: *src,
                    dst: *dst,
                    shape: SmallVec::from_slice(vty.shape()),
                    reason: format!("{reason}; memory fallback failed: {other}"),
                },
            })
        }
    }
}

/// Movement along one tiled axis of the grid.
struct Shift {
    /// Grid axis.
    axis: usize,
    /// Tile dimension: 0 for sublanes, 1 for lanes.
    dim: usize,
    /// Elements per register along the axis.
    slice: usize,
    /// Target grid extent along the axis.
    extent: usize,
}

impl Shift {
    fn target_shape(&self, grid: &TileGrid) -> SmallVec<[usize; 4]> {
        let mut shape = SmallVec::from_slice(grid.shape());
        shape[self.axis] = self.extent;
        shape
    }

    /// Every target tile along the axis is the single replicated tile.
    fn broadcast(&self, grid: &TileGrid) -> Result<TileGrid> {
        let shape = self.target_shape(grid);
        let tiles = ndarray::indices(IxDyn(&shape))
            .into_iter()
            .map(|index| {
                let mut at = index.slice().to_vec();
                at[self.axis] = 0;
                grid[at.as_slice()]
            })
            .collect();
        grid_from_tiles(&shape, tiles)
    }

    /// Move data from offset `from` to `to`.
    ///
    /// With `shift = to - from = base * slice + k`, target tile `j` takes its
    /// first `k` rows/lanes from source tile `j - base - 1` and the rest from
    /// tile `j - base`, both rotated by `k`.
    fn offset(&self, graph: &mut Graph, grid: &TileGrid, from: usize, to: usize, packing: usize) -> Result<TileGrid> {
        let shift = to as isize - from as isize;
        let slice = self.slice as isize;
        let (base, k) = (shift.div_euclid(slice), shift.rem_euclid(slice) as usize);
        // Physical units: packed rows share a sublane.
        let amount = k / packing;
        let source_extent = grid.shape()[self.axis] as isize;

        let shape = self.target_shape(grid);
        let mut rotated: HashMap<ValueId, ValueId> = HashMap::new();
        let mut tiles = Vec::with_capacity(shape.iter().product());
        for index in ndarray::indices(IxDyn(&shape)) {
            let index = index.slice().to_vec();
            let j = index[self.axis] as isize;
            let source = |t: isize| {
                (0..source_extent).contains(&t).then(|| {
                    let mut at = index.clone();
                    at[self.axis] = t as usize;
                    grid[at.as_slice()]
                })
            };
            let high = source(j - base);
            let low = if amount > 0 { source(j - base - 1) } else { None };

            let mut rotate = |graph: &mut Graph, tile: ValueId| -> Result<ValueId> {
                if amount == 0 {
                    return Ok(tile);
                }
                if let Some(&done) = rotated.get(&tile) {
                    return Ok(done);
                }
                let done = graph.rotate(tile, amount as i32, self.dim as i32)?;
                rotated.insert(tile, done);
                Ok(done)
            };
            let tile = match (low, high) {
                (Some(low), Some(high)) => {
                    let (low, high) = (rotate(graph, low)?, rotate(graph, high)?);
                    graph.select_tiles(low, high, self.dim, amount)?
                }
                (Some(tile), None) | (None, Some(tile)) => rotate(graph, tile)?,
                (None, None) => {
                    return GridShapeMismatchSnafu { expected: shape.clone(), actual: grid.shape() }.fail();
                }
            };
            tiles.push(tile);
        }
        grid_from_tiles(&shape, tiles)
    }
}

/// `shape` padded for a `(1, lanes)` tiled memref: at least 2D, minor rounded up to lanes.
fn padded_shape(shape: &[usize], lanes: usize) -> SmallVec<[usize; 4]> {
    let mut padded: SmallVec<[usize; 4]> = SmallVec::from_slice(shape);
    if padded.len() < 2 {
        padded.insert(0, 1);
    }
    if let Some(minor) = padded.last_mut() {
        *minor = minor.next_multiple_of(lanes);
    }
    padded
}

fn row_tiled(shape: &[usize], element: DType, lanes: usize) -> Result<MemRefType> {
    let layout = TiledLayout::contiguous(shape, Tile::new([1, lanes])?)?;
    Ok(MemRefType::new(static_shape(shape), element, MemLayout::tiled(layout), Some(MemorySpace::Vmem))?)
}

fn via_memory(
    ctx: &RewriteContext,
    graph: &mut Graph,
    layouts: &mut LayoutAnnotations,
    value: ValueId,
    vty: &VectorType,
    src: &VectorLayout,
    dst: &VectorLayout,
) -> Result<ValueId> {
    let lanes = ctx.lanes();
    let packing = src.packing();
    let rows_available = ctx.max_sublanes_in_scratch * packing;
    ensure!(
        rows_available > 0,
        UnsupportedRelayoutSnafu { src: *src, dst: *dst, shape: vty.shape(), reason: "no scratch memory available" }
    );
    let padded = padded_shape(vty.shape(), lanes);
    let rows_needed = padded.iter().product::<usize>() / lanes;
    ensure!(
        rows_needed <= rows_available,
        ScratchExhaustedSnafu { needed: rows_needed.div_ceil(packing), available: ctx.max_sublanes_in_scratch }
    );

    let element = DType::Scalar(vty.element());
    let scratch = graph.internal_scratch(row_tiled(&[rows_available, lanes], element, lanes)?);
    let zero = graph.constant_index(0);
    let rows = graph.memref_slice(scratch, &[zero, zero], &[], row_tiled(&[rows_needed, lanes], element, lanes)?);
    let view = graph.memref_reshape(rows, row_tiled(&padded, element, lanes)?);
    for memref in [rows, view] {
        if let Some(op) = graph.defining_op(memref) {
            graph.verify_op(op)?;
        }
    }

    let store = graph.vector_store(value, view);
    graph.verify_op(store)?;
    let loaded = graph.vector_load(view, vty.clone());
    if let Some(op) = graph.defining_op(loaded) {
        graph.verify_op(op)?;
    }
    layouts.set_output(loaded, *dst);
    tracing::debug!(rows = rows_needed, %loaded, "relaid out through scratch");
    Ok(loaded)
}
