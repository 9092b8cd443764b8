//! Verifiers for memref view operations: slice, squeeze, reshape, reinterpret cast.
//!
//! Source and target attributes may differ before the canonicalizer has
//! propagated them, so an unset memory space or an identity layout on the
//! target always matches.

use snafu::{OptionExt, ensure};
use tessel_dtype::MemorySpace;

use super::{expect_operands, expect_results};
use crate::Result;
use crate::error::*;
use crate::graph::{Graph, OpId};
use crate::op::OpKind;
use crate::shape::{Dim, num_elements, squeezed_dims};
use crate::strides::compute_tile_strides;
use crate::types::{MemRefType, Type};

fn memory_spaces_compatible(src: Option<MemorySpace>, dst: Option<MemorySpace>) -> bool {
    dst.is_none() || dst == src
}

fn check_memory_space(src: &MemRefType, dst: &MemRefType) -> Result<()> {
    ensure!(
        memory_spaces_compatible(src.memory_space(), dst.memory_space()),
        MemorySpaceMismatchSnafu { src: src.memory_space(), dst: dst.memory_space() }
    );
    Ok(())
}

fn check_element_type(src: &MemRefType, dst: &MemRefType) -> Result<()> {
    ensure!(src.element() == dst.element(), ElementTypeMismatchSnafu { src: src.element(), dst: dst.element() });
    Ok(())
}

/// Source and result memref of a single-operand view op.
fn view_types(graph: &Graph, op: OpId) -> Result<(MemRefType, MemRefType)> {
    expect_operands(graph, op, 1)?;
    expect_results(graph, op, 1)?;
    Ok((graph.memref_type(graph.operands(op)[0])?, graph.memref_type(graph.results(op)[0])?))
}

pub fn verify_slice(graph: &Graph, op: OpId) -> Result<()> {
    let &OpKind::MemRefSlice { base_indices, dynamic_sizes } = graph.kind(op) else {
        unreachable!("slice verifier dispatched for {:?}", graph.kind(op));
    };
    expect_operands(graph, op, 1 + base_indices + dynamic_sizes)?;
    expect_results(graph, op, 1)?;
    let operands = graph.operands(op);
    let src = graph.memref_type(operands[0])?;
    let dst = graph.memref_type(graph.results(op)[0])?;

    ensure!(
        base_indices == src.rank(),
        IndexCountMismatchSnafu { what: "slice base indices", rank: src.rank(), count: base_indices }
    );
    for &index in &operands[1..] {
        let ty = graph.ty(index);
        ensure!(*ty == Type::Index, UnexpectedTypeSnafu { expected: "index", actual: ty.clone() });
    }
    let fits = src.rank() == dst.rank()
        && src.shape().iter().zip(dst.shape()).all(|(s, d)| match (s, d) {
            (Dim::Static(s), Dim::Static(d)) => d <= s,
            _ => true,
        });
    ensure!(fits, SliceOutOfBoundsSnafu { src: src.shape(), dst: dst.shape() });

    check_memory_space(&src, &dst)?;
    ensure!(
        dst.layout().is_identity() || dst.layout() == src.layout(),
        LayoutMismatchSnafu { src: src.layout().clone(), dst: dst.layout().clone() }
    );
    ensure!(
        dynamic_sizes == dst.num_dynamic_dims(),
        DynamicSizeCountSnafu { expected: dst.num_dynamic_dims(), actual: dynamic_sizes }
    );
    Ok(())
}

pub fn verify_squeeze(graph: &Graph, op: OpId) -> Result<()> {
    let (src, dst) = view_types(graph, op)?;
    check_memory_space(&src, &dst)?;
    check_element_type(&src, &dst)?;
    squeezed_dims(src.shape(), dst.shape(), &Dim::Static(1))
        .context(InvalidSqueezeSnafu { src: src.shape(), dst: dst.shape() })?;
    Ok(())
}

pub fn verify_reshape(graph: &Graph, op: OpId) -> Result<()> {
    let (src, dst) = view_types(graph, op)?;
    check_memory_space(&src, &dst)?;
    ensure!(src.rank() >= 2 && dst.rank() >= 2, ReshapeRankSnafu { src_rank: src.rank(), dst_rank: dst.rank() });
    check_element_type(&src, &dst)?;
    let src_shape = src.static_shape().context(DynamicShapeSnafu { what: "memref reshape", shape: src.shape() })?;
    let dst_shape = dst.static_shape().context(DynamicShapeSnafu { what: "memref reshape", shape: dst.shape() })?;
    let (src_elements, dst_elements) = (num_elements(&src_shape), num_elements(&dst_shape));
    ensure!(src_elements == dst_elements, ReshapeElementCountSnafu { src: src_elements, dst: dst_elements });

    let Some(dst_layout) = dst.layout().as_tiled() else {
        return Ok(());
    };
    let src_layout = src.layout().as_tiled().context(ReshapeUntiledSourceSnafu)?;
    ensure!(
        src_layout.tiles() == dst_layout.tiles(),
        ReshapeTilingMismatchSnafu { src: src.layout().clone(), dst: dst.layout().clone() }
    );
    let tile = src_layout.primary_tile().dimensions();
    ensure!(tile.len() == 2, ReshapeTileRankSnafu { rank: tile.len() });
    let contiguous = compute_tile_strides(&src_shape, tile);
    ensure!(
        contiguous.as_slice() == src_layout.tile_strides(),
        ReshapeNonContiguousSnafu { expected: contiguous, actual: src_layout.tile_strides() }
    );
    check_reshape_alignment(&src_shape[src_shape.len() - 2..], &dst_shape[dst_shape.len() - 2..], tile)
}

/// Alignment rules on the two tiled dimensions of a contiguous reshape.
///
/// With a `(1, L)` tile and both minor dimensions aligned to `L`, the tiled
/// dimensions may be reshaped freely. Otherwise the minor dimension must be
/// unchanged, and a changed second-minor dimension must be tile-aligned on both sides.
pub fn check_reshape_alignment(src: &[usize], dst: &[usize], tile: &[usize]) -> Result<()> {
    let src_second_minor_aligned = src[0] % tile[0] == 0;
    let src_minor_aligned = src[1] % tile[1] == 0;
    let dst_second_minor_aligned = dst[0] % tile[0] == 0;
    let dst_minor_aligned = dst[1] % tile[1] == 0;

    if tile[0] == 1 && src_minor_aligned && dst_minor_aligned {
        return Ok(());
    }
    ensure!(dst[1] == src[1], ReshapeMinorChangedSnafu { src: src[1], dst: dst[1] });
    if dst[0] != src[0] {
        ensure!(
            src_second_minor_aligned && dst_second_minor_aligned,
            ReshapeSecondMinorUnalignedSnafu { src: src[0], dst: dst[0], tile: tile[0] }
        );
    }
    Ok(())
}

pub fn verify_reinterpret_cast(graph: &Graph, op: OpId) -> Result<()> {
    let (src, dst) = view_types(graph, op)?;
    ensure!(
        src.memory_space().is_some() && src.memory_space() == dst.memory_space(),
        ReinterpretMemorySpaceSnafu { src: src.memory_space(), dst: dst.memory_space() }
    );
    Ok(())
}

