//! Push `EraseLayout` below memref views.
//!
//! Each rewrite rebuilds the view directly on the tiled memref behind the
//! erasure, with the layout it implies for the view's result, and erases the
//! layout again afterwards so users see the original result type. Later
//! lowering can then query the real layout of the view.

use crate::Result;
use crate::graph::{Graph, OpId, ValueId};
use crate::op::{OpKey, OpKind};
use crate::pattern::RewriteResult;
use crate::shape::{Dim, squeezed_dims, to_static};
use crate::strides::{compute_tile_strides, squeeze_tile_strides};
use crate::tiling::TiledLayout;
use crate::types::{MemLayout, MemRefType};

/// View input, erased memref type, and the tiled memref feeding the erasure.
struct ErasedInput {
    input: MemRefType,
    layout_ref: ValueId,
    layout_ty: MemRefType,
    tiled: TiledLayout,
}

/// Match a view whose input comes from an `EraseLayout` over a tiled memref.
fn erased_input(graph: &Graph, op: OpId) -> Result<Option<ErasedInput>> {
    let Some(&input) = graph.operands(op).first() else {
        return Ok(None);
    };
    let Some(erase) = graph.defining_op(input).filter(|&erase| graph.op(erase).key() == OpKey::EraseLayout) else {
        return Ok(None);
    };
    let Some(&layout_ref) = graph.operands(erase).first() else {
        return Ok(None);
    };
    let layout_ty = graph.memref_type(layout_ref)?;
    let Some(tiled) = layout_ty.layout().as_tiled().cloned() else {
        return Ok(None);
    };
    Ok(Some(ErasedInput { input: graph.memref_type(input)?, layout_ref, layout_ty, tiled }))
}

/// Re-erase `view` to the type of the replaced op's result.
fn finish(graph: &mut Graph, op: OpId, view: ValueId) -> Result<RewriteResult> {
    let result_ty = graph.memref_type(graph.results(op)[0])?;
    let erased = graph.erase_layout(view, Some(result_ty))?;
    tracing::debug!(%op, op.name = graph.kind(op).name(), ty = %graph.ty(view), "pushed layout erasure below view");
    Ok(RewriteResult::replaced_by(erased))
}

pub fn push_erase_through_slice(graph: &mut Graph, op: OpId) -> Result<RewriteResult> {
    let &OpKind::MemRefSlice { base_indices, .. } = graph.kind(op) else {
        return Ok(RewriteResult::NoMatch);
    };
    let Some(erased) = erased_input(graph, op)? else {
        return Ok(RewriteResult::NoMatch);
    };
    let result_ty = graph.memref_type(graph.results(op)[0])?;
    let sliced = erased.layout_ty.reshaped(result_ty.shape(), erased.layout_ty.layout().clone())?;

    let operands = graph.operands(op);
    // Too few operands for the attributes: left for the verifier to report.
    let Some((indices, sizes)) = operands.get(1..).and_then(|rest| rest.split_at_checked(base_indices)) else {
        return Ok(RewriteResult::NoMatch);
    };
    let slice = graph.memref_slice(erased.layout_ref, indices, sizes, sliced);
    finish(graph, op, slice)
}

pub fn push_erase_through_squeeze(graph: &mut Graph, op: OpId) -> Result<RewriteResult> {
    let Some(erased) = erased_input(graph, op)? else {
        return Ok(RewriteResult::NoMatch);
    };
    let tiled = &erased.tiled;
    let result_ty = graph.memref_type(graph.results(op)[0])?;
    // Unverified squeeze: leave it for the verifier to report.
    let Some(dropped) = squeezed_dims(erased.input.shape(), result_ty.shape(), &Dim::Static(1)) else {
        return Ok(RewriteResult::NoMatch);
    };
    let strides = squeeze_tile_strides(tiled.tile_strides(), &dropped);
    let layout = MemLayout::tiled(tiled.with_tile_strides(strides)?);
    let squeezed = erased.layout_ty.reshaped(result_ty.shape(), layout)?;

    let squeeze = graph.memref_squeeze(erased.layout_ref, squeezed);
    finish(graph, op, squeeze)
}

pub fn push_erase_through_reshape(graph: &mut Graph, op: OpId) -> Result<RewriteResult> {
    let Some(erased) = erased_input(graph, op)? else {
        return Ok(RewriteResult::NoMatch);
    };
    let tiled = &erased.tiled;
    let result_ty = graph.memref_type(graph.results(op)[0])?;
    let Some(dst_shape) = to_static(result_ty.shape()) else {
        return Ok(RewriteResult::NoMatch);
    };
    let strides = compute_tile_strides(&dst_shape, tiled.primary_tile().dimensions());
    let layout = MemLayout::tiled(tiled.with_tile_strides(strides)?);
    let reshaped = MemRefType::new(result_ty.shape(), result_ty.element(), layout, erased.layout_ty.memory_space())?;

    let reshape = graph.memref_reshape(erased.layout_ref, reshaped);
    finish(graph, op, reshape)
}
