use test_case::test_case;
use tessel_dtype::ScalarDType;
use tessel_ir::{Graph, OpKey, OpKind, ValueId};

use crate::annotations::LayoutAnnotations;
use crate::assemble::disassemble;
use crate::context::RewriteContext;
use crate::error::Error;
use crate::relayout::{RelayoutPlan, plan_relayout, relayout};
use crate::test::contents::{assert_elements_in_place, evaluate};
use crate::test::helpers::*;
use crate::vector_layout::{ImplicitDim, VectorLayout};

/// Relay out a fresh f32 argument of `shape`.
fn relayout_arg(
    ctx: &RewriteContext,
    shape: &[usize],
    element: ScalarDType,
    src: VectorLayout,
    dst: VectorLayout,
) -> (Graph, LayoutAnnotations, ValueId, Result<ValueId, Error>) {
    let mut graph = Graph::new();
    let mut layouts = LayoutAnnotations::new();
    let value = vector_arg(&mut graph, &mut layouts, shape, element, src);
    let result = relayout(ctx, &mut graph, &mut layouts, value, &src, &dst);
    (graph, layouts, value, result)
}

fn rotations(graph: &Graph) -> Vec<(i32, i32)> {
    graph
        .live_ops()
        .filter_map(|op| match *graph.kind(op) {
            OpKind::Rotate { amount, dimension, .. } => Some((amount, dimension)),
            _ => None,
        })
        .collect()
}

// =========================================================================
// Planning
// =========================================================================

#[test]
fn test_plan_identity() {
    let plan = plan_relayout(&ctx(), &[8, 128], &native(32), &native(32)).unwrap();
    assert_eq!(plan, RelayoutPlan::Identity);
}

#[test_case(native(16), "bitwidth change"; "bitwidth")]
#[test_case(layout(32, [Some(0), Some(0)], [1, 128]), "tiling change"; "tiling")]
fn test_plan_memory(dst: VectorLayout, reason: &'static str) {
    let plan = plan_relayout(&ctx(), &[8, 128], &native(32), &dst).unwrap();
    assert_eq!(plan, RelayoutPlan::Memory { reason });
}

#[test]
fn test_plan_offset_shift() {
    let dst = native(32).with_offsets([Some(3), Some(5)]);
    let plan = plan_relayout(&ctx(), &[8, 128], &native(32), &dst).unwrap();
    assert_eq!(plan, RelayoutPlan::Registers { reshape_grid: false, move_offsets: true });
}

#[test]
fn test_plan_offset_shift_on_row_tiling() {
    let src = layout(32, [Some(0), Some(0)], [1, 128]);
    let dst = src.with_offsets([Some(0), Some(7)]);
    let plan = plan_relayout(&ctx(), &[8, 128], &src, &dst).unwrap();
    assert!(matches!(plan, RelayoutPlan::Memory { .. }));
}

#[test_case(2, true; "whole packed row")]
#[test_case(1, false; "half a packed row")]
fn test_plan_packed_sublane_shift(rows: usize, in_registers: bool) {
    let dst = native(16).with_offsets([Some(rows), Some(0)]);
    let plan = plan_relayout(&ctx(), &[16, 128], &native(16), &dst).unwrap();
    assert_eq!(matches!(plan, RelayoutPlan::Registers { .. }), in_registers);
}

#[test]
fn test_plan_replicating_is_unsupported() {
    let dst = native(32).with_offsets([None, Some(0)]);
    let error = plan_relayout(&ctx(), &[8, 128], &native(32), &dst).unwrap_err();
    assert!(matches!(error, Error::UnsupportedRelayout { .. }));
}

#[test_case(ImplicitDim::None, ImplicitDim::Minor; "to minor")]
#[test_case(ImplicitDim::Minor, ImplicitDim::None; "from minor")]
fn test_plan_rank_too_small(src: ImplicitDim, dst: ImplicitDim) {
    let (src, dst) = (native(32).with_implicit_dim(src), native(32).with_implicit_dim(dst));
    let error = plan_relayout(&ctx(), &[256], &src, &dst).unwrap_err();
    assert_eq!(error, Error::RankTooSmall { rank: 1, needed: 2 });
}

#[test_case(&[4, 1, 128], true; "unit second minor")]
#[test_case(&[4, 8, 128], false; "data moves")]
fn test_plan_implicit_dim(shape: &[usize], in_registers: bool) {
    let dst = native(32).with_implicit_dim(ImplicitDim::SecondMinor);
    let plan = plan_relayout(&ctx(), shape, &native(32), &dst).unwrap();
    assert_eq!(matches!(plan, RelayoutPlan::Registers { reshape_grid: true, .. }), in_registers);
}

// =========================================================================
// Register path
// =========================================================================

#[test]
fn test_identity_creates_no_ops() {
    let (graph, _, value, result) = relayout_arg(&ctx(), &[8, 128], ScalarDType::Float32, native(32), native(32));
    assert_eq!(result.unwrap(), value);
    assert_eq!(graph.num_live_ops(), 0);
}

#[test_case(&[8, 128], 1, 0, 2; "single tile")]
#[test_case(&[8, 256], 2, 1, 3; "two tiles")]
fn test_lane_shift(shape: &[usize], rotates: usize, selects: usize, tiles: usize) {
    let dst = native(32).with_offsets([Some(0), Some(5)]);
    let (graph, layouts, _, result) = relayout_arg(&ctx(), shape, ScalarDType::Float32, native(32), dst);
    let out = result.unwrap();

    assert_eq!(rotations(&graph), vec![(5, 1); rotates]);
    assert_eq!(count_ops(&graph, OpKey::SelectTiles), selects);
    assert_eq!(layouts.output(out), Some(dst));
    let roll = graph.defining_op(out).unwrap();
    assert_eq!(graph.op(roll).key(), OpKey::RollVectors);
    assert_eq!(graph.operands(roll).len(), tiles);
    graph.verify().unwrap();
}

#[test]
fn test_select_splits_at_shift() {
    let dst = native(32).with_offsets([Some(0), Some(5)]);
    let (graph, _, _, result) = relayout_arg(&ctx(), &[8, 256], ScalarDType::Float32, native(32), dst);
    result.unwrap();

    let select = graph.live_ops().find(|&op| graph.op(op).key() == OpKey::SelectTiles).unwrap();
    assert_eq!(*graph.kind(select), OpKind::SelectTiles { dimension: 1, split: 5 });
}

#[test]
fn test_negative_lane_shift() {
    let src = native(32).with_offsets([Some(0), Some(5)]);
    let (graph, _, _, result) = relayout_arg(&ctx(), &[8, 128], ScalarDType::Float32, src, native(32));
    let out = result.unwrap();

    assert_eq!(rotations(&graph), vec![(123, 1), (123, 1)]);
    assert_eq!(count_ops(&graph, OpKey::SelectTiles), 1);
    assert_eq!(graph.operands(graph.defining_op(out).unwrap()).len(), 1);
}

#[test]
fn test_sublane_shift_within_tile() {
    let src = native(32).with_offsets([Some(0), Some(0)]);
    let dst = native(32).with_offsets([Some(4), Some(0)]);
    let (graph, _, _, result) = relayout_arg(&ctx(), &[4, 128], ScalarDType::Float32, src, dst);
    let out = result.unwrap();

    assert_eq!(rotations(&graph), vec![(4, 0)]);
    assert_eq!(graph.operands(graph.defining_op(out).unwrap()).len(), 1);
}

#[test]
fn test_packed_sublane_shift_rotates_physical_rows() {
    let dst = native(16).with_offsets([Some(2), Some(0)]);
    let (graph, _, _, result) = relayout_arg(&ctx(), &[16, 128], ScalarDType::BFloat16, native(16), dst);
    let out = result.unwrap();

    assert_eq!(rotations(&graph), vec![(1, 0)]);
    assert_eq!(graph.operands(graph.defining_op(out).unwrap()).len(), 2);
    graph.verify().unwrap();
}

#[test]
fn test_broadcast_replicated_sublanes() {
    let src = native(32).with_offsets([None, Some(0)]);
    let (graph, _, _, result) = relayout_arg(&ctx(), &[16, 128], ScalarDType::Float32, src, native(32));
    let out = result.unwrap();

    assert!(rotations(&graph).is_empty());
    let tiles = graph.operands(graph.defining_op(out).unwrap());
    assert_eq!(tiles.len(), 2);
    assert_eq!(tiles[0], tiles[1]);
}

#[test]
fn test_replicating_fails() {
    let dst = native(32).with_offsets([Some(0), None]);
    let (_, _, _, result) = relayout_arg(&ctx(), &[8, 128], ScalarDType::Float32, native(32), dst);
    let Err(Error::UnsupportedRelayout { src, dst: attempted, shape, .. }) = result else {
        panic!("expected an unsupported relayout");
    };
    assert_eq!(src, native(32));
    assert_eq!(attempted, dst);
    assert_eq!(shape.as_slice(), &[8, 128]);
}

#[test]
fn test_implicit_dim_bookkeeping() {
    let dst = native(32).with_implicit_dim(ImplicitDim::SecondMinor);
    let (mut graph, layouts, _, result) = relayout_arg(&ctx(), &[4, 1, 128], ScalarDType::Float32, native(32), dst);
    let out = result.unwrap();

    assert!(rotations(&graph).is_empty());
    assert_eq!(layouts.output(out), Some(dst));
    let grid = disassemble(&ctx(), &mut graph, &layouts, &dst, out).unwrap();
    assert_eq!(grid.shape(), &[4, 1, 1, 1]);
}

#[test]
fn test_rotations_are_shared_between_tiles() {
    let dst = native(32).with_offsets([Some(0), Some(5)]);
    let (graph, _, _, result) = relayout_arg(&ctx(), &[8, 384], ScalarDType::Float32, native(32), dst);
    result.unwrap();

    // Three source tiles, each rotated once.
    assert_eq!(rotations(&graph).len(), 3);
    assert_eq!(count_ops(&graph, OpKey::SelectTiles), 2);
}

#[test]
fn test_rank_too_small_fails_without_ops() {
    let dst = native(32).with_implicit_dim(ImplicitDim::Minor);
    let (graph, _, _, result) = relayout_arg(&ctx(), &[256], ScalarDType::Float32, native(32), dst);
    assert_eq!(result.unwrap_err(), Error::RankTooSmall { rank: 1, needed: 2 });
    assert_eq!(graph.num_live_ops(), 0);
}

#[test_case(&[8, 0], [Some(0), Some(5)]; "empty lanes")]
#[test_case(&[0, 128], [Some(3), Some(0)]; "empty sublanes")]
fn test_empty_vector_shift(shape: &[usize], offsets: [Option<usize>; 2]) {
    let dst = native(32).with_offsets(offsets);
    let (graph, layouts, _, result) = relayout_arg(&ctx(), shape, ScalarDType::Float32, native(32), dst);
    let out = result.unwrap();

    assert!(rotations(&graph).is_empty());
    assert_eq!(layouts.output(out), Some(dst));
    let expected: usize = dst.tile_array_shape(shape, true, TARGET).unwrap().iter().product();
    assert_eq!(graph.operands(graph.defining_op(out).unwrap()).len(), expected);
}

// =========================================================================
// Element placement
// =========================================================================

#[test_case([8, 128], [Some(0), Some(0)], [Some(0), Some(5)]; "lane shift")]
#[test_case([8, 256], [Some(0), Some(0)], [Some(3), Some(5)]; "both dims")]
#[test_case([8, 128], [Some(0), Some(5)], [Some(0), Some(0)]; "negative lane shift")]
#[test_case([16, 300], [Some(2), Some(7)], [Some(5), Some(100)]; "spanning tiles")]
#[test_case([13, 250], [Some(6), Some(120)], [Some(1), Some(3)]; "negative both dims")]
fn test_f32_elements_follow_offsets(shape: [usize; 2], from: [Option<usize>; 2], to: [Option<usize>; 2]) {
    let (src, dst) = (native(32).with_offsets(from), native(32).with_offsets(to));
    let (graph, _, value, result) = relayout_arg(&ctx(), &shape, ScalarDType::Float32, src, dst);
    let out = result.unwrap();

    let tiles = evaluate(&graph, value, &src, shape);
    assert_elements_in_place(&graph, &tiles, out, &dst, shape, false);
}

#[test_case([16, 128], Some(0), Some(2); "down one packed row")]
#[test_case([20, 128], Some(4), Some(0); "up two packed rows")]
#[test_case([30, 256], Some(6), Some(12); "spanning tiles")]
fn test_packed_elements_follow_offsets(shape: [usize; 2], from: Option<usize>, to: Option<usize>) {
    let (src, dst) = (native(16).with_offsets([from, Some(0)]), native(16).with_offsets([to, Some(0)]));
    let (graph, _, value, result) = relayout_arg(&ctx(), &shape, ScalarDType::BFloat16, src, dst);
    let out = result.unwrap();

    let tiles = evaluate(&graph, value, &src, shape);
    assert_elements_in_place(&graph, &tiles, out, &dst, shape, false);
}

#[test_case(Some(0); "aligned")]
#[test_case(Some(3); "offset")]
fn test_broadcast_fills_every_row(to: Option<usize>) {
    let src = native(32).with_offsets([None, Some(0)]);
    let dst = native(32).with_offsets([to, Some(0)]);
    let (graph, _, value, result) = relayout_arg(&ctx(), &[16, 128], ScalarDType::Float32, src, dst);
    let out = result.unwrap();

    let tiles = evaluate(&graph, value, &src, [16, 128]);
    assert_elements_in_place(&graph, &tiles, out, &dst, [16, 128], true);
}

// =========================================================================
// Memory path
// =========================================================================

#[test]
fn test_tiling_change_through_memory() {
    let dst = layout(32, [Some(0), Some(0)], [1, 128]);
    let (graph, layouts, value, result) =
        relayout_arg(&ctx_with_scratch(16), &[8, 128], ScalarDType::Float32, native(32), dst);
    let out = result.unwrap();

    for key in [OpKey::InternalScratch, OpKey::MemRefSlice, OpKey::MemRefReshape, OpKey::VectorStore, OpKey::VectorLoad] {
        assert_eq!(count_ops(&graph, key), 1, "{key:?}");
    }
    assert_eq!(layouts.output(out), Some(dst));
    assert_eq!(graph.vector_type(out).unwrap(), graph.vector_type(value).unwrap());
    graph.verify().unwrap();
}

#[test]
fn test_memory_pads_minor_dim() {
    let dst = native(16);
    let src = layout(16, [Some(0), Some(0)], [8, 128]);
    let (graph, _, _, result) = relayout_arg(&ctx_with_scratch(8), &[3, 100], ScalarDType::BFloat16, src, dst);
    let out = result.unwrap();

    let load = graph.defining_op(out).unwrap();
    let view = graph.memref_type(graph.operands(load)[0]).unwrap();
    assert_eq!(view.static_shape().unwrap().as_slice(), &[3, 128]);
    graph.verify().unwrap();
}

#[test]
fn test_memory_without_scratch() {
    let dst = layout(32, [Some(0), Some(0)], [1, 128]);
    let (_, _, _, result) = relayout_arg(&ctx(), &[8, 128], ScalarDType::Float32, native(32), dst);
    let Err(Error::UnsupportedRelayout { reason, .. }) = result else {
        panic!("expected an unsupported relayout");
    };
    assert!(reason.contains("no scratch memory"), "{reason}");
}

#[test]
fn test_memory_scratch_exhausted() {
    let dst = layout(32, [Some(0), Some(0)], [1, 128]);
    let (_, _, _, result) = relayout_arg(&ctx_with_scratch(4), &[8, 128], ScalarDType::Float32, native(32), dst);
    let Err(Error::UnsupportedRelayout { reason, .. }) = result else {
        panic!("expected an unsupported relayout");
    };
    assert!(reason.contains("tiling change"), "{reason}");
    assert!(reason.contains("scratch memory exhausted: 8 sublanes needed, 4 available"), "{reason}");
}
