//! Guard-rail verifiers for memory access, tile register and synchronization ops.

use snafu::ensure;

use super::{expect_operands, expect_results};
use crate::Result;
use crate::error::*;
use crate::graph::{Graph, OpId, ValueId};
use crate::op::OpKind;
use crate::shape::Dim;
use crate::types::{MemRefType, VectorType};

// =============================================================================
// Memory access
// =============================================================================

fn check_strided(memref: &MemRefType, indices: usize, strides: &[i32], vector: &VectorType) -> Result<()> {
    let rank = memref.rank();
    ensure!(rank == indices, StridedRankMismatchSnafu { what: "indices size", rank, len: indices });
    ensure!(rank == strides.len(), StridedRankMismatchSnafu { what: "strides size", rank, len: strides.len() });
    ensure!(rank == vector.rank(), StridedRankMismatchSnafu { what: "vector rank", rank, len: vector.rank() });
    if let Some((index, &stride)) = strides.iter().enumerate().find(|(_, stride)| **stride < 1) {
        return NonPositiveStrideSnafu { index, stride }.fail();
    }
    Ok(())
}

pub fn verify_strided_load(graph: &Graph, op: OpId) -> Result<()> {
    let OpKind::StridedLoad { strides } = graph.kind(op) else {
        unreachable!("strided load verifier dispatched for {:?}", graph.kind(op));
    };
    expect_results(graph, op, 1)?;
    let operands = graph.operands(op);
    let Some((&base, indices)) = operands.split_first() else {
        return OperandCountSnafu { expected: 1usize, actual: 0usize }.fail();
    };
    let memref = graph.memref_type(base)?;
    let vector = graph.vector_type(graph.results(op)[0])?;
    check_strided(&memref, indices.len(), strides, &vector)
}

pub fn verify_strided_store(graph: &Graph, op: OpId) -> Result<()> {
    let OpKind::StridedStore { strides } = graph.kind(op) else {
        unreachable!("strided store verifier dispatched for {:?}", graph.kind(op));
    };
    let operands = graph.operands(op);
    let [value, base, indices @ ..] = operands.as_slice() else {
        return OperandCountSnafu { expected: 2usize, actual: operands.len() }.fail();
    };
    let memref = graph.memref_type(*base)?;
    let vector = graph.vector_type(*value)?;
    check_strided(&memref, indices.len(), strides, &vector)
}

/// The vector must cover the trailing dimensions of the memref with matching element type.
fn check_vector_fits(graph: &Graph, vector: ValueId, memref: ValueId) -> Result<()> {
    let vty = graph.vector_type(vector)?;
    let mty = graph.memref_type(memref)?;
    let fits = vty.rank() <= mty.rank()
        && mty.element().scalar() == Some(vty.element())
        && mty.shape()[mty.rank() - vty.rank()..].iter().zip(vty.shape()).all(|(dim, &extent)| match dim {
            Dim::Static(n) => extent <= *n,
            Dim::Dynamic => true,
        });
    ensure!(fits, VectorMemRefMismatchSnafu { vector: graph.ty(vector).clone(), memref: graph.ty(memref).clone() });
    Ok(())
}

pub fn verify_vector_load(graph: &Graph, op: OpId) -> Result<()> {
    expect_operands(graph, op, 1)?;
    expect_results(graph, op, 1)?;
    check_vector_fits(graph, graph.results(op)[0], graph.operands(op)[0])
}

pub fn verify_vector_store(graph: &Graph, op: OpId) -> Result<()> {
    expect_operands(graph, op, 2)?;
    let operands = graph.operands(op);
    check_vector_fits(graph, operands[0], operands[1])
}

// =============================================================================
// Tile registers
// =============================================================================

/// Shared by the static and dynamic rotations; the checked vector is the result.
pub fn verify_rotate(graph: &Graph, op: OpId) -> Result<()> {
    let (dimension, stride, stride_dimension) = match *graph.kind(op) {
        OpKind::Rotate { dimension, stride, stride_dimension, .. } => (dimension, stride, stride_dimension),
        OpKind::DynamicRotate { dimension, stride, stride_dimension } => (dimension, stride, stride_dimension),
        ref other => unreachable!("rotate verifier dispatched for {other:?}"),
    };
    expect_results(graph, op, 1)?;
    let rank = graph.vector_type(graph.results(op)[0])?.rank();
    let in_range = |dim: i32| usize::try_from(dim).is_ok_and(|dim| dim < rank);

    ensure!(in_range(dimension), RotateDimensionSnafu { dimension, rank });
    if let Some(stride) = stride {
        ensure!(stride >= 0, RotateNegativeStrideSnafu { stride });
    }
    if let Some(dimension) = stride_dimension {
        ensure!(in_range(dimension), RotateStrideDimensionSnafu { dimension, rank });
    }
    ensure!(stride.is_some() == stride_dimension.is_some(), RotateStridePresenceSnafu);
    Ok(())
}

pub fn verify_mask_cast(graph: &Graph, op: OpId) -> Result<()> {
    expect_operands(graph, op, 1)?;
    expect_results(graph, op, 1)?;
    let (input, output) = (graph.operands(op)[0], graph.results(op)[0]);
    let (ity, oty) = (graph.vector_type(input)?, graph.vector_type(output)?);
    let (ishape, oshape) = (ity.shape(), oty.shape());
    let valid = ity.element() == oty.element()
        && oty.rank() == 3
        && (ity.rank() == 2 || (ity.rank() == 3 && ishape[2] < oshape[2]))
        && ishape[..2] == oshape[..2];
    ensure!(valid, InvalidMaskCastSnafu { input: graph.ty(input).clone(), output: graph.ty(output).clone() });
    Ok(())
}

// =============================================================================
// Synchronization
// =============================================================================

fn check_semaphore(graph: &Graph, value: ValueId, what: &'static str) -> Result<()> {
    let rank = graph.memref_type(value)?.rank();
    ensure!(rank == 0, SemaphoreRankSnafu { what, rank });
    Ok(())
}

pub fn verify_barrier_semaphore(graph: &Graph, op: OpId) -> Result<()> {
    expect_results(graph, op, 1)?;
    check_semaphore(graph, graph.results(op)[0], "barrier semaphore reference")
}

pub fn verify_semaphore_signal(graph: &Graph, op: OpId) -> Result<()> {
    let &OpKind::SemaphoreSignal { has_device_id, has_core_id } = graph.kind(op) else {
        unreachable!("semaphore signal verifier dispatched for {:?}", graph.kind(op));
    };
    expect_operands(graph, op, 2 + usize::from(has_device_id) + usize::from(has_core_id))?;
    check_semaphore(graph, graph.operands(op)[0], "semaphore reference")
}

pub fn verify_semaphore_wait(graph: &Graph, op: OpId) -> Result<()> {
    expect_operands(graph, op, 2)?;
    check_semaphore(graph, graph.operands(op)[0], "semaphore reference")
}

pub fn verify_enqueue_dma(graph: &Graph, op: OpId) -> Result<()> {
    let &OpKind::EnqueueDma { has_source_semaphore, has_device_id, has_core_id } = graph.kind(op) else {
        unreachable!("enqueue DMA verifier dispatched for {:?}", graph.kind(op));
    };
    let optional = [has_source_semaphore, has_device_id, has_core_id].into_iter().map(usize::from).sum::<usize>();
    expect_operands(graph, op, 3 + optional)?;
    let operands = graph.operands(op);

    let mut next = 1;
    if has_source_semaphore {
        check_semaphore(graph, operands[next], "DMA source semaphore reference")?;
        next += 1;
    }
    check_semaphore(graph, operands[next + 1], "DMA target semaphore")?;
    ensure!(!(has_device_id || has_core_id) || has_source_semaphore, SourceSemaphoreRequiredSnafu);
    Ok(())
}

pub fn verify_wait_dma(graph: &Graph, op: OpId) -> Result<()> {
    expect_operands(graph, op, 2)?;
    check_semaphore(graph, graph.operands(op)[0], "DMA wait semaphore")
}

pub fn verify_region(graph: &Graph, op: OpId) -> Result<()> {
    for &result in graph.results(op) {
        let ty = graph.ty(result);
        ensure!(!ty.is_memref(), RegionResultMemRefSnafu { ty: ty.clone() });
    }
    Ok(())
}
