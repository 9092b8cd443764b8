//! Operation verifiers.
//!
//! Verification is dispatched through [`capabilities`], a table keyed by
//! [`OpKey`]: the op set is closed, so a `match` is the whole registry.
//! A failing verifier is reported as [`Error::Verification`] naming the
//! offending op; the first failure stops verification of the graph.

pub mod memref;
pub mod structural;

use snafu::ensure;

use crate::Result;
use crate::canonicalize::{self, CanonicalizeFn};
use crate::error::{Error, OperandCountSnafu, ResultCountSnafu};
use crate::graph::{Graph, OpId};
use crate::op::OpKey;

/// Verifier: a pure predicate over one operation.
pub type VerifyFn = fn(&Graph, OpId) -> Result<()>;

/// What the compiler knows how to do with an op kind.
#[derive(Clone, Copy, Default)]
pub struct Capabilities {
    pub verify: Option<VerifyFn>,
    pub canonicalize: Option<CanonicalizeFn>,
}

pub fn capabilities(key: OpKey) -> Capabilities {
    let (verify, canonicalize): (Option<VerifyFn>, Option<CanonicalizeFn>) = match key {
        OpKey::MemRefSlice => (Some(memref::verify_slice), Some(canonicalize::memref::push_erase_through_slice)),
        OpKey::MemRefSqueeze => (Some(memref::verify_squeeze), Some(canonicalize::memref::push_erase_through_squeeze)),
        OpKey::MemRefReshape => (Some(memref::verify_reshape), Some(canonicalize::memref::push_erase_through_reshape)),
        OpKey::ReinterpretCast => (Some(memref::verify_reinterpret_cast), None),
        OpKey::StridedLoad => (Some(structural::verify_strided_load), None),
        OpKey::StridedStore => (Some(structural::verify_strided_store), None),
        OpKey::VectorLoad => (Some(structural::verify_vector_load), None),
        OpKey::VectorStore => (Some(structural::verify_vector_store), None),
        OpKey::Rotate | OpKey::DynamicRotate => (Some(structural::verify_rotate), None),
        OpKey::MaskCast => (Some(structural::verify_mask_cast), None),
        OpKey::GetBarrierSemaphore => (Some(structural::verify_barrier_semaphore), None),
        OpKey::SemaphoreSignal => (Some(structural::verify_semaphore_signal), None),
        OpKey::SemaphoreWait => (Some(structural::verify_semaphore_wait), None),
        OpKey::EnqueueDma => (Some(structural::verify_enqueue_dma), None),
        OpKey::WaitDma => (Some(structural::verify_wait_dma), None),
        OpKey::Region => (Some(structural::verify_region), None),
        OpKey::UnrollVectors => (None, Some(canonicalize::vectors::fold_unroll_of_roll)),
        OpKey::Constant
        | OpKey::EraseLayout
        | OpKey::InternalScratch
        | OpKey::SelectTiles
        | OpKey::RollVectors
        | OpKey::Opaque => (None, None),
    };
    Capabilities { verify, canonicalize }
}

impl Graph {
    /// Run the verifier of one operation.
    pub fn verify_op(&self, op: OpId) -> Result<()> {
        let operation = self.live_op(op)?;
        let Some(verify) = capabilities(operation.key()).verify else {
            return Ok(());
        };
        verify(self, op).map_err(|cause| {
            let name = operation.kind().name();
            tracing::error!(%op, op.name = name, error = %cause, "verification failed");
            Error::Verification { op, name, cause: Box::new(cause) }
        })
    }

    /// Verify every live operation, stopping at the first failure.
    #[tracing::instrument(skip_all, fields(ops = self.num_live_ops()))]
    pub fn verify(&self) -> Result<()> {
        self.live_ops().try_for_each(|op| self.verify_op(op))
    }
}

pub(crate) fn expect_operands(graph: &Graph, op: OpId, expected: usize) -> Result<()> {
    let actual = graph.operands(op).len();
    ensure!(actual == expected, OperandCountSnafu { expected, actual });
    Ok(())
}

pub(crate) fn expect_results(graph: &Graph, op: OpId, expected: usize) -> Result<()> {
    let actual = graph.results(op).len();
    ensure!(actual == expected, ResultCountSnafu { expected, actual });
    Ok(())
}
