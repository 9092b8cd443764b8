//! Operation constructors.
//!
//! Thin wrappers over [`Graph::create_op`] that lay out operands the way the
//! verifiers expect and derive result types where they follow from the inputs.

use smallvec::SmallVec;
use snafu::OptionExt;

use crate::Result;
use crate::error::UnexpectedTypeSnafu;
use crate::graph::{Graph, OpId, ValueId};
use crate::op::OpKind;
use crate::types::{MemRefType, Type, VectorType};

impl Graph {
    fn single_result(&mut self, kind: OpKind, operands: impl IntoIterator<Item = ValueId>, ty: Type) -> ValueId {
        let op = self.create_op(kind, operands, [ty]);
        self.results(op)[0]
    }

    pub fn constant_index(&mut self, value: i64) -> ValueId {
        self.single_result(OpKind::Constant { value }, [], Type::Index)
    }

    // =========================================================================
    // Memref views
    // =========================================================================

    /// Hide the layout of `memref` behind an identity-layout type.
    ///
    /// With `result` unset the erased type keeps shape, element type and memory space.
    pub fn erase_layout(&mut self, memref: ValueId, result: Option<MemRefType>) -> Result<ValueId> {
        let result = match result {
            Some(result) => result,
            None => {
                let ty = self.memref_type(memref)?;
                MemRefType::identity(ty.shape(), ty.element(), ty.memory_space())
            }
        };
        Ok(self.single_result(OpKind::EraseLayout, [memref], result.into()))
    }

    pub fn memref_slice(
        &mut self,
        memref: ValueId,
        base_indices: &[ValueId],
        dynamic_sizes: &[ValueId],
        result: MemRefType,
    ) -> ValueId {
        let kind = OpKind::MemRefSlice { base_indices: base_indices.len(), dynamic_sizes: dynamic_sizes.len() };
        let operands = std::iter::once(memref).chain(base_indices.iter().copied()).chain(dynamic_sizes.iter().copied());
        self.single_result(kind, operands, result.into())
    }

    pub fn memref_squeeze(&mut self, memref: ValueId, result: MemRefType) -> ValueId {
        self.single_result(OpKind::MemRefSqueeze, [memref], result.into())
    }

    pub fn memref_reshape(&mut self, memref: ValueId, result: MemRefType) -> ValueId {
        self.single_result(OpKind::MemRefReshape, [memref], result.into())
    }

    pub fn reinterpret_cast(&mut self, memref: ValueId, result: MemRefType) -> ValueId {
        self.single_result(OpKind::ReinterpretCast, [memref], result.into())
    }

    pub fn internal_scratch(&mut self, result: MemRefType) -> ValueId {
        self.single_result(OpKind::InternalScratch, [], result.into())
    }

    // =========================================================================
    // Memory access
    // =========================================================================

    pub fn strided_load(&mut self, base: ValueId, indices: &[ValueId], strides: &[i32], result: VectorType) -> ValueId {
        let kind = OpKind::StridedLoad { strides: SmallVec::from_slice(strides) };
        self.single_result(kind, std::iter::once(base).chain(indices.iter().copied()), result.into())
    }

    pub fn strided_store(&mut self, value: ValueId, base: ValueId, indices: &[ValueId], strides: &[i32]) -> OpId {
        let kind = OpKind::StridedStore { strides: SmallVec::from_slice(strides) };
        self.create_op(kind, [value, base].into_iter().chain(indices.iter().copied()), [])
    }

    pub fn vector_load(&mut self, memref: ValueId, result: VectorType) -> ValueId {
        self.single_result(OpKind::VectorLoad, [memref], result.into())
    }

    pub fn vector_store(&mut self, value: ValueId, memref: ValueId) -> OpId {
        self.create_op(OpKind::VectorStore, [value, memref], [])
    }

    // =========================================================================
    // Tile registers
    // =========================================================================

    /// Rotate `value` by `amount` along `dimension`: `out[i] = in[(i - amount) mod n]`.
    pub fn rotate(&mut self, value: ValueId, amount: i32, dimension: i32) -> Result<ValueId> {
        let ty = self.vector_type(value)?;
        let kind = OpKind::Rotate { amount, dimension, stride: None, stride_dimension: None };
        Ok(self.single_result(kind, [value], ty.into()))
    }

    pub fn select_tiles(&mut self, low: ValueId, high: ValueId, dimension: usize, split: usize) -> Result<ValueId> {
        let ty = self.vector_type(low)?;
        Ok(self.single_result(OpKind::SelectTiles { dimension, split }, [low, high], ty.into()))
    }

    pub fn roll_vectors(&mut self, tiles: impl IntoIterator<Item = ValueId>, result: VectorType) -> ValueId {
        self.single_result(OpKind::RollVectors, tiles, result.into())
    }

    pub fn unroll_vectors(&mut self, value: ValueId, tile: &VectorType, count: usize) -> SmallVec<[ValueId; 2]> {
        let op = self.create_op(OpKind::UnrollVectors, [value], std::iter::repeat_n(Type::from(tile.clone()), count));
        SmallVec::from_slice(self.results(op))
    }

    pub fn opaque(
        &mut self,
        name: impl Into<String>,
        operands: impl IntoIterator<Item = ValueId>,
        result_types: impl IntoIterator<Item = Type>,
    ) -> OpId {
        self.create_op(OpKind::Opaque { name: name.into() }, operands, result_types)
    }

    // =========================================================================
    // Typed lookups
    // =========================================================================

    pub fn memref_type(&self, value: ValueId) -> Result<MemRefType> {
        let ty = self.ty(value);
        ty.as_memref().cloned().context(UnexpectedTypeSnafu { expected: "memref", actual: ty.clone() })
    }

    pub fn vector_type(&self, value: ValueId) -> Result<VectorType> {
        let ty = self.ty(value);
        ty.as_vector().cloned().context(UnexpectedTypeSnafu { expected: "vector", actual: ty.clone() })
    }
}
