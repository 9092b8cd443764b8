//! Layouts attached to the graph out of band.
//!
//! Layout inference records, per operation, the layout it wants for each
//! operand, and per vector value, the layout it is produced in.

use std::collections::HashMap;

use smallvec::SmallVec;
use tessel_ir::{OpId, ValueId};

use crate::vector_layout::VectorLayout;

#[derive(Debug, Clone, Default)]
pub struct LayoutAnnotations {
    inputs: HashMap<OpId, SmallVec<[Option<VectorLayout>; 4]>>,
    outputs: HashMap<ValueId, VectorLayout>,
}

impl LayoutAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request operand layouts for `op`: one entry per operand, `None` for non-vectors.
    pub fn set_inputs(&mut self, op: OpId, layouts: impl IntoIterator<Item = Option<VectorLayout>>) {
        self.inputs.insert(op, layouts.into_iter().collect());
    }

    pub fn inputs(&self, op: OpId) -> Option<&[Option<VectorLayout>]> {
        self.inputs.get(&op).map(SmallVec::as_slice)
    }

    pub fn take_inputs(&mut self, op: OpId) -> Option<SmallVec<[Option<VectorLayout>; 4]>> {
        self.inputs.remove(&op)
    }

    pub fn set_output(&mut self, value: ValueId, layout: VectorLayout) {
        self.outputs.insert(value, layout);
    }

    /// Layout `value` is produced in.
    pub fn output(&self, value: ValueId) -> Option<VectorLayout> {
        self.outputs.get(&value).copied()
    }
}
