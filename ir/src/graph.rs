//! Arena-backed operation graph.
//!
//! Operations and values live in flat arenas and refer to each other through
//! integer handles, so there are no ownership cycles between an op and its
//! operand/result edges. Operations are never edited after construction:
//! rewriting builds new operations and then redirects uses with
//! [`Graph::replace_all_uses`], which records a forwarding link that every
//! operand lookup resolves.
//!
//! Program order is kept apart from the arena. New operations are appended,
//! or placed in front of the insertion point when one is set, so a rewrite
//! can put its replacement where the rewritten op was.

use std::collections::HashMap;

use smallvec::SmallVec;
use snafu::ensure;

use crate::Result;
use crate::error::{ErasedOpSnafu, ReplacementCountSnafu, ReplacementTypeSnafu};
use crate::op::{OpKey, OpKind};
use crate::types::Type;

/// Handle of an SSA value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("%{_0}")]
pub struct ValueId(u32);

/// Handle of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("op{_0}")]
pub struct OpId(u32);

/// Where a value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDef {
    Argument(usize),
    Result { op: OpId, index: usize },
}

#[derive(Debug, Clone)]
struct ValueData {
    ty: Type,
    def: ValueDef,
}

/// An operation node. Fields are fixed at construction.
#[derive(Debug, Clone)]
pub struct Operation {
    kind: OpKind,
    operands: SmallVec<[ValueId; 4]>,
    results: SmallVec<[ValueId; 2]>,
    erased: bool,
}

impl Operation {
    pub fn kind(&self) -> &OpKind {
        &self.kind
    }

    pub fn key(&self) -> OpKey {
        self.kind.key()
    }

    pub fn results(&self) -> &[ValueId] {
        &self.results
    }

    pub fn is_erased(&self) -> bool {
        self.erased
    }
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    ops: Vec<Operation>,
    values: Vec<ValueData>,
    arguments: Vec<ValueId>,
    /// Replaced value -> replacement. Chains are followed on lookup.
    forwards: HashMap<ValueId, ValueId>,
    /// Program order, erased ops included.
    order: Vec<OpId>,
    insertion_point: Option<OpId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Construction
    // =========================================================================

    pub fn add_argument(&mut self, ty: impl Into<Type>) -> ValueId {
        let id = self.push_value(ty.into(), ValueDef::Argument(self.arguments.len()));
        self.arguments.push(id);
        id
    }

    /// Place new operations in front of `anchor`, or at the end for `None`.
    ///
    /// Returns the previous insertion point.
    pub fn set_insertion_point(&mut self, anchor: Option<OpId>) -> Option<OpId> {
        std::mem::replace(&mut self.insertion_point, anchor)
    }

    /// Create an operation at the insertion point. Operands are resolved through pending replacements.
    pub fn create_op(
        &mut self,
        kind: OpKind,
        operands: impl IntoIterator<Item = ValueId>,
        result_types: impl IntoIterator<Item = Type>,
    ) -> OpId {
        let id = OpId(self.ops.len() as u32);
        let operands = operands.into_iter().map(|v| self.resolve(v)).collect();
        let results = result_types
            .into_iter()
            .enumerate()
            .map(|(index, ty)| self.push_value(ty, ValueDef::Result { op: id, index }))
            .collect();
        tracing::trace!(%id, op = kind.name(), "created op");
        self.ops.push(Operation { kind, operands, results, erased: false });
        let position = self
            .insertion_point
            .and_then(|anchor| self.order.iter().position(|&op| op == anchor))
            .unwrap_or(self.order.len());
        self.order.insert(position, id);
        id
    }

    fn push_value(&mut self, ty: Type, def: ValueDef) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(ValueData { ty, def });
        id
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn op(&self, id: OpId) -> &Operation {
        &self.ops[id.0 as usize]
    }

    /// Like [`Graph::op`], but fails on erased operations.
    pub fn live_op(&self, id: OpId) -> Result<&Operation> {
        let op = self.op(id);
        ensure!(!op.erased, ErasedOpSnafu { op: id });
        Ok(op)
    }

    pub fn kind(&self, id: OpId) -> &OpKind {
        &self.op(id).kind
    }

    pub fn arguments(&self) -> &[ValueId] {
        &self.arguments
    }

    /// Operands of `id` with replacements applied.
    pub fn operands(&self, id: OpId) -> SmallVec<[ValueId; 4]> {
        self.op(id).operands.iter().map(|&v| self.resolve(v)).collect()
    }

    pub fn results(&self, id: OpId) -> &[ValueId] {
        &self.op(id).results
    }

    /// Follow replacement links to the value that currently stands for `value`.
    pub fn resolve(&self, mut value: ValueId) -> ValueId {
        while let Some(&next) = self.forwards.get(&value) {
            value = next;
        }
        value
    }

    pub fn ty(&self, value: ValueId) -> &Type {
        &self.values[self.resolve(value).0 as usize].ty
    }

    pub fn def(&self, value: ValueId) -> ValueDef {
        self.values[self.resolve(value).0 as usize].def
    }

    /// Live operation producing `value`, if any.
    pub fn defining_op(&self, value: ValueId) -> Option<OpId> {
        match self.def(value) {
            ValueDef::Result { op, .. } if !self.op(op).erased => Some(op),
            _ => None,
        }
    }

    /// Live operations in program order.
    pub fn live_ops(&self) -> impl Iterator<Item = OpId> + '_ {
        self.order.iter().copied().filter(|&id| !self.op(id).erased)
    }

    pub fn num_live_ops(&self) -> usize {
        self.ops.iter().filter(|op| !op.erased).count()
    }

    /// Live operations using `value` as an operand.
    pub fn users(&self, value: ValueId) -> Vec<OpId> {
        let value = self.resolve(value);
        self.live_ops().filter(|&op| self.operands(op).contains(&value)).collect()
    }

    pub fn has_uses(&self, value: ValueId) -> bool {
        !self.users(value).is_empty()
    }

    // =========================================================================
    // Rewriting
    // =========================================================================

    /// Redirect every use of `from` to `to`. Both must have the same type.
    pub fn replace_all_uses(&mut self, from: ValueId, to: ValueId) -> Result<()> {
        let from = self.resolve(from);
        let to = self.resolve(to);
        if from == to {
            return Ok(());
        }
        let (from_ty, to_ty) = (self.ty(from), self.ty(to));
        ensure!(
            from_ty == to_ty,
            ReplacementTypeSnafu { from, from_ty: from_ty.clone(), to, to_ty: to_ty.clone() }
        );
        self.forwards.insert(from, to);
        Ok(())
    }

    /// Replace every result of `id` and erase it.
    pub fn replace_op(&mut self, id: OpId, replacements: &[ValueId]) -> Result<()> {
        let results = self.live_op(id)?.results.clone();
        ensure!(
            results.len() == replacements.len(),
            ReplacementCountSnafu { op: id, expected: results.len(), actual: replacements.len() }
        );
        for (&from, &to) in results.iter().zip(replacements) {
            self.replace_all_uses(from, to)?;
        }
        self.erase_op(id);
        Ok(())
    }

    /// Drop an operation from every walk. Its handles stay valid for lookups.
    pub fn erase_op(&mut self, id: OpId) {
        self.ops[id.0 as usize].erased = true;
    }

    /// Erase removable operations whose results are unused, to a fixed point.
    pub fn remove_dead_ops(&mut self) -> usize {
        let mut removed = 0;
        loop {
            let mut used = vec![false; self.values.len()];
            for op in self.ops.iter().filter(|op| !op.erased) {
                for &operand in &op.operands {
                    used[self.resolve(operand).0 as usize] = true;
                }
            }
            let dead: Vec<OpId> = self
                .live_ops()
                .filter(|&id| {
                    let op = self.op(id);
                    op.kind.is_removable()
                        && !op.results.is_empty()
                        && op.results.iter().all(|&r| !used[self.resolve(r).0 as usize])
                })
                .collect();
            if dead.is_empty() {
                return removed;
            }
            removed += dead.len();
            for id in dead {
                tracing::trace!(%id, op = self.kind(id).name(), "removing dead op");
                self.erase_op(id);
            }
        }
    }
}
