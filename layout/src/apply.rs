//! Pass applying requested operand layouts to a graph.

use smallvec::SmallVec;
use snafu::{OptionExt, ensure};
use tessel_ir::{Graph, OpId, Type, ValueId};

use crate::annotations::LayoutAnnotations;
use crate::context::RewriteContext;
use crate::error::*;
use crate::relayout::relayout;
use crate::vector_layout::VectorLayout;

/// Relay out every operand whose producer layout differs from the layout its
/// user requested, then clean up with canonicalization.
///
/// Ops are visited in program order. Relayouts and the rebuilt op are placed
/// where the annotated op was. Returns the number of operands that were relaid out.
#[tracing::instrument(skip_all, fields(ops = graph.num_live_ops()))]
pub fn apply_vector_layout(ctx: &RewriteContext, graph: &mut Graph, layouts: &mut LayoutAnnotations) -> Result<usize> {
    let annotated: Vec<OpId> = graph.live_ops().filter(|&op| layouts.inputs(op).is_some()).collect();
    let mut relaid = 0;
    for op in annotated {
        let previous = graph.set_insertion_point(Some(op));
        let applied = apply_to_op(ctx, graph, layouts, op);
        graph.set_insertion_point(previous);
        relaid += applied?;
    }
    let rewrites = graph.canonicalize()?;
    tracing::debug!(relaid, rewrites, "applied vector layouts");
    Ok(relaid)
}

fn apply_to_op(ctx: &RewriteContext, graph: &mut Graph, layouts: &mut LayoutAnnotations, op: OpId) -> Result<usize> {
    let operands = graph.operands(op);
    let requested: SmallVec<[Option<VectorLayout>; 4]> =
        layouts.inputs(op).map(SmallVec::from_slice).unwrap_or_default();
    ensure!(
        requested.len() == operands.len(),
        LayoutCountMismatchSnafu { op, expected: operands.len(), actual: requested.len() }
    );

    let mut rebuilt: SmallVec<[ValueId; 4]> = SmallVec::with_capacity(operands.len());
    for (operand, (&value, wanted)) in operands.iter().zip(&requested).enumerate() {
        let is_vector = graph.ty(value).is_vector();
        let wanted = match (is_vector, wanted) {
            (true, Some(wanted)) => wanted,
            (true, None) => return MissingLayoutSnafu { op, operand }.fail(),
            (false, Some(_)) => return UnexpectedLayoutSnafu { op, operand }.fail(),
            (false, None) => {
                rebuilt.push(value);
                continue;
            }
        };
        let produced = layouts.output(value).context(UnassignedLayoutSnafu { value })?;
        if produced == *wanted {
            rebuilt.push(value);
        } else {
            rebuilt.push(relayout(ctx, graph, layouts, value, &produced, wanted)?);
        }
    }

    let changed = rebuilt.iter().zip(&operands).filter(|(new, old)| new != old).count();
    if changed == 0 {
        return Ok(0);
    }

    let kind = graph.kind(op).clone();
    let results: SmallVec<[ValueId; 2]> = SmallVec::from_slice(graph.results(op));
    let result_types: SmallVec<[Type; 2]> = results.iter().map(|&v| graph.ty(v).clone()).collect();
    let new_op = graph.create_op(kind, rebuilt, result_types);
    for (&old, &new) in results.iter().zip(graph.results(new_op)) {
        if let Some(layout) = layouts.output(old) {
            layouts.set_output(new, layout);
        }
    }
    if let Some(inputs) = layouts.take_inputs(op) {
        layouts.set_inputs(new_op, inputs);
    }
    let replacements: SmallVec<[ValueId; 2]> = SmallVec::from_slice(graph.results(new_op));
    graph.replace_op(op, &replacements)?;
    tracing::debug!(%op, %new_op, changed, "rebuilt op with relaid operands");
    Ok(changed)
}
