use tessel_dtype::ScalarDType;
use tessel_ir::{Graph, OpId, OpKey, OpKind, Type};

use crate::annotations::LayoutAnnotations;
use crate::apply::apply_vector_layout;
use crate::error::Error;
use crate::test::helpers::*;
use crate::vector_layout::VectorLayout;

/// An opaque consumer of an `[8, 128]` f32 vector in the native layout and an index.
fn consumer(requested: Vec<Option<VectorLayout>>) -> (Graph, LayoutAnnotations, OpId) {
    let mut graph = Graph::new();
    let mut layouts = LayoutAnnotations::new();
    let value = vector_arg(&mut graph, &mut layouts, &[8, 128], ScalarDType::Float32, native(32));
    let index = graph.add_argument(Type::Index);
    let op = graph.opaque("consumer", [value, index], []);
    layouts.set_inputs(op, requested);
    (graph, layouts, op)
}

#[test]
fn test_apply_relays_out_operand() {
    let shifted = native(32).with_offsets([Some(0), Some(5)]);
    let (mut graph, mut layouts, op) = consumer(vec![Some(shifted), None]);

    let relaid = apply_vector_layout(&ctx(), &mut graph, &mut layouts).unwrap();

    assert_eq!(relaid, 1);
    assert!(graph.op(op).is_erased());
    let rebuilt = graph.live_ops().find(|&id| graph.op(id).key() == OpKey::Opaque).unwrap();
    let operands = graph.operands(rebuilt);
    assert_eq!(layouts.output(operands[0]), Some(shifted));
    assert_eq!(graph.op(graph.defining_op(operands[0]).unwrap()).key(), OpKey::RollVectors);
    assert_eq!(operands[1], graph.arguments()[1]);
    assert_eq!(layouts.inputs(rebuilt), Some([Some(shifted), None].as_slice()));
    graph.verify().unwrap();
}

#[test]
fn test_apply_is_idempotent() {
    let shifted = native(32).with_offsets([Some(0), Some(5)]);
    let (mut graph, mut layouts, _) = consumer(vec![Some(shifted), None]);

    apply_vector_layout(&ctx(), &mut graph, &mut layouts).unwrap();
    let ops = graph.num_live_ops();

    assert_eq!(apply_vector_layout(&ctx(), &mut graph, &mut layouts).unwrap(), 0);
    assert_eq!(graph.num_live_ops(), ops);
}

#[test]
fn test_apply_matching_layout_keeps_op() {
    let (mut graph, mut layouts, op) = consumer(vec![Some(native(32)), None]);

    assert_eq!(apply_vector_layout(&ctx(), &mut graph, &mut layouts).unwrap(), 0);
    assert!(!graph.op(op).is_erased());
    assert_eq!(graph.num_live_ops(), 1);
}

#[test]
fn test_apply_missing_layout() {
    let (mut graph, mut layouts, op) = consumer(vec![None, None]);
    let error = apply_vector_layout(&ctx(), &mut graph, &mut layouts).unwrap_err();
    assert_eq!(error, Error::MissingLayout { op, operand: 0 });
}

#[test]
fn test_apply_unexpected_layout() {
    let (mut graph, mut layouts, op) = consumer(vec![Some(native(32)), Some(native(32))]);
    let error = apply_vector_layout(&ctx(), &mut graph, &mut layouts).unwrap_err();
    assert_eq!(error, Error::UnexpectedLayout { op, operand: 1 });
}

#[test]
fn test_apply_layout_count_mismatch() {
    let (mut graph, mut layouts, op) = consumer(vec![Some(native(32))]);
    let error = apply_vector_layout(&ctx(), &mut graph, &mut layouts).unwrap_err();
    assert_eq!(error, Error::LayoutCountMismatch { op, expected: 2, actual: 1 });
}

#[test]
fn test_apply_unassigned_producer() {
    let mut graph = Graph::new();
    let mut layouts = LayoutAnnotations::new();
    let value = graph.add_argument(vector(&[8, 128], ScalarDType::Float32));
    let op = graph.opaque("consumer", [value], []);
    layouts.set_inputs(op, [Some(native(32))]);

    let error = apply_vector_layout(&ctx(), &mut graph, &mut layouts).unwrap_err();

    assert_eq!(error, Error::UnassignedLayout { value });
}

#[test]
fn test_apply_chains_through_rebuilt_producer() {
    let mut graph = Graph::new();
    let mut layouts = LayoutAnnotations::new();
    let shifted = native(32).with_offsets([Some(0), Some(5)]);
    let value = vector_arg(&mut graph, &mut layouts, &[8, 128], ScalarDType::Float32, native(32));
    let producer = graph.opaque("producer", [value], [vector(&[8, 128], ScalarDType::Float32).into()]);
    let produced = graph.results(producer)[0];
    layouts.set_inputs(producer, [Some(shifted)]);
    layouts.set_output(produced, native(32));
    let user = graph.opaque("user", [produced], []);
    layouts.set_inputs(user, [Some(shifted)]);

    assert_eq!(apply_vector_layout(&ctx(), &mut graph, &mut layouts).unwrap(), 2);

    assert_eq!(count_ops(&graph, OpKey::Opaque), 2);
    let user = graph.live_ops().filter(|&id| graph.op(id).key() == OpKey::Opaque).last().unwrap();
    let input = graph.operands(user)[0];
    assert_eq!(layouts.output(input), Some(shifted));
    graph.verify().unwrap();
}

#[test]
fn test_apply_places_relayout_before_consumer() {
    let shifted = native(32).with_offsets([Some(0), Some(5)]);
    let (mut graph, mut layouts, _) = consumer(vec![Some(shifted), None]);
    let fence = graph.opaque("fence", [], []);

    apply_vector_layout(&ctx(), &mut graph, &mut layouts).unwrap();

    let order: Vec<OpId> = graph.live_ops().collect();
    let position = |key: OpKey| order.iter().position(|&id| graph.op(id).key() == key).unwrap();
    let rebuilt = order
        .iter()
        .position(|&id| matches!(graph.kind(id), OpKind::Opaque { name } if name == "consumer"))
        .unwrap();
    assert!(position(OpKey::UnrollVectors) < position(OpKey::Rotate));
    assert!(position(OpKey::Rotate) < position(OpKey::RollVectors));
    assert!(position(OpKey::RollVectors) < rebuilt);
    assert_eq!(order.last(), Some(&fence));
}
