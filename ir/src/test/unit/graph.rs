use tessel_dtype::ScalarDType;

use crate::error::Error;
use crate::graph::{Graph, ValueDef};
use crate::op::OpKind;
use crate::test::helpers::*;
use crate::types::{Type, VectorType};

#[test]
fn test_replace_all_uses_forwards_operands() {
    let mut graph = Graph::new();
    let a = graph.add_argument(identity(&[8, 128]));
    let b = graph.add_argument(identity(&[8, 128]));
    let user = graph.opaque("user", [a], []);

    graph.replace_all_uses(a, b).unwrap();

    assert_eq!(graph.operands(user).as_slice(), &[b]);
    assert_eq!(graph.resolve(a), b);
    assert_eq!(graph.users(b), vec![user]);
    assert!(graph.has_uses(a));
}

#[test]
fn test_replace_all_uses_type_mismatch() {
    let mut graph = Graph::new();
    let a = graph.add_argument(identity(&[8, 128]));
    let b = graph.add_argument(identity(&[16, 128]));

    assert!(matches!(graph.replace_all_uses(a, b), Err(Error::ReplacementType { .. })));
}

#[test]
fn test_replace_op_erases() {
    let mut graph = Graph::new();
    let a = graph.add_argument(Type::Index);
    let c = graph.constant_index(7);
    let op = graph.defining_op(c).unwrap();

    assert!(matches!(graph.replace_op(op, &[a, a]), Err(Error::ReplacementCount { expected: 1, actual: 2, .. })));
    graph.replace_op(op, &[a]).unwrap();

    assert!(graph.op(op).is_erased());
    assert_eq!(graph.defining_op(c), None);
    assert_eq!(graph.def(c), ValueDef::Argument(0));
    assert_eq!(graph.live_op(op).unwrap_err(), Error::ErasedOp { op });
    assert!(matches!(graph.verify_op(op), Err(Error::ErasedOp { .. })));
}

#[test]
fn test_remove_dead_ops_keeps_side_effects() {
    let mut graph = Graph::new();
    let memref = graph.add_argument(identity(&[8, 128]));
    let loaded = graph.vector_load(memref, VectorType::new([8, 128], ScalarDType::Float32));
    let unused = graph.vector_load(memref, VectorType::new([8, 128], ScalarDType::Float32));
    let store = graph.vector_store(loaded, memref);
    graph.constant_index(3);

    assert_eq!(graph.remove_dead_ops(), 2);
    assert_eq!(graph.defining_op(unused), None);
    assert!(!graph.op(store).is_erased());
    assert!(graph.defining_op(loaded).is_some());
}

#[test]
fn test_erase_layout_default_type() {
    let mut graph = Graph::new();
    let src = graph.add_argument(tiled(&[128, 256], &TILE));
    let erased = graph.erase_layout(src, None).unwrap();

    assert_eq!(graph.memref_type(erased).unwrap(), identity(&[128, 256]));
    let index = graph.constant_index(0);
    assert!(matches!(graph.erase_layout(index, None), Err(Error::UnexpectedType { expected: "memref", .. })));
}

#[test]
fn test_op_names() {
    assert_eq!(OpKind::EraseLayout.name(), "erase_memref_layout");
    assert_eq!(OpKind::MemRefSlice { base_indices: 2, dynamic_sizes: 0 }.name(), "memref_slice");
    assert!(OpKind::MemRefReshape.is_removable());
    assert!(!OpKind::VectorStore.is_removable());
}
