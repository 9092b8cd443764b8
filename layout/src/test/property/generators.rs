use proptest::collection::vec;
use proptest::prelude::*;

use crate::test::helpers::*;
use crate::vector_layout::VectorLayout;

/// Vector shape with two tiled dimensions and up to two leading ones.
pub fn vector_shape() -> impl Strategy<Value = Vec<usize>> {
    (vec(1usize..4, 0..3), 1usize..40, 1usize..400)
        .prop_map(|(mut shape, second_minor, minor)| {
            shape.extend([second_minor, minor]);
            shape
        })
}

/// 32-bit native layout with arbitrary in-slice offsets.
pub fn f32_layout() -> impl Strategy<Value = VectorLayout> {
    (0usize..8, 0usize..128).prop_map(|(sublane, lane)| native(32).with_offsets([Some(sublane), Some(lane)]))
}
