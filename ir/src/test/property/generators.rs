use proptest::collection::vec;
use proptest::prelude::*;

/// Tile of the shapes the hardware uses: `(1 | 2 | 4 | 8 | 16, 128)`.
pub fn tile() -> impl Strategy<Value = [usize; 2]> {
    prop_oneof![Just(1usize), Just(2), Just(4), Just(8), Just(16)].prop_map(|rows| [rows, 128])
}

pub fn shape() -> impl Strategy<Value = Vec<usize>> {
    vec(1usize..300, 1..5)
}

/// Shape covering both dimensions of a 2D tile.
pub fn tiled_shape() -> impl Strategy<Value = Vec<usize>> {
    vec(1usize..300, 2..5)
}

/// A squeeze pair: a source shape and the shape with some of its unit dims removed.
///
/// The two trailing dimensions are never unit, so removed dims are leading ones.
pub fn leading_squeeze() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
    (vec((1usize..4, any::<bool>()), 0..5), 2usize..300, 2usize..300).prop_map(|(leading, second_minor, minor)| {
        let src: Vec<usize> =
            leading.iter().map(|&(dim, _)| dim).chain([second_minor, minor]).collect();
        let dst: Vec<usize> = leading
            .iter()
            .filter(|&&(dim, keep)| keep || dim != 1)
            .map(|&(dim, _)| dim)
            .chain([second_minor, minor])
            .collect();
        (src, dst)
    })
}

/// Any squeeze pair, unit dims allowed anywhere.
pub fn squeeze() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
    vec((1usize..4, any::<bool>()), 0..8).prop_map(|dims| {
        let src = dims.iter().map(|&(dim, _)| dim).collect();
        let dst = dims.iter().filter(|&&(dim, keep)| keep || dim != 1).map(|&(dim, _)| dim).collect();
        (src, dst)
    })
}
