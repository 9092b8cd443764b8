//! Tile stride algebra.

use smallvec::SmallVec;

use crate::tiling::TiledLayout;

/// Canonical row-major tile strides of `shape` under `tile`.
///
/// Walking from the minor dimension outward, each tiled dimension contributes
/// `ceil(extent / tile_extent)` tiles to the running stride, while leading
/// dimensions not covered by the tile contribute their full extent.
///
/// ```rust
/// # use tessel_ir::strides::compute_tile_strides;
/// assert_eq!(compute_tile_strides(&[128, 256], &[8, 128]).as_slice(), &[2, 1]);
/// assert_eq!(compute_tile_strides(&[1, 32, 128], &[8, 128]).as_slice(), &[4, 1, 1]);
/// ```
pub fn compute_tile_strides(shape: &[usize], tile: &[usize]) -> SmallVec<[i64; 4]> {
    let rank = shape.len();
    let mut strides: SmallVec<[i64; 4]> = smallvec::smallvec![0; rank];
    let mut stride: i64 = 1;
    for i in 0..rank {
        let idx = rank - 1 - i;
        strides[idx] = stride;
        let extent = match tile.len().checked_sub(1 + i) {
            Some(tile_idx) => shape[idx].div_ceil(tile[tile_idx]),
            None => shape[idx],
        };
        stride *= extent as i64;
    }
    strides
}

/// Whether `layout` records the canonical strides for `shape` under its primary tile.
pub fn is_contiguous(shape: &[usize], layout: &TiledLayout) -> bool {
    compute_tile_strides(shape, layout.primary_tile().dimensions()).as_slice() == layout.tile_strides()
}

/// Drop the strides of squeezed dimensions.
///
/// `dropped` must be in descending order, as produced by
/// [`squeezed_dims`](crate::shape::squeezed_dims), so that removing an entry
/// never shifts the index of one still to be removed.
pub fn squeeze_tile_strides(strides: &[i64], dropped: &[usize]) -> SmallVec<[i64; 4]> {
    let mut strides: SmallVec<[i64; 4]> = SmallVec::from_slice(strides);
    for &index in dropped {
        strides.remove(index);
    }
    strides
}
