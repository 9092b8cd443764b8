//! Tiled memory layouts.
//!
//! A [`TiledLayout`] groups the trailing dimensions of a memref into fixed-size
//! tiles and records, per memref dimension, the stride between consecutive tiles.
//! Strides are counted in tiles, not elements. Layouts are immutable values; a
//! transform that changes the layout builds a new one.

use std::fmt;

use smallvec::SmallVec;
use snafu::ensure;

use crate::Result;
use crate::error::{EmptyTilingSnafu, InvalidTileSnafu, TileStrideCountSnafu};
use crate::strides::compute_tile_strides;

/// One tile descriptor: the extents of a tile over the trailing dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tile(SmallVec<[usize; 2]>);

impl Tile {
    pub fn new(dims: impl IntoIterator<Item = usize>) -> Result<Self> {
        let dims: SmallVec<[usize; 2]> = dims.into_iter().collect();
        ensure!(!dims.is_empty() && dims.iter().all(|&d| d > 0), InvalidTileSnafu { dims });
        Ok(Self(dims))
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "({})", dims.join(","))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TiledLayout {
    tiles: SmallVec<[Tile; 2]>,
    tile_strides: SmallVec<[i64; 4]>,
}

impl TiledLayout {
    /// Build a layout from tile descriptors and per-dimension tile strides.
    ///
    /// Only the first tile decides how strides are interpreted, so the stride
    /// vector must cover at least the dimensions that tile spans.
    pub fn new(
        tiles: impl IntoIterator<Item = Tile>,
        tile_strides: impl IntoIterator<Item = i64>,
    ) -> Result<Self> {
        let tiles: SmallVec<[Tile; 2]> = tiles.into_iter().collect();
        let tile_strides: SmallVec<[i64; 4]> = tile_strides.into_iter().collect();
        ensure!(!tiles.is_empty(), EmptyTilingSnafu);
        ensure!(
            tile_strides.len() >= tiles[0].rank(),
            TileStrideCountSnafu { tile: tiles[0].0.clone(), strides: tile_strides }
        );
        Ok(Self { tiles, tile_strides })
    }

    /// Contiguous row-major layout of `shape` under a single tile.
    pub fn contiguous(shape: &[usize], tile: Tile) -> Result<Self> {
        let strides = compute_tile_strides(shape, tile.dimensions());
        Self::new([tile], strides)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// The tile every memref transform works with.
    pub fn primary_tile(&self) -> &Tile {
        &self.tiles[0]
    }

    pub fn tile_strides(&self) -> &[i64] {
        &self.tile_strides
    }

    /// Same tiles, new strides.
    pub fn with_tile_strides(&self, tile_strides: impl IntoIterator<Item = i64>) -> Result<Self> {
        Self::new(self.tiles.iter().cloned(), tile_strides)
    }
}

impl fmt::Display for TiledLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#tiled<")?;
        for tile in &self.tiles {
            write!(f, "{tile}")?;
        }
        let strides: Vec<String> = self.tile_strides.iter().map(ToString::to_string).collect();
        write!(f, ", [{}]>", strides.join(","))
    }
}
