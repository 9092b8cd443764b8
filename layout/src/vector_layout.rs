//! Mapping of a logical vector onto a grid of tile registers.
//!
//! The two trailing dimensions of a vector (after inserting the implicit
//! dimension, if any) are tiled; leading dimensions index the grid directly.
//! Each tile register holds `tiles_per_vreg` tiles of shape `tiling` laid
//! side by side along lanes, so one register covers a `vreg_slice` of the
//! tiled dimensions. Offsets place element 0 inside the first slice; an unset
//! offset means the value is replicated along that dimension.

use std::fmt;

use smallvec::SmallVec;
use snafu::ensure;
use tessel_dtype::ScalarDType;
use tessel_ir::VectorType;

use crate::error::*;

/// Logical dimension the layout adds in front of the tiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ImplicitDim {
    #[default]
    None,
    /// A unit minor dimension follows the vector shape.
    Minor,
    /// A unit dimension sits before the minor dimension.
    SecondMinor,
}

/// Element offset inside a register slice, `None` when replicated.
pub type LayoutOffset = Option<usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VectorLayout {
    bitwidth: usize,
    offsets: [LayoutOffset; 2],
    tiling: [usize; 2],
    implicit_dim: ImplicitDim,
}

impl VectorLayout {
    pub fn new(bitwidth: usize, offsets: [LayoutOffset; 2], tiling: [usize; 2], implicit_dim: ImplicitDim) -> Result<Self> {
        ensure!(matches!(bitwidth, 4 | 8 | 16 | 32), UnsupportedBitwidthSnafu { bitwidth });
        ensure!(tiling.iter().all(|&t| t > 0), InvalidTilingSnafu { tiling, bitwidth });
        Ok(Self { bitwidth, offsets, tiling, implicit_dim })
    }

    /// Zero offsets and the native tiling: one full register per tile.
    pub fn native(bitwidth: usize, target: [usize; 2]) -> Result<Self> {
        ensure!(matches!(bitwidth, 4 | 8 | 16 | 32), UnsupportedBitwidthSnafu { bitwidth });
        let packing = 32 / bitwidth;
        Self::new(bitwidth, [Some(0), Some(0)], [target[0] * packing, target[1]], ImplicitDim::None)
    }

    pub fn bitwidth(&self) -> usize {
        self.bitwidth
    }

    pub fn offsets(&self) -> [LayoutOffset; 2] {
        self.offsets
    }

    pub fn tiling(&self) -> [usize; 2] {
        self.tiling
    }

    pub fn implicit_dim(&self) -> ImplicitDim {
        self.implicit_dim
    }

    /// Elements per 32-bit word.
    pub fn packing(&self) -> usize {
        32 / self.bitwidth
    }

    /// Number of logical dimensions the tiling covers.
    pub fn layout_rank(&self) -> usize {
        match self.implicit_dim {
            ImplicitDim::None => 2,
            ImplicitDim::Minor | ImplicitDim::SecondMinor => 1,
        }
    }

    pub fn tiles_per_vreg(&self, target: [usize; 2]) -> usize {
        (self.packing() * target[0] * target[1]) / (self.tiling[0] * self.tiling[1])
    }

    /// Extent of the tiled dimensions one register covers.
    pub fn vreg_slice(&self, target: [usize; 2]) -> [usize; 2] {
        [self.tiling[0], self.tiles_per_vreg(target) * self.tiling[1]]
    }

    pub fn has_native_tiling(&self, target: [usize; 2]) -> bool {
        self.tiling == [target[0] * self.packing(), target[1]]
    }

    /// Check the layout against a register shape.
    pub fn validate(&self, target: [usize; 2]) -> Result<()> {
        let register = self.packing() * target[0] * target[1];
        let tile = self.tiling[0] * self.tiling[1];
        ensure!(
            tile <= register && register % tile == 0,
            InvalidTilingSnafu { tiling: self.tiling, bitwidth: self.bitwidth }
        );
        let slice = self.vreg_slice(target);
        let in_slice = self.offsets.iter().zip(slice).all(|(offset, extent)| offset.is_none_or(|o| o < extent));
        ensure!(in_slice, InvalidOffsetSnafu { offsets: self.offsets, slice });
        Ok(())
    }

    /// Whether the layout can describe a vector of `element`.
    ///
    /// Masks have no storage bitwidth of their own and take whatever the layout says.
    pub fn check_element(&self, element: ScalarDType) -> Result<()> {
        ensure!(
            element == ScalarDType::Bool || element.bitwidth() == self.bitwidth,
            BitwidthMismatchSnafu { layout: self.bitwidth, element }
        );
        Ok(())
    }

    /// `shape` with the implicit dimension inserted.
    pub fn implicit_shape(&self, shape: &[usize]) -> SmallVec<[usize; 4]> {
        let mut implicit = SmallVec::from_slice(shape);
        match self.implicit_dim {
            ImplicitDim::None => {}
            ImplicitDim::Minor => implicit.push(1),
            ImplicitDim::SecondMinor => implicit.insert(implicit.len().saturating_sub(1), 1),
        }
        implicit
    }

    /// Shape of the tile grid storing a vector of `shape`.
    ///
    /// The two tiled extents become `ceil((offset + extent) / slice)`, or 1
    /// when replicated. With `implicit` the grid keeps the implicit dimension,
    /// so it always ends in exactly two tiled dimensions.
    pub fn tile_array_shape(&self, shape: &[usize], implicit: bool, target: [usize; 2]) -> Result<SmallVec<[usize; 4]>> {
        ensure!(shape.len() >= self.layout_rank(), RankTooSmallSnafu { rank: shape.len(), needed: self.layout_rank() });
        let mut grid = self.implicit_shape(shape);
        let rank = grid.len();
        let slice = self.vreg_slice(target);
        for i in 0..2 {
            let extent = &mut grid[rank - 2 + i];
            *extent = match self.offsets[i] {
                Some(offset) => (offset + *extent).div_ceil(slice[i]),
                None => 1,
            };
        }
        if !implicit {
            match self.implicit_dim {
                ImplicitDim::None => {}
                ImplicitDim::Minor => {
                    grid.pop();
                }
                ImplicitDim::SecondMinor => {
                    grid.remove(rank - 2);
                }
            }
        }
        Ok(grid)
    }

    /// Type of one tile register holding elements of this layout.
    pub fn tile_type(&self, element: ScalarDType, target: [usize; 2]) -> VectorType {
        match self.packing() {
            1 => VectorType::new(target, element),
            packing => VectorType::new([target[0], target[1], packing], element),
        }
    }

    pub fn with_offsets(self, offsets: [LayoutOffset; 2]) -> Self {
        Self { offsets, ..self }
    }

    pub fn with_offset(self, dim: usize, offset: LayoutOffset) -> Self {
        let mut offsets = self.offsets;
        offsets[dim] = offset;
        Self { offsets, ..self }
    }

    pub fn with_implicit_dim(self, implicit_dim: ImplicitDim) -> Self {
        Self { implicit_dim, ..self }
    }
}

impl fmt::Display for VectorLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let offset = |o: LayoutOffset| o.map_or_else(|| "*".to_string(), |o| o.to_string());
        write!(
            f,
            "vpad<{},{{{},{}}},({},{})",
            self.bitwidth,
            offset(self.offsets[0]),
            offset(self.offsets[1]),
            self.tiling[0],
            self.tiling[1]
        )?;
        match self.implicit_dim {
            ImplicitDim::None => write!(f, ">"),
            ImplicitDim::Minor => write!(f, ",-1>"),
            ImplicitDim::SecondMinor => write!(f, ",-2>"),
        }
    }
}
