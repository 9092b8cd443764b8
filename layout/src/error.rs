use smallvec::SmallVec;
use snafu::Snafu;
use tessel_dtype::ScalarDType;
use tessel_ir::{OpId, ValueId};

use crate::vector_layout::VectorLayout;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// IR construction or verification failed.
    #[snafu(context(false), display("{source}"))]
    Ir { source: tessel_ir::Error },

    // =========================================================================
    // Layout construction
    // =========================================================================
    /// Bitwidths must pack evenly into a 32-bit word.
    #[snafu(display("unsupported bitwidth {bitwidth}"))]
    UnsupportedBitwidth { bitwidth: usize },

    /// Tiling does not divide a tile register.
    #[snafu(display("tiling {tiling:?} does not divide a {bitwidth}-bit tile register"))]
    InvalidTiling { tiling: [usize; 2], bitwidth: usize },

    /// Offsets must fall inside one register slice.
    #[snafu(display("offsets {offsets:?} exceed the register slice {slice:?}"))]
    InvalidOffset { offsets: [Option<usize>; 2], slice: [usize; 2] },

    // =========================================================================
    // Vector/layout mismatch
    // =========================================================================
    /// Layout bitwidth differs from the element type.
    #[snafu(display("layout bitwidth {layout} does not match element type {element}"))]
    BitwidthMismatch { layout: usize, element: ScalarDType },

    /// The vector has fewer dimensions than the layout tiles.
    #[snafu(display("vector of rank {rank} is too small for a layout tiling {needed} dimensions"))]
    RankTooSmall { rank: usize, needed: usize },

    /// Tile grid shape does not match the vector and layout.
    #[snafu(display("tile grid of shape {actual:?} does not match expected {expected:?}"))]
    GridShapeMismatch { expected: SmallVec<[usize; 4]>, actual: SmallVec<[usize; 4]> },

    // =========================================================================
    // Annotations
    // =========================================================================
    /// Vector operand without a requested layout.
    #[snafu(display("{op}: vector operand {operand} has no layout"))]
    MissingLayout { op: OpId, operand: usize },

    /// Non-vector operand with a requested layout.
    #[snafu(display("{op}: non-vector operand {operand} cannot have a layout"))]
    UnexpectedLayout { op: OpId, operand: usize },

    /// Requested layouts and operands disagree in number.
    #[snafu(display("{op}: {actual} operand layouts for {expected} operands"))]
    LayoutCountMismatch { op: OpId, expected: usize, actual: usize },

    /// A vector value was used before any layout was assigned to it.
    #[snafu(display("{value} has no assigned layout"))]
    UnassignedLayout { value: ValueId },

    // =========================================================================
    // Relayout
    // =========================================================================
    /// Scratch memory cannot hold the relaid value.
    #[snafu(display("scratch memory exhausted: {needed} sublanes needed, {available} available"))]
    ScratchExhausted { needed: usize, available: usize },

    /// No conversion path exists between two layouts.
    #[snafu(display("unsupported relayout of vector {shape:?} from {src} to {dst}: {reason}"))]
    UnsupportedRelayout { src: VectorLayout, dst: VectorLayout, shape: SmallVec<[usize; 4]>, reason: String },
}
