use smallvec::SmallVec;
use snafu::Snafu;
use tessel_dtype::{DType, MemorySpace};

use crate::graph::{OpId, ValueId};
use crate::shape::Dim;
use crate::types::{MemLayout, Type};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    // =========================================================================
    // Tiled layout construction
    // =========================================================================
    /// A tiled layout needs at least one tile.
    #[snafu(display("tiled layout requires at least one tile"))]
    EmptyTiling,

    /// Tile dimensions must be positive.
    #[snafu(display("invalid tile {dims:?}: every tile dimension must be positive"))]
    InvalidTile { dims: SmallVec<[usize; 2]> },

    /// The tile strides cannot cover the dimensions the tile applies to.
    #[snafu(display("tile {tile:?} applies to {} trailing dimensions but only {} tile strides were given", tile.len(), strides.len()))]
    TileStrideCount { tile: SmallVec<[usize; 2]>, strides: SmallVec<[i64; 4]> },

    /// A tiled memref needs one tile stride per dimension.
    #[snafu(display("memref of rank {rank} cannot carry {strides} tile strides"))]
    LayoutRankMismatch { rank: usize, strides: usize },

    // =========================================================================
    // Shape/rank mismatches
    // =========================================================================
    /// An operation needed static extents but found a dynamic one.
    #[snafu(display("{what} requires a static shape, got {shape:?}"))]
    DynamicShape { what: &'static str, shape: SmallVec<[Dim; 4]> },

    /// Wrong number of operands for the operation kind.
    #[snafu(display("expected {expected} operands, got {actual}"))]
    OperandCount { expected: usize, actual: usize },

    /// Wrong number of results for the operation kind.
    #[snafu(display("expected {expected} results, got {actual}"))]
    ResultCount { expected: usize, actual: usize },

    /// Operand or result has the wrong kind of type.
    #[snafu(display("expected {expected}, got {actual}"))]
    UnexpectedType { expected: &'static str, actual: Type },

    /// Number of index operands does not match a rank.
    #[snafu(display("{what}: rank {rank} does not match {count} indices"))]
    IndexCountMismatch { what: &'static str, rank: usize, count: usize },

    /// Slice result is not contained in its source.
    #[snafu(display("slice result {dst:?} does not fit into source {src:?}"))]
    SliceOutOfBounds { src: SmallVec<[Dim; 4]>, dst: SmallVec<[Dim; 4]> },

    /// Slice declares a different number of dynamic sizes than its result type has.
    #[snafu(display("slice has {actual} dynamic size operands but the result has {expected} dynamic dimensions"))]
    DynamicSizeCount { expected: usize, actual: usize },

    /// Element types of source and target disagree.
    #[snafu(display("element types don't match: {src} vs {dst}"))]
    ElementTypeMismatch { src: DType, dst: DType },

    /// Squeeze target is not the source with some unit dimensions removed.
    #[snafu(display("target shape is not valid. Source shape: {src:?}. Target shape: {dst:?}"))]
    InvalidSqueeze { src: SmallVec<[Dim; 4]>, dst: SmallVec<[Dim; 4]> },

    /// Reshape changes the element count.
    #[snafu(display("the number of elements in the memrefs don't match: {src} vs {dst}"))]
    ReshapeElementCount { src: usize, dst: usize },

    /// Reshape of rank < 2 memrefs.
    #[snafu(display("not implemented: 1d memref reshape (source rank {src_rank}, target rank {dst_rank})"))]
    ReshapeRank { src_rank: usize, dst_rank: usize },

    /// Strided access rank checks.
    #[snafu(display("base memref's rank and {what} do not match: {rank} vs {len}"))]
    StridedRankMismatch { what: &'static str, rank: usize, len: usize },

    /// Strided access with a non-positive stride.
    #[snafu(display("strides[{index}]={stride} must be >= 1"))]
    NonPositiveStride { index: usize, stride: i32 },

    /// Rotation dimension out of range.
    #[snafu(display("invalid dimension: {dimension} (rank {rank})"))]
    RotateDimension { dimension: i32, rank: usize },

    /// Rotation stride dimension out of range.
    #[snafu(display("invalid stride dimension: {dimension} (rank {rank})"))]
    RotateStrideDimension { dimension: i32, rank: usize },

    /// Negative rotation stride.
    #[snafu(display("rotate stride must be >= 0 if it is specified, got {stride}"))]
    RotateNegativeStride { stride: i32 },

    /// Stride and stride dimension must come together.
    #[snafu(display("expected either none or both stride and stride dimension are present"))]
    RotateStridePresence,

    /// Mask cast shape rules.
    #[snafu(display("invalid mask cast from {input} to {output}"))]
    InvalidMaskCast { input: Type, output: Type },

    /// Semaphore handles are rank 0.
    #[snafu(display("{what} must be rank 0, got rank {rank}"))]
    SemaphoreRank { what: &'static str, rank: usize },

    /// Remote DMA needs a source semaphore.
    #[snafu(display("DMA source semaphore must be specified when device_id or core_id is specified"))]
    SourceSemaphoreRequired,

    /// Regions may not yield memory handles.
    #[snafu(display("region result cannot be a memref: {ty}"))]
    RegionResultMemRef { ty: Type },

    /// Vector does not fit the memref it is stored to or loaded from.
    #[snafu(display("vector {vector} does not fit memref {memref}"))]
    VectorMemRefMismatch { vector: Type, memref: Type },

    // =========================================================================
    // Layout incompatibility
    // =========================================================================
    /// Memory spaces of source and target disagree.
    #[snafu(display("memory spaces do not match: {src:?} vs {dst:?}"))]
    MemorySpaceMismatch { src: Option<MemorySpace>, dst: Option<MemorySpace> },

    /// Layouts of source and target disagree.
    #[snafu(display("layouts do not match: {src} vs {dst}"))]
    LayoutMismatch { src: MemLayout, dst: MemLayout },

    /// Reinterpret casts need explicit, matching memory spaces.
    #[snafu(display("reinterpret cast requires matching explicit memory spaces: {src:?} vs {dst:?}"))]
    ReinterpretMemorySpace { src: Option<MemorySpace>, dst: Option<MemorySpace> },

    /// Reshape to a tiled target from an untiled source.
    #[snafu(display("expected a tiled layout for the input memref"))]
    ReshapeUntiledSource,

    /// Reshape between different tilings.
    #[snafu(display("expected the same tiling for the input and output memref: {src} vs {dst}"))]
    ReshapeTilingMismatch { src: MemLayout, dst: MemLayout },

    // =========================================================================
    // Unsupported transforms
    // =========================================================================
    /// Reshape only understands 2D tiles.
    #[snafu(display("not implemented: memref reshape with {rank}D tiling"))]
    ReshapeTileRank { rank: usize },

    /// Reshape of a non-contiguous memref.
    #[snafu(display("not implemented: reshape on a non-contiguous memref (tile strides {actual:?}, contiguous {expected:?})"))]
    ReshapeNonContiguous { expected: SmallVec<[i64; 4]>, actual: SmallVec<[i64; 4]> },

    /// Reshape that changes the minor dimension.
    #[snafu(display("expected the minormost dimension to be unchanged: {src} vs {dst}"))]
    ReshapeMinorChanged { src: usize, dst: usize },

    /// Reshape that changes an unaligned second-minor dimension.
    #[snafu(display("expected the 2nd minor dimension is aligned to the tile: {src} vs {dst} with tile rows {tile}"))]
    ReshapeSecondMinorUnaligned { src: usize, dst: usize, tile: usize },

    // =========================================================================
    // Graph misuse
    // =========================================================================
    /// Operation was erased but is still referenced.
    #[snafu(display("{op} was erased"))]
    ErasedOp { op: OpId },

    /// Replacement value count differs from the op's result count.
    #[snafu(display("{op} has {expected} results but {actual} replacements were given"))]
    ReplacementCount { op: OpId, expected: usize, actual: usize },

    /// Replacement value has a different type.
    #[snafu(display("cannot replace {from} of type {from_ty} with {to} of type {to_ty}"))]
    ReplacementType { from: ValueId, from_ty: Type, to: ValueId, to_ty: Type },

    /// A verifier rejected an operation.
    #[snafu(display("'{name}' {op}: {cause}"))]
    Verification { op: OpId, name: &'static str, cause: Box<Error> },
}
