//! Value types: memory handles, vectors, indices and scalars.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;
use snafu::ensure;
use tessel_dtype::{DType, MemorySpace, ScalarDType};

use crate::Result;
use crate::error::LayoutRankMismatchSnafu;
use crate::shape::{Shape, format_dims, to_static};
use crate::tiling::TiledLayout;

/// Layout of a memref.
///
/// `Identity` plays the role of "unset": a memref type can't carry a null layout,
/// so the default mapping stands in for "not yet propagated".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemLayout {
    Identity,
    Tiled(Arc<TiledLayout>),
}

impl MemLayout {
    pub fn tiled(layout: TiledLayout) -> Self {
        Self::Tiled(Arc::new(layout))
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }

    pub fn as_tiled(&self) -> Option<&TiledLayout> {
        match self {
            Self::Identity => None,
            Self::Tiled(layout) => Some(layout),
        }
    }
}

impl fmt::Display for MemLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => write!(f, "identity"),
            Self::Tiled(layout) => write!(f, "{layout}"),
        }
    }
}

/// Type of a memory handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemRefType {
    shape: Shape,
    element: DType,
    layout: MemLayout,
    memory_space: Option<MemorySpace>,
}

impl MemRefType {
    pub fn new(
        shape: impl Into<Shape>,
        element: DType,
        layout: MemLayout,
        memory_space: Option<MemorySpace>,
    ) -> Result<Self> {
        let shape = shape.into();
        if let MemLayout::Tiled(tiled) = &layout {
            let strides = tiled.tile_strides().len();
            ensure!(strides == shape.len(), LayoutRankMismatchSnafu { rank: shape.len(), strides });
        }
        Ok(Self { shape, element, layout, memory_space })
    }

    /// Memref with the identity layout, which never fails to build.
    pub fn identity(shape: impl Into<Shape>, element: DType, memory_space: Option<MemorySpace>) -> Self {
        Self { shape: shape.into(), element, layout: MemLayout::Identity, memory_space }
    }

    pub fn shape(&self) -> &[crate::shape::Dim] {
        &self.shape
    }

    pub fn static_shape(&self) -> Option<SmallVec<[usize; 4]>> {
        to_static(&self.shape)
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn num_dynamic_dims(&self) -> usize {
        self.shape.iter().filter(|dim| dim.is_dynamic()).count()
    }

    pub fn element(&self) -> DType {
        self.element
    }

    pub fn layout(&self) -> &MemLayout {
        &self.layout
    }

    pub fn memory_space(&self) -> Option<MemorySpace> {
        self.memory_space
    }

    /// Same element type and memory space, new shape and layout.
    pub fn reshaped(&self, shape: impl Into<Shape>, layout: MemLayout) -> Result<Self> {
        Self::new(shape, self.element, layout, self.memory_space)
    }
}

impl fmt::Display for MemRefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "memref<")?;
        format_dims(f, &self.shape)?;
        write!(f, "{}", self.element)?;
        if let MemLayout::Tiled(layout) = &self.layout {
            write!(f, ", {layout}")?;
        }
        if let Some(space) = self.memory_space {
            write!(f, ", #{space}")?;
        }
        write!(f, ">")
    }
}

/// Type of a logical or physical (single tile) vector value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VectorType {
    shape: SmallVec<[usize; 4]>,
    element: ScalarDType,
}

impl VectorType {
    pub fn new(shape: impl IntoIterator<Item = usize>, element: ScalarDType) -> Self {
        Self { shape: shape.into_iter().collect(), element }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn element(&self) -> ScalarDType {
        self.element
    }

    pub fn num_elements(&self) -> usize {
        self.shape.iter().product()
    }
}

impl fmt::Display for VectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vector<")?;
        format_dims(f, &self.shape)?;
        write!(f, "{}>", self.element)
    }
}

/// Type of an SSA value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::From)]
pub enum Type {
    MemRef(MemRefType),
    Vector(VectorType),
    #[from(skip)]
    Index,
    Scalar(ScalarDType),
}

impl Type {
    pub fn as_memref(&self) -> Option<&MemRefType> {
        match self {
            Self::MemRef(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&VectorType> {
        match self {
            Self::Vector(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Vector(_))
    }

    pub fn is_memref(&self) -> bool {
        matches!(self, Self::MemRef(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MemRef(ty) => write!(f, "{ty}"),
            Self::Vector(ty) => write!(f, "{ty}"),
            Self::Index => write!(f, "index"),
            Self::Scalar(ty) => write!(f, "{ty}"),
        }
    }
}
