//! Element types for tiled memory handles and vectors.
//!
//! Everything the layout core needs to know about an element is its bit width:
//! tile packing, native tiling and the physical tile type are all derived from it.


/// Memory space a memory handle lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(derive_more::Display, strum::EnumIter, strum::VariantArray)]
pub enum MemorySpace {
    /// Unconstrained; resolved by a later pass.
    #[display("any")]
    Any,
    /// Vector memory (tile-addressable scratchpad).
    #[display("vmem")]
    Vmem,
    /// Scalar memory.
    #[display("smem")]
    Smem,
    /// High-bandwidth off-chip memory.
    #[display("hbm")]
    Hbm,
    /// Semaphore memory.
    #[display("semaphore_mem")]
    SemaphoreMem,
}

/// Scalar element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(derive_more::Display, strum::EnumCount, strum::EnumIter, strum::VariantArray)]
pub enum ScalarDType {
    #[display("i1")]
    Bool,

    #[display("i4")]
    Int4,
    #[display("i8")]
    Int8,
    #[display("i16")]
    Int16,
    #[display("i32")]
    Int32,
    #[display("u8")]
    UInt8,
    #[display("u16")]
    UInt16,
    #[display("u32")]
    UInt32,

    #[display("f8e4m3")]
    FP8E4M3,
    #[display("f8e5m2")]
    FP8E5M2,
    #[display("f16")]
    Float16,
    #[display("bf16")]
    BFloat16,
    #[display("f32")]
    Float32,

    /// Index type used for memory offsets and loop bounds.
    #[display("index")]
    Index,
}

impl ScalarDType {
    pub const fn bitwidth(&self) -> usize {
        match self {
            Self::Bool => 1,
            Self::Int4 => 4,
            Self::Int8 | Self::UInt8 | Self::FP8E4M3 | Self::FP8E5M2 => 8,
            Self::Int16 | Self::UInt16 | Self::Float16 | Self::BFloat16 => 16,
            Self::Int32 | Self::UInt32 | Self::Float32 | Self::Index => 32,
        }
    }

    /// Size in bytes, rounded up for sub-byte types.
    pub const fn bytes(&self) -> usize {
        self.bitwidth().div_ceil(8)
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Int4 | Self::Int8 | Self::Int16 | Self::Int32)
    }

    pub const fn is_unsigned(&self) -> bool {
        matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32)
    }

    pub const fn is_int(&self) -> bool {
        self.is_signed() || self.is_unsigned() || matches!(self, Self::Index)
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::FP8E4M3 | Self::FP8E5M2 | Self::Float16 | Self::BFloat16 | Self::Float32)
    }
}

/// Semaphore flavours. Semaphores are only ever held in rank-0 memory handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SemaphoreKind {
    #[display("semaphore")]
    Regular,
    #[display("dma_semaphore")]
    Dma,
}

/// Element type of a memory handle or vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DType {
    #[display("{_0}")]
    Scalar(ScalarDType),
    #[display("{_0}")]
    Semaphore(SemaphoreKind),
}

impl DType {
    pub fn scalar(&self) -> Option<ScalarDType> {
        match self {
            Self::Scalar(s) => Some(*s),
            Self::Semaphore(_) => None,
        }
    }

    pub fn is_semaphore(&self) -> bool {
        matches!(self, Self::Semaphore(_))
    }

    /// Bit width of a scalar element; semaphores occupy one 32-bit word.
    pub fn bitwidth(&self) -> usize {
        match self {
            Self::Scalar(s) => s.bitwidth(),
            Self::Semaphore(_) => 32,
        }
    }
}

impl From<ScalarDType> for DType {
    fn from(scalar: ScalarDType) -> Self {
        Self::Scalar(scalar)
    }
}

// Shorthands for the common element types
#[allow(non_upper_case_globals)]
impl DType {
    pub const Bool: Self = Self::Scalar(ScalarDType::Bool);
    pub const Int4: Self = Self::Scalar(ScalarDType::Int4);
    pub const Int8: Self = Self::Scalar(ScalarDType::Int8);
    pub const Int16: Self = Self::Scalar(ScalarDType::Int16);
    pub const Int32: Self = Self::Scalar(ScalarDType::Int32);
    pub const UInt8: Self = Self::Scalar(ScalarDType::UInt8);
    pub const UInt16: Self = Self::Scalar(ScalarDType::UInt16);
    pub const UInt32: Self = Self::Scalar(ScalarDType::UInt32);
    pub const Float16: Self = Self::Scalar(ScalarDType::Float16);
    pub const BFloat16: Self = Self::Scalar(ScalarDType::BFloat16);
    pub const Float32: Self = Self::Scalar(ScalarDType::Float32);
    pub const Index: Self = Self::Scalar(ScalarDType::Index);
    pub const Sem: Self = Self::Semaphore(SemaphoreKind::Regular);
    pub const DmaSem: Self = Self::Semaphore(SemaphoreKind::Dma);
}
