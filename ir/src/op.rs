//! Operation kinds.
//!
//! [`OpKind`] is the closed set of operations the layout core understands. Each
//! variant carries its attributes; operands and results live in the graph.
//! [`OpKey`] is the fieldless discriminant used for capability lookup and
//! pattern indexing.
//!
//! Operand conventions (variadic groups are sized by the attributes):
//!
//! | Kind               | Operands                                                      | Results        |
//! |--------------------|---------------------------------------------------------------|----------------|
//! | `EraseLayout`      | memref                                                        | memref         |
//! | `MemRefSlice`      | memref, base indices.., dynamic sizes..                       | memref         |
//! | `MemRefSqueeze`    | memref                                                        | memref         |
//! | `MemRefReshape`    | memref                                                        | memref         |
//! | `ReinterpretCast`  | memref                                                        | memref         |
//! | `StridedLoad`      | memref, indices..                                             | vector         |
//! | `StridedStore`     | vector, memref, indices..                                     | -              |
//! | `Rotate`           | vector                                                        | vector         |
//! | `DynamicRotate`    | vector, amount                                                | vector         |
//! | `MaskCast`         | vector                                                        | vector         |
//! | `SemaphoreSignal`  | semaphore, amount, [device id], [core id]                     | -              |
//! | `SemaphoreWait`    | semaphore, amount                                             | -              |
//! | `EnqueueDma`       | source, [source semaphore], target, target semaphore, [device id], [core id] | - |
//! | `WaitDma`          | semaphore, memref                                             | -              |
//! | `RollVectors`      | tiles..                                                       | vector         |
//! | `UnrollVectors`    | vector                                                        | tiles..        |
//! | `SelectTiles`      | low tile, high tile                                           | tile           |
//! | `VectorStore`      | vector, memref                                                | -              |
//! | `VectorLoad`       | memref                                                        | vector         |

use smallvec::SmallVec;

/// Operation with its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::EnumDiscriminants)]
#[strum_discriminants(name(OpKey), derive(Hash, strum::IntoStaticStr, strum::EnumIter))]
pub enum OpKind {
    // Index constants
    Constant { value: i64 },

    // Memref views
    EraseLayout,
    MemRefSlice { base_indices: usize, dynamic_sizes: usize },
    MemRefSqueeze,
    MemRefReshape,
    ReinterpretCast,
    InternalScratch,

    // Memory access
    StridedLoad { strides: SmallVec<[i32; 4]> },
    StridedStore { strides: SmallVec<[i32; 4]> },
    VectorLoad,
    VectorStore,

    // Tile register operations
    Rotate { amount: i32, dimension: i32, stride: Option<i32>, stride_dimension: Option<i32> },
    DynamicRotate { dimension: i32, stride: Option<i32>, stride_dimension: Option<i32> },
    MaskCast,
    /// Elements below `split` along `dimension` come from the first operand, the rest from the second.
    SelectTiles { dimension: usize, split: usize },
    RollVectors,
    UnrollVectors,

    // Synchronization
    GetBarrierSemaphore,
    SemaphoreSignal { has_device_id: bool, has_core_id: bool },
    SemaphoreWait,
    EnqueueDma { has_source_semaphore: bool, has_device_id: bool, has_core_id: bool },
    WaitDma,

    // Structure
    Region,
    /// Operation owned by an external dialect; carried through untouched.
    Opaque { name: String },
}

impl OpKind {
    pub fn key(&self) -> OpKey {
        OpKey::from(self)
    }

    /// Printable operation name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Constant { .. } => "constant",
            Self::EraseLayout => "erase_memref_layout",
            Self::MemRefSlice { .. } => "memref_slice",
            Self::MemRefSqueeze => "memref_squeeze",
            Self::MemRefReshape => "memref_reshape",
            Self::ReinterpretCast => "reinterpret_cast",
            Self::InternalScratch => "internal_scratch",
            Self::StridedLoad { .. } => "strided_load",
            Self::StridedStore { .. } => "strided_store",
            Self::VectorLoad => "vector_load",
            Self::VectorStore => "vector_store",
            Self::Rotate { .. } => "rotate",
            Self::DynamicRotate { .. } => "dynamic_rotate",
            Self::MaskCast => "mask_cast",
            Self::SelectTiles { .. } => "select_tiles",
            Self::RollVectors => "roll_vectors",
            Self::UnrollVectors => "unroll_vectors",
            Self::GetBarrierSemaphore => "sem_barrier",
            Self::SemaphoreSignal { .. } => "sem_signal",
            Self::SemaphoreWait => "sem_wait",
            Self::EnqueueDma { .. } => "enqueue_dma",
            Self::WaitDma => "wait_dma",
            Self::Region => "region",
            Self::Opaque { .. } => "opaque",
        }
    }

    /// Whether the op may be deleted once its results are unused.
    ///
    /// Reads count as removable; anything that writes memory or synchronizes does not.
    pub fn is_removable(&self) -> bool {
        !matches!(
            self,
            Self::StridedStore { .. }
                | Self::VectorStore
                | Self::GetBarrierSemaphore
                | Self::SemaphoreSignal { .. }
                | Self::SemaphoreWait
                | Self::EnqueueDma { .. }
                | Self::WaitDma
                | Self::Region
                | Self::Opaque { .. }
        )
    }
}
