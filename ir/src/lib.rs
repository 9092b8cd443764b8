//! Intermediate representation for tiled memory layouts.
//!
//! This crate defines the IR the layout passes operate on: memref and vector
//! types, tiled layout descriptors, the operation graph, and the verifiers and
//! canonicalizers of the memref view operations.
//!
//! # Module Organization
//!
//! - [`tiling`] - Tile descriptors and tiled layouts
//! - [`strides`] - Tile stride computation
//! - [`shape`] - Static and dynamic extents
//! - [`types`] - Memref, vector and scalar value types
//! - [`op`] - Closed set of operation kinds
//! - [`graph`] - Arena-backed operation graph with use forwarding
//! - [`builder`] - Typed op constructors
//! - [`verify`] - Per-kind verifiers and the capability table
//! - [`canonicalize`] - Layout-erasure push-down and tile-grid folds
//! - [`pattern`], [`rewrite`] - Pattern dispatch and the greedy driver
//! - [`error`] - Error types and result handling

pub mod builder;
pub mod canonicalize;
pub mod error;
pub mod graph;
pub mod op;
pub mod pattern;
pub mod rewrite;
pub mod shape;
pub mod strides;
pub mod tiling;
pub mod types;
pub mod verify;


pub use error::{Error, Result};
pub use graph::{Graph, OpId, Operation, ValueDef, ValueId};
pub use op::{OpKey, OpKind};
pub use pattern::{PatternMatcher, RewriteResult};
pub use rewrite::apply_patterns_greedily;
pub use shape::{Dim, Shape};
pub use strides::compute_tile_strides;
pub use tiling::{Tile, TiledLayout};
pub use types::{MemLayout, MemRefType, Type, VectorType};
pub use verify::{Capabilities, capabilities};

pub use tessel_dtype::{DType, MemorySpace, ScalarDType, SemaphoreKind};
