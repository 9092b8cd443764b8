//! Vector layouts and their lowering onto tile registers.
//!
//! A logical vector value is stored as a grid of physical tiles, one tile
//! register each. [`VectorLayout`] describes how elements map onto that grid;
//! this crate decomposes vectors into grids and back, and converts values
//! between layouts.
//!
//! # Module Organization
//!
//! - [`context`] - Per-pass hardware parameters
//! - [`vector_layout`] - Layout descriptor and tile-grid shape
//! - [`annotations`] - Out-of-band layout annotations on ops and values
//! - [`assemble`] - Tile-grid decomposition and reassembly
//! - [`relayout`] - Layout conversion, in registers or through scratch memory
//! - [`apply`] - Pass applying requested operand layouts
//! - [`error`] - Error types and result handling

pub mod annotations;
pub mod apply;
pub mod assemble;
pub mod context;
pub mod error;
pub mod relayout;
pub mod vector_layout;


pub use annotations::LayoutAnnotations;
pub use apply::apply_vector_layout;
pub use assemble::{TileGrid, assemble, disassemble};
pub use context::RewriteContext;
pub use error::{Error, Result};
pub use relayout::{RelayoutPlan, plan_relayout, relayout};
pub use vector_layout::{ImplicitDim, VectorLayout};
