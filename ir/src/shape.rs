//! Shapes with static or dynamic extents.

use std::fmt;

use smallvec::SmallVec;

/// One extent of a memref shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::From)]
pub enum Dim {
    Static(usize),
    #[from(skip)]
    Dynamic,
}

impl Dim {
    pub fn as_static(&self) -> Option<usize> {
        match self {
            Self::Static(n) => Some(*n),
            Self::Dynamic => None,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic)
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(n) => write!(f, "{n}"),
            Self::Dynamic => write!(f, "?"),
        }
    }
}

/// Memref shape. Inline capacity covers the ranks seen in practice.
pub type Shape = SmallVec<[Dim; 4]>;

/// Shape with every extent static.
///
/// ```rust
/// # use tessel_ir::shape::{Dim, static_shape};
/// assert_eq!(static_shape(&[8, 128]).as_slice(), &[Dim::Static(8), Dim::Static(128)]);
/// ```
pub fn static_shape(dims: &[usize]) -> Shape {
    dims.iter().copied().map(Dim::Static).collect()
}

/// Check if every extent is static.
pub fn is_static(shape: &[Dim]) -> bool {
    shape.iter().all(|dim| !dim.is_dynamic())
}

/// Convert to concrete extents if fully static, `None` otherwise.
pub fn to_static(shape: &[Dim]) -> Option<SmallVec<[usize; 4]>> {
    shape.iter().map(Dim::as_static).collect()
}

/// Element count of a fully static shape.
pub fn num_elements(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Dimensions of `src` that a squeeze to `dst` removes, in descending order.
///
/// Scans both shapes from the minor dimension backward. A source dimension
/// equal to the current target dimension consumes it; any other source
/// dimension must equal `unit` and is dropped. Returns `None` when `dst` is not
/// `src` with some unit dimensions deleted.
///
/// ```rust
/// # use tessel_ir::shape::squeezed_dims;
/// assert_eq!(squeezed_dims(&[1, 32, 1, 128], &[32, 128], &1).unwrap().as_slice(), &[2, 0]);
/// assert!(squeezed_dims(&[2, 32, 128], &[32, 128], &1).is_none());
/// ```
pub fn squeezed_dims<D: PartialEq>(src: &[D], dst: &[D], unit: &D) -> Option<SmallVec<[usize; 4]>> {
    let mut dropped = SmallVec::new();
    let mut target = dst.iter().rev().peekable();
    for (index, dim) in src.iter().enumerate().rev() {
        if target.peek() == Some(&dim) {
            target.next();
        } else if dim == unit {
            dropped.push(index);
        } else {
            return None;
        }
    }
    target.next().is_none().then_some(dropped)
}

pub(crate) fn format_dims<T: fmt::Display>(f: &mut fmt::Formatter<'_>, dims: &[T]) -> fmt::Result {
    for dim in dims {
        write!(f, "{dim}x")?;
    }
    Ok(())
}
