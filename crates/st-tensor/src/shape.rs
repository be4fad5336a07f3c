use crate::error::{Result, TensorError};
use std::fmt;

/// A tensor shape, wrapping a vector of dimension sizes.
///
/// An empty shape denotes a scalar, which holds exactly one element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Create a new shape from a vector of dimensions.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape { dims }
    }

    /// Create a shape from a slice of dimensions.
    pub fn from_slice(dims: &[usize]) -> Self {
        Shape {
            dims: dims.to_vec(),
        }
    }

    /// The rank-0 shape.
    pub fn scalar() -> Self {
        Shape { dims: Vec::new() }
    }

    /// Build a shape from signed dimension sizes, rejecting negative ones.
    pub fn from_signed(dims: &[i64]) -> Result<Self> {
        let mut out = Vec::with_capacity(dims.len());
        for (axis, &d) in dims.iter().enumerate() {
            if d < 0 {
                return Err(TensorError::InvalidShape(format!(
                    "dimension {} has negative size {}",
                    axis, d
                )));
            }
            let d = usize::try_from(d).map_err(|_| {
                TensorError::InvalidShape(format!("dimension {} is too large: {}", axis, d))
            })?;
            out.push(d);
        }
        Ok(Shape::new(out))
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements (product of all dimension sizes).
    ///
    /// Saturates at `usize::MAX`; use `checked_numel` where the count comes
    /// from caller input.
    pub fn numel(&self) -> usize {
        self.checked_numel().unwrap_or(usize::MAX)
    }

    /// Total number of elements, or `InvalidShape` if it does not fit in `usize`.
    pub fn checked_numel(&self) -> Result<usize> {
        if self.dims.contains(&0) {
            return Ok(0);
        }
        self.dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| {
                TensorError::InvalidShape(format!("element count of {} overflows usize", self))
            })
    }

    /// Returns the size of dimension `i`.
    ///
    /// # Panics
    /// Panics if `i >= ndim()`.
    pub fn dim(&self, i: usize) -> usize {
        self.dims[i]
    }

    /// Returns a reference to the underlying dimension sizes.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Checks that `axis` names one of this shape's dimensions.
    pub fn check_axis(&self, axis: usize) -> Result<()> {
        if axis >= self.ndim() {
            return Err(TensorError::AxisOutOfRange {
                axis,
                ndim: self.ndim(),
            });
        }
        Ok(())
    }

    /// Returns this shape with `axis` removed.
    pub fn remove_axis(&self, axis: usize) -> Result<Shape> {
        self.check_axis(axis)?;
        let mut dims = self.dims.clone();
        dims.remove(axis);
        Ok(Shape::new(dims))
    }

    /// Computes row-major contiguous strides for this shape.
    ///
    /// For a shape [d0, d1, d2], the strides are [d1*d2, d2, 1].
    pub fn strides(&self) -> Vec<usize> {
        if self.dims.is_empty() {
            return vec![];
        }
        let mut strides = vec![0usize; self.dims.len()];
        strides[self.dims.len() - 1] = 1;
        for i in (0..self.dims.len() - 1).rev() {
            // Only empty shapes can saturate here, and they never step.
            strides[i] = strides[i + 1].saturating_mul(self.dims[i + 1]);
        }
        strides
    }

    /// Checks if the given strides correspond to a contiguous (row-major) layout
    /// for this shape.
    ///
    /// Strides of size-1 axes are never used to step, so they are not compared.
    pub fn is_contiguous(&self, strides: &[usize]) -> bool {
        if strides.len() != self.dims.len() {
            return false;
        }
        if self.numel() == 0 {
            return true;
        }
        let expected = self.strides();
        self.dims
            .iter()
            .zip(strides.iter().zip(expected.iter()))
            .all(|(&d, (&s, &e))| d == 1 || s == e)
    }

    /// Converts a flat row-major index into a multi-index for this shape.
    pub fn unravel(&self, mut flat: usize) -> Result<Vec<usize>> {
        let numel = self.numel();
        if flat >= numel {
            return Err(TensorError::OutOfBounds {
                position: flat,
                len: numel,
            });
        }
        let mut index = vec![0usize; self.dims.len()];
        for (i, &d) in self.dims.iter().enumerate().rev() {
            index[i] = flat % d;
            flat /= d;
        }
        Ok(index)
    }

    /// Compute the broadcast shape of `a` and `b` using numpy-style broadcasting rules.
    ///
    /// Rules:
    /// 1. If the shapes have different numbers of dimensions, the shorter shape is
    ///    padded with ones on the left.
    /// 2. For each dimension, sizes must either be equal, or one of them must be 1.
    ///    The output dimension is the maximum of the two.
    ///
    /// The error names the offending axis in output coordinates.
    pub fn broadcast_shape(a: &Shape, b: &Shape) -> Result<Shape> {
        let max_ndim = a.ndim().max(b.ndim());
        let mut result = Vec::with_capacity(max_ndim);

        for i in 0..max_ndim {
            // Index from the right: dim at position (ndim - 1 - i) from the right
            let da = if i < a.ndim() {
                a.dims[a.ndim() - 1 - i]
            } else {
                1
            };
            let db = if i < b.ndim() {
                b.dims[b.ndim() - 1 - i]
            } else {
                1
            };

            if da == db {
                result.push(da);
            } else if da == 1 {
                result.push(db);
            } else if db == 1 {
                result.push(da);
            } else {
                return Err(TensorError::BroadcastError {
                    a: a.dims.clone(),
                    b: b.dims.clone(),
                    axis: max_ndim - 1 - i,
                    lhs: da,
                    rhs: db,
                });
            }
        }

        result.reverse();
        let shape = Shape::new(result);
        shape.checked_numel()?;
        Ok(shape)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::from_slice(dims)
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Shape::new(dims.to_vec())
    }
}

impl From<&Shape> for Shape {
    fn from(shape: &Shape) -> Self {
        shape.clone()
    }
}
