use crate::error::{Result, TensorError};
use crate::shape::Shape;

/// How a flat storage buffer is interpreted as an N-dimensional array.
///
/// The element at multi-index `(i0, .., in-1)` lives at storage position
/// `offset + i0 * strides[0] + .. + in-1 * strides[n-1]`. A stride of zero
/// repeats one storage slot along that axis (broadcasting).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Shape,
    strides: Vec<usize>,
    offset: usize,
}

impl Layout {
    /// Canonical row-major layout for `shape`, starting at offset 0.
    pub fn contiguous(shape: Shape) -> Self {
        let strides = shape.strides();
        Layout {
            shape,
            strides,
            offset: 0,
        }
    }

    /// Create a layout from explicit strides.
    ///
    /// Fails with `InvalidShape` if `strides` does not have one entry per axis
    /// or the element count does not fit in `usize`.
    pub fn new(shape: Shape, strides: Vec<usize>, offset: usize) -> Result<Self> {
        shape.checked_numel()?;
        if shape.ndim() != strides.len() {
            return Err(TensorError::InvalidShape(format!(
                "shape {} has {} dimensions but {} strides were given",
                shape,
                shape.ndim(),
                strides.len()
            )));
        }
        Ok(Layout {
            shape,
            strides,
            offset,
        })
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    pub fn elem_count(&self) -> usize {
        self.shape.numel()
    }

    /// True when the logical elements occupy a dense row-major run of storage.
    pub fn is_contiguous(&self) -> bool {
        self.shape.is_contiguous(&self.strides)
    }

    /// True for the layout a fresh allocation gets: contiguous at offset 0.
    pub fn is_canonical(&self) -> bool {
        self.is_contiguous() && self.offset == 0
    }

    /// Largest storage position any valid index can reach, or `None` when the
    /// layout addresses no elements at all or the position overflows `usize`.
    pub fn max_position(&self) -> Option<usize> {
        if self.shape.dims().contains(&0) {
            return None;
        }
        self.shape
            .dims()
            .iter()
            .zip(self.strides.iter())
            .try_fold(self.offset, |acc, (&d, &s)| {
                (d - 1).checked_mul(s).and_then(|step| acc.checked_add(step))
            })
    }

    /// Checks that every reachable storage position is below `storage_len`.
    ///
    /// A position too large for `usize` is reported as `usize::MAX`.
    pub fn validate(&self, storage_len: usize) -> Result<()> {
        if self.shape.dims().contains(&0) {
            return Ok(());
        }
        match self.max_position() {
            Some(position) if position < storage_len => Ok(()),
            position => Err(TensorError::OutOfBounds {
                position: position.unwrap_or(usize::MAX),
                len: storage_len,
            }),
        }
    }

    /// Resolves a multi-index to its storage position.
    pub fn position(&self, indices: &[usize]) -> Result<usize> {
        if indices.len() != self.ndim() {
            return Err(TensorError::RankMismatch {
                expected: self.ndim(),
                got: indices.len(),
            });
        }
        let mut pos = self.offset;
        for (axis, ((&index, &size), &stride)) in indices
            .iter()
            .zip(self.shape.dims())
            .zip(self.strides.iter())
            .enumerate()
        {
            if index >= size {
                return Err(TensorError::IndexOutOfRange { axis, index, size });
            }
            pos += index * stride;
        }
        Ok(pos)
    }

    /// Iterates storage positions in logical row-major order.
    pub fn positions(&self) -> StridedIndex<'_> {
        StridedIndex::new(self)
    }

    /// Drops `axis`, fixing it at `index`.
    pub fn select(&self, axis: usize, index: usize) -> Result<Layout> {
        self.shape.check_axis(axis)?;
        let size = self.shape.dim(axis);
        if index >= size {
            return Err(TensorError::IndexOutOfRange { axis, index, size });
        }
        let mut dims = self.shape.dims().to_vec();
        let mut strides = self.strides.clone();
        dims.remove(axis);
        let stride = strides.remove(axis);
        Ok(Layout {
            shape: Shape::new(dims),
            strides,
            offset: self.offset + index * stride,
        })
    }

    /// Reorders axes: output axis `i` is input axis `axes[i]`.
    pub fn permute(&self, axes: &[usize]) -> Result<Layout> {
        let ndim = self.ndim();
        let invalid = || TensorError::InvalidPermutation {
            axes: axes.to_vec(),
            ndim,
        };
        if axes.len() != ndim {
            return Err(invalid());
        }
        let mut seen = vec![false; ndim];
        for &a in axes {
            if a >= ndim || seen[a] {
                return Err(invalid());
            }
            seen[a] = true;
        }
        let dims = self.shape.dims();
        Ok(Layout {
            shape: Shape::new(axes.iter().map(|&a| dims[a]).collect()),
            strides: axes.iter().map(|&a| self.strides[a]).collect(),
            offset: self.offset,
        })
    }

    /// Swaps the two axes of a matrix layout.
    pub fn transpose(&self) -> Result<Layout> {
        if self.ndim() != 2 {
            return Err(TensorError::UnsupportedRank {
                op: "transpose",
                expected: 2,
                got: self.ndim(),
            });
        }
        self.permute(&[1, 0])
    }

    /// Stretches this layout to `target` by giving broadcast axes a zero stride.
    ///
    /// Axes are aligned from the right; missing leading axes and size-1 axes
    /// that grow become stride 0. Real axes keep their stride.
    pub fn broadcast_as(&self, target: &Shape) -> Result<Layout> {
        target.checked_numel()?;
        let src = self.shape.dims();
        let tgt = target.dims();
        let mismatch = |axis: usize, size: usize| TensorError::BroadcastError {
            a: src.to_vec(),
            b: tgt.to_vec(),
            axis,
            lhs: size,
            rhs: tgt[axis],
        };
        if src.len() > tgt.len() {
            let extra = src.len() - tgt.len();
            return match src[..extra].iter().position(|&d| d != 1) {
                Some(axis) => Err(TensorError::BroadcastError {
                    a: src.to_vec(),
                    b: tgt.to_vec(),
                    axis,
                    lhs: src[axis],
                    rhs: 1,
                }),
                None => {
                    // Leading unit axes are dropped; they never advance.
                    let trimmed = Layout {
                        shape: Shape::from_slice(&src[extra..]),
                        strides: self.strides[extra..].to_vec(),
                        offset: self.offset,
                    };
                    trimmed.broadcast_as(target)
                }
            };
        }

        let lead = tgt.len() - src.len();
        let mut strides = vec![0usize; tgt.len()];
        for (axis, &size) in tgt.iter().enumerate() {
            if axis < lead {
                continue;
            }
            let src_size = src[axis - lead];
            if src_size == size {
                strides[axis] = self.strides[axis - lead];
            } else if src_size != 1 {
                return Err(mismatch(axis, src_size));
            }
        }
        Ok(Layout {
            shape: target.clone(),
            strides,
            offset: self.offset,
        })
    }
}

/// Iterator over the storage positions of a layout, outermost axis slowest.
#[derive(Debug)]
pub struct StridedIndex<'a> {
    layout: &'a Layout,
    index: Vec<usize>,
    next: Option<usize>,
    remaining: usize,
}

impl<'a> StridedIndex<'a> {
    fn new(layout: &'a Layout) -> Self {
        let remaining = layout.elem_count();
        StridedIndex {
            layout,
            index: vec![0; layout.ndim()],
            next: if remaining == 0 {
                None
            } else {
                Some(layout.offset)
            },
            remaining,
        }
    }
}

impl Iterator for StridedIndex<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.remaining -= 1;

        let dims = self.layout.dims();
        let strides = self.layout.strides();
        let mut pos = current;
        let mut advanced = false;
        for axis in (0..dims.len()).rev() {
            if self.index[axis] + 1 < dims[axis] {
                self.index[axis] += 1;
                pos += strides[axis];
                advanced = true;
                break;
            }
            pos -= self.index[axis] * strides[axis];
            self.index[axis] = 0;
        }
        self.next = if advanced { Some(pos) } else { None };
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for StridedIndex<'_> {}
