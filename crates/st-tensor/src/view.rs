//! Zero-copy view transforms.
//!
//! Each transform builds a new `Layout` over the same storage. Only `reshape`
//! of a non-contiguous view copies, because no single stride vector can
//! address the old elements in the new order.

use tracing::debug;

use crate::error::{Result, TensorError};
use crate::layout::Layout;
use crate::shape::Shape;
use crate::tensor::Tensor;

impl Tensor {
    /// Reinterpret the elements under `new_shape`.
    ///
    /// Contiguous tensors keep their storage (and offset); strided views are
    /// materialized first. Fails with `ShapeMismatch` if the element counts
    /// differ and `InvalidShape` if `new_shape`'s count overflows `usize`.
    pub fn reshape(&self, new_shape: impl Into<Shape>) -> Result<Tensor> {
        let new_shape = new_shape.into();
        if self.size() != new_shape.checked_numel()? {
            return Err(TensorError::ShapeMismatch {
                expected: self.dims().to_vec(),
                got: new_shape.dims().to_vec(),
            });
        }

        if self.is_contiguous() {
            let strides = new_shape.strides();
            let layout = Layout::new(new_shape, strides, self.offset())?;
            return Ok(self.view_with_layout(layout));
        }

        debug!(
            from = %self.shape(),
            to = %new_shape,
            "reshape of strided view requires a copy"
        );
        let owned = self.materialize()?;
        let layout = Layout::contiguous(new_shape);
        Ok(owned.view_with_layout(layout))
    }

    /// Fix `axis` at `index`, dropping that axis. The result aliases `self`.
    pub fn slice(&self, axis: usize, index: usize) -> Result<Tensor> {
        let layout = self.layout().select(axis, index)?;
        Ok(self.view_with_layout(layout))
    }

    /// Reorder axes so output axis `i` is input axis `axes[i]`.
    pub fn permute(&self, axes: &[usize]) -> Result<Tensor> {
        let layout = self.layout().permute(axes)?;
        Ok(self.view_with_layout(layout))
    }

    /// Swap the axes of a 2D tensor. Fails with `UnsupportedRank` otherwise.
    pub fn transpose(&self) -> Result<Tensor> {
        let layout = self.layout().transpose()?;
        Ok(self.view_with_layout(layout))
    }

    /// Stretch to `shape` using zero strides on broadcast axes.
    ///
    /// Writes through the result land on the shared source slot.
    pub fn broadcast_to(&self, shape: impl Into<Shape>) -> Result<Tensor> {
        let layout = self.layout().broadcast_as(&shape.into())?;
        Ok(self.view_with_layout(layout))
    }
}
