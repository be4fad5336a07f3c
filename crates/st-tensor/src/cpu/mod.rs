pub(crate) mod matmul;
pub(crate) mod reduce;

use tracing::trace;

use crate::backend::ComputeBackend;
use crate::error::Result;
use crate::layout::Layout;
use crate::shape::Shape;

/// Pure-Rust CPU compute backend.
///
/// Implements all operations with straightforward strided loops optimized for
/// correctness rather than peak performance.
#[derive(Debug, Clone, Copy)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        CpuBackend
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn binary_map(
        &self,
        lhs: &[f32],
        lhs_layout: &Layout,
        rhs: &[f32],
        rhs_layout: &Layout,
        out_shape: &Shape,
        f: &dyn Fn(f32, f32) -> f32,
    ) -> Result<Vec<f32>> {
        trace!(
            lhs = %lhs_layout.shape(),
            rhs = %rhs_layout.shape(),
            out = %out_shape,
            "binary_map"
        );
        let lhs_b = lhs_layout.broadcast_as(out_shape)?;
        let rhs_b = rhs_layout.broadcast_as(out_shape)?;
        lhs_b.validate(lhs.len())?;
        rhs_b.validate(rhs.len())?;

        Ok(lhs_b
            .positions()
            .zip(rhs_b.positions())
            .map(|(i, j)| f(lhs[i], rhs[j]))
            .collect())
    }

    fn unary_map(&self, x: &[f32], layout: &Layout, f: &dyn Fn(f32) -> f32) -> Result<Vec<f32>> {
        trace!(shape = %layout.shape(), "unary_map");
        layout.validate(x.len())?;
        Ok(layout.positions().map(|p| f(x[p])).collect())
    }

    fn sum_axis(&self, x: &[f32], layout: &Layout, axis: usize) -> Result<Vec<f32>> {
        trace!(shape = %layout.shape(), axis, "sum_axis");
        reduce::sum_axis(x, layout, axis)
    }

    fn softmax_axis(&self, x: &[f32], layout: &Layout, axis: usize) -> Result<Vec<f32>> {
        trace!(shape = %layout.shape(), axis, "softmax_axis");
        reduce::softmax_axis(x, layout, axis)
    }

    fn matmul(
        &self,
        a: &[f32],
        a_layout: &Layout,
        b: &[f32],
        b_layout: &Layout,
    ) -> Result<Vec<f32>> {
        trace!(a = %a_layout.shape(), b = %b_layout.shape(), "matmul");
        matmul::matmul_strided(a, a_layout, b, b_layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TensorError;

    fn backend() -> CpuBackend {
        CpuBackend::new()
    }

    fn layout(dims: &[usize]) -> Layout {
        Layout::contiguous(Shape::from_slice(dims))
    }

    #[test]
    fn test_name() {
        assert_eq!(backend().name(), "cpu");
    }

    #[test]
    fn test_binary_map_same_shape() {
        let b = backend();
        let r = b
            .binary_map(
                &[1.0, 2.0],
                &layout(&[2]),
                &[3.0, 4.0],
                &layout(&[2]),
                &Shape::new(vec![2]),
                &|x, y| x + y,
            )
            .unwrap();
        assert_eq!(r, vec![4.0, 6.0]);
    }

    #[test]
    fn test_binary_map_broadcast() {
        let b = backend();
        // [3,1] * [1,4] -> [3,4]
        let r = b
            .binary_map(
                &[1.0, 2.0, 3.0],
                &layout(&[3, 1]),
                &[1.0, 10.0, 100.0, 1000.0],
                &layout(&[1, 4]),
                &Shape::new(vec![3, 4]),
                &|x, y| x * y,
            )
            .unwrap();
        assert_eq!(r.len(), 12);
        assert_eq!(&r[4..8], &[2.0, 20.0, 200.0, 2000.0]);
    }

    #[test]
    fn test_binary_map_rejects_wrong_out_shape() {
        let b = backend();
        let err = b
            .binary_map(
                &[1.0, 2.0],
                &layout(&[2]),
                &[1.0, 2.0],
                &layout(&[2]),
                &Shape::new(vec![3]),
                &|x, y| x + y,
            )
            .unwrap_err();
        assert!(matches!(err, TensorError::BroadcastError { .. }));
    }

    #[test]
    fn test_unary_map_follows_strides() {
        let b = backend();
        let t = layout(&[2, 2]).transpose().unwrap();
        let r = b.unary_map(&[1.0, 2.0, 3.0, 4.0], &t, &|v| v * 2.0).unwrap();
        assert_eq!(r, vec![2.0, 6.0, 4.0, 8.0]);
    }

    #[test]
    fn test_unary_map_bounds() {
        let b = backend();
        assert!(b.unary_map(&[1.0], &layout(&[2]), &|v| v).is_err());
    }
}
