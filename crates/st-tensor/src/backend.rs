use std::fmt::Debug;

use crate::error::Result;
use crate::layout::Layout;
use crate::shape::Shape;

/// Trait for pluggable compute backends.
///
/// Every kernel reads its operands through a `Layout`, so inputs may be
/// arbitrary strided views of a larger buffer. Results are returned as owned
/// row-major vectors; the caller wraps them in fresh storage.
pub trait ComputeBackend: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "cpu").
    fn name(&self) -> &str;

    /// Broadcasting binary map: `out[idx] = f(lhs[idx'], rhs[idx''])`.
    ///
    /// `out_shape` must be the broadcast of both operand shapes; each operand
    /// is stretched to it with zero strides.
    fn binary_map(
        &self,
        lhs: &[f32],
        lhs_layout: &Layout,
        rhs: &[f32],
        rhs_layout: &Layout,
        out_shape: &Shape,
        f: &dyn Fn(f32, f32) -> f32,
    ) -> Result<Vec<f32>>;

    /// Unary map over every element of a view, in row-major order.
    fn unary_map(&self, x: &[f32], layout: &Layout, f: &dyn Fn(f32) -> f32) -> Result<Vec<f32>>;

    /// Sum over `axis`; the output has that axis removed.
    fn sum_axis(&self, x: &[f32], layout: &Layout, axis: usize) -> Result<Vec<f32>>;

    /// Softmax along `axis`; the output keeps the input shape.
    fn softmax_axis(&self, x: &[f32], layout: &Layout, axis: usize) -> Result<Vec<f32>>;

    /// Matrix multiplication of two rank-2 views: [m, k] @ [k, n] -> [m, n].
    fn matmul(&self, a: &[f32], a_layout: &Layout, b: &[f32], b_layout: &Layout)
        -> Result<Vec<f32>>;
}
