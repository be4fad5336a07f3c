//! Eager operations. Every result owns fresh row-major storage; inputs are
//! read through their layouts and never mutated.

use crate::backend::ComputeBackend;
use crate::cpu::CpuBackend;
use crate::dtype::DType;
use crate::error::Result;
use crate::layout::Layout;
use crate::shape::Shape;
use crate::storage::CpuStorage;
use crate::tensor::Tensor;

// Device labels are inert, so every tensor runs on the reference backend.
const BACKEND: CpuBackend = CpuBackend;

impl Tensor {
    fn result(&self, data: Vec<f32>, shape: Shape, dtype: DType) -> Tensor {
        Tensor::from_storage(
            CpuStorage::from_f32_vec(data),
            Layout::contiguous(shape),
            dtype,
            self.device().clone(),
        )
    }

    /// Apply `f` elementwise over the broadcast of `self` and `rhs`.
    ///
    /// Shapes and devices are checked before anything is allocated. The
    /// result carries the wider of the two dtype tags.
    pub fn zip_with<F>(&self, rhs: &Tensor, f: F) -> Result<Tensor>
    where
        F: Fn(f32, f32) -> f32,
    {
        self.device().reconcile(rhs.device())?;
        let out_shape = Shape::broadcast_shape(self.shape(), rhs.shape())?;
        let data = self.with_data2(rhs, |lhs, lhs_layout, rhs, rhs_layout| {
            BACKEND.binary_map(lhs, lhs_layout, rhs, rhs_layout, &out_shape, &f)
        })?;
        Ok(self.result(data, out_shape, DType::promote(self.dtype(), rhs.dtype())))
    }

    pub fn add(&self, rhs: &Tensor) -> Result<Tensor> {
        self.zip_with(rhs, |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Tensor) -> Result<Tensor> {
        self.zip_with(rhs, |a, b| a - b)
    }

    pub fn mul(&self, rhs: &Tensor) -> Result<Tensor> {
        self.zip_with(rhs, |a, b| a * b)
    }

    /// Elementwise division. Division by zero follows IEEE 754 and yields
    /// infinities or NaN rather than an error.
    pub fn div(&self, rhs: &Tensor) -> Result<Tensor> {
        self.zip_with(rhs, |a, b| a / b)
    }

    /// Apply `f` to every element; the result has `self`'s shape.
    pub fn apply<F>(&self, f: F) -> Result<Tensor>
    where
        F: Fn(f32) -> f32,
    {
        let data = self.with_data(|x, layout| BACKEND.unary_map(x, layout, &f))?;
        Ok(self.result(data, self.shape().clone(), self.dtype()))
    }

    /// Sum along `axis`, removing it from the shape.
    pub fn sum(&self, axis: usize) -> Result<Tensor> {
        let out_shape = self.shape().remove_axis(axis)?;
        let data = self.with_data(|x, layout| BACKEND.sum_axis(x, layout, axis))?;
        Ok(self.result(data, out_shape, self.dtype()))
    }

    /// Mean along `axis`, removing it from the shape. An empty axis yields NaN.
    pub fn mean(&self, axis: usize) -> Result<Tensor> {
        let out_shape = self.shape().remove_axis(axis)?;
        let len = self.dims()[axis] as f32;
        let mut data = self.with_data(|x, layout| BACKEND.sum_axis(x, layout, axis))?;
        for v in data.iter_mut() {
            *v /= len;
        }
        Ok(self.result(data, out_shape, self.dtype()))
    }

    /// Numerically stable softmax along `axis`; every slice sums to 1.
    pub fn softmax(&self, axis: usize) -> Result<Tensor> {
        self.shape().check_axis(axis)?;
        let data = self.with_data(|x, layout| BACKEND.softmax_axis(x, layout, axis))?;
        Ok(self.result(data, self.shape().clone(), self.dtype()))
    }

    /// Matrix multiplication of two 2D tensors.
    ///
    /// self is [m, k], other is [k, n], result is [m, n]. Either operand may
    /// be a strided view such as a transpose.
    pub fn matmul(&self, other: &Tensor) -> Result<Tensor> {
        self.device().reconcile(other.device())?;
        let data = self.with_data2(other, |a, a_layout, b, b_layout| {
            BACKEND.matmul(a, a_layout, b, b_layout)
        })?;
        let out_shape = Shape::new(vec![self.dims()[0], other.dims()[1]]);
        Ok(self.result(data, out_shape, DType::promote(self.dtype(), other.dtype())))
    }
}
