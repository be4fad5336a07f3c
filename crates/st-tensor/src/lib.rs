//! `st-tensor` - Dense strided N-dimensional tensors.
//!
//! This crate provides:
//! - A `Tensor` type: a `Layout` (shape, strides, offset) over shared CPU storage
//! - Zero-copy views: slice, permute, transpose, reshape, broadcast
//! - Broadcasting elementwise ops, axis reductions, softmax and matmul
//! - A `ComputeBackend` trait with a reference `CpuBackend`
//! - Inert dtype and device tags

pub mod backend;
pub mod cpu;
pub mod device;
mod display;
pub mod dtype;
pub mod error;
pub mod layout;
pub mod ops;
pub mod options;
pub mod shape;
pub mod storage;
pub mod tensor;
pub mod view;


// Re-export primary types at the crate root for convenience.
pub use backend::ComputeBackend;
pub use cpu::CpuBackend;
pub use device::Device;
pub use dtype::DType;
pub use error::{Result, TensorError};
pub use layout::{Layout, StridedIndex};
pub use options::TensorOptions;
pub use shape::Shape;
pub use storage::CpuStorage;
pub use tensor::Tensor;
