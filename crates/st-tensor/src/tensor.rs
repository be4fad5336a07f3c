use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::device::Device;
use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::layout::Layout;
use crate::options::TensorOptions;
use crate::shape::Shape;
use crate::storage::{CpuStorage, SharedStorage};

/// A dense N-dimensional array over shared CPU storage.
///
/// A tensor is a `Layout` (shape, strides, offset) laid over a reference-counted
/// buffer. Views produced by `slice`, `permute`, `transpose`, `broadcast_to` and
/// contiguous `reshape` alias the same buffer, so `set` through one view is
/// visible through every other. Operation results always own fresh storage.
///
/// `Clone` is a deep copy into fresh row-major storage; it never aliases.
#[derive(Debug)]
pub struct Tensor {
    storage: SharedStorage,
    layout: Layout,
    dtype: DType,
    device: Device,
}

impl Tensor {
    /// Create a tensor from f32 data and a shape.
    ///
    /// Fails with `ShapeMismatch` if `data.len()` differs from the shape's
    /// element count.
    pub fn from_data(data: Vec<f32>, shape: impl Into<Shape>) -> Result<Self> {
        Self::from_data_with(data, shape, &TensorOptions::default())
    }

    pub fn from_data_with(
        data: Vec<f32>,
        shape: impl Into<Shape>,
        opts: &TensorOptions,
    ) -> Result<Self> {
        let shape = shape.into();
        let numel = shape.checked_numel()?;
        if data.len() != numel {
            return Err(TensorError::ShapeMismatch {
                expected: vec![numel],
                got: vec![data.len()],
            });
        }
        Ok(Self::from_storage(
            CpuStorage::from_f32_vec(data),
            Layout::contiguous(shape),
            opts.dtype,
            opts.device.clone(),
        ))
    }

    /// Create a tensor over existing data with an explicit strided layout.
    ///
    /// Every position the layout can reach must lie inside `data`.
    pub fn from_strided(data: Vec<f32>, layout: Layout, opts: &TensorOptions) -> Result<Self> {
        layout.shape().checked_numel()?;
        layout.validate(data.len())?;
        Ok(Self::from_storage(
            CpuStorage::from_f32_vec(data),
            layout,
            opts.dtype,
            opts.device.clone(),
        ))
    }

    /// Create a tensor of `shape` where every element is `value`.
    pub fn full(shape: impl Into<Shape>, value: f32) -> Self {
        Self::full_with(shape, value, &TensorOptions::default())
    }

    pub fn full_with(shape: impl Into<Shape>, value: f32, opts: &TensorOptions) -> Self {
        let shape = shape.into();
        Self::from_storage(
            CpuStorage::filled(shape.numel(), value),
            Layout::contiguous(shape),
            opts.dtype,
            opts.device.clone(),
        )
    }

    /// Create a zero-filled tensor with the given shape.
    pub fn zeros(shape: impl Into<Shape>) -> Self {
        Self::full(shape, 0.0)
    }

    pub fn zeros_with(shape: impl Into<Shape>, opts: &TensorOptions) -> Self {
        Self::full_with(shape, 0.0, opts)
    }

    /// Create a tensor filled with ones with the given shape.
    pub fn ones(shape: impl Into<Shape>) -> Self {
        Self::full(shape, 1.0)
    }

    pub fn ones_with(shape: impl Into<Shape>, opts: &TensorOptions) -> Self {
        Self::full_with(shape, 1.0, opts)
    }

    /// Allocate a tensor whose contents the caller will overwrite.
    ///
    /// The buffer is zero-filled; uninitialized memory is never exposed.
    pub fn empty(shape: impl Into<Shape>) -> Self {
        Self::zeros(shape)
    }

    pub fn empty_with(shape: impl Into<Shape>, opts: &TensorOptions) -> Self {
        Self::zeros_with(shape, opts)
    }

    /// Create a tensor of values drawn uniformly from [0, 1).
    pub fn random(shape: impl Into<Shape>) -> Self {
        Self::random_with(shape, &TensorOptions::default())
    }

    /// Like `random`, but reproducible when `opts.seed` is set.
    pub fn random_with(shape: impl Into<Shape>, opts: &TensorOptions) -> Self {
        let shape = shape.into();
        let n = shape.numel();
        let data: Vec<f32> = match opts.seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed);
                (0..n).map(|_| rng.gen::<f32>()).collect()
            }
            None => {
                let mut rng = rand::thread_rng();
                (0..n).map(|_| rng.gen::<f32>()).collect()
            }
        };
        Self::from_storage(
            CpuStorage::from_f32_vec(data),
            Layout::contiguous(shape),
            opts.dtype,
            opts.device.clone(),
        )
    }

    pub(crate) fn from_storage(
        storage: CpuStorage,
        layout: Layout,
        dtype: DType,
        device: Device,
    ) -> Self {
        Tensor {
            storage: SharedStorage::new(storage),
            layout,
            dtype,
            device,
        }
    }

    /// A new tensor over the same storage with a different layout.
    pub(crate) fn view_with_layout(&self, layout: Layout) -> Self {
        Tensor {
            storage: self.storage.clone(),
            layout,
            dtype: self.dtype,
            device: self.device.clone(),
        }
    }

    /// Runs `f` over the raw storage slice and this tensor's layout.
    pub(crate) fn with_data<R>(&self, f: impl FnOnce(&[f32], &Layout) -> R) -> R {
        let guard = self.storage.read();
        f(guard.as_f32_slice(), &self.layout)
    }

    /// Like `with_data`, over two tensors. Aliasing tensors take the storage
    /// lock once.
    pub(crate) fn with_data2<R>(
        &self,
        other: &Tensor,
        f: impl FnOnce(&[f32], &Layout, &[f32], &Layout) -> R,
    ) -> R {
        let lhs = self.storage.read();
        if self.shares_storage(other) {
            let data = lhs.as_f32_slice();
            return f(data, &self.layout, data, &other.layout);
        }
        let rhs = other.storage.read();
        f(lhs.as_f32_slice(), &self.layout, rhs.as_f32_slice(), &other.layout)
    }

    /// Returns a reference to the tensor's shape.
    pub fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    pub fn dims(&self) -> &[usize] {
        self.layout.dims()
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Total number of logical elements.
    pub fn size(&self) -> usize {
        self.layout.elem_count()
    }

    pub fn strides(&self) -> &[usize] {
        self.layout.strides()
    }

    pub fn offset(&self) -> usize {
        self.layout.offset()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// True when both tensors read and write the same buffer.
    pub fn shares_storage(&self, other: &Tensor) -> bool {
        self.storage.ptr_eq(&other.storage)
    }

    /// Reads the element at `indices`.
    pub fn at(&self, indices: &[usize]) -> Result<f32> {
        let pos = self.layout.position(indices)?;
        self.storage.read().get(pos)
    }

    /// Writes the element at `indices`; visible through every aliasing view.
    pub fn set(&self, indices: &[usize], value: f32) -> Result<()> {
        let pos = self.layout.position(indices)?;
        self.storage.write().set(pos, value)
    }

    /// Values in logical row-major order.
    pub fn to_vec(&self) -> Result<Vec<f32>> {
        self.storage.read().gather(&self.layout)
    }

    /// Copies this tensor into fresh, canonically-strided storage.
    pub fn materialize(&self) -> Result<Tensor> {
        if !self.layout.is_canonical() {
            debug!(
                shape = %self.shape(),
                strides = ?self.strides(),
                offset = self.offset(),
                "materializing strided view"
            );
        }
        let data = self.to_vec()?;
        Ok(self.with_fresh_storage(data, self.dtype))
    }

    /// Wraps row-major `data` in new storage with this tensor's shape and device.
    fn with_fresh_storage(&self, data: Vec<f32>, dtype: DType) -> Tensor {
        Self::from_storage(
            CpuStorage::from_f32_vec(data),
            Layout::contiguous(self.shape().clone()),
            dtype,
            self.device.clone(),
        )
    }

    /// A contiguous tensor with the same values: a storage-sharing view when
    /// the layout already is contiguous, otherwise a materialized copy.
    pub fn contiguous(&self) -> Result<Tensor> {
        if self.is_contiguous() {
            return Ok(self.view_with_layout(self.layout.clone()));
        }
        self.materialize()
    }

    /// A fresh tensor tagged `dtype` whose values are rounded to what that
    /// type can represent.
    pub fn cast(&self, dtype: DType) -> Result<Tensor> {
        let data = self
            .to_vec()?
            .into_iter()
            .map(|v| dtype.quantize(v))
            .collect();
        Ok(self.with_fresh_storage(data, dtype))
    }

    /// Exact structural equality: identical shapes and IEEE equality of every
    /// element, so `0.0` equals `-0.0` and NaN never equals NaN.
    pub fn equals(&self, other: &Tensor) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        match (self.to_vec(), other.to_vec()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// Elementwise `|a - b| <= atol + rtol * |b|` over identical shapes.
    pub fn allclose(&self, other: &Tensor, rtol: f32, atol: f32) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        match (self.to_vec(), other.to_vec()) {
            (Ok(a), Ok(b)) => a
                .iter()
                .zip(b.iter())
                .all(|(&x, &y)| (x - y).abs() <= atol + rtol * y.abs()),
            _ => false,
        }
    }
}

impl Clone for Tensor {
    fn clone(&self) -> Self {
        // Constructors validate every layout, so materialize only fails if
        // that invariant is broken; unreachable slots then read as NaN.
        self.materialize().unwrap_or_else(|_| {
            let data: Vec<f32> = self.with_data(|data, layout| {
                layout
                    .positions()
                    .map(|p| data.get(p).copied().unwrap_or(f32::NAN))
                    .collect()
            });
            self.with_fresh_storage(data, self.dtype)
        })
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t23() -> Tensor {
        Tensor::from_data(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3]).unwrap()
    }

    #[test]
    fn test_from_data() {
        let t = t23();
        assert_eq!(t.ndim(), 2);
        assert_eq!(t.dims(), &[2, 3]);
        assert_eq!(t.size(), 6);
        assert_eq!(t.strides(), &[3, 1]);
        assert_eq!(t.offset(), 0);
        assert_eq!(t.dtype(), DType::F32);
        assert_eq!(t.device(), &Device::cpu());
        assert_eq!(t.to_vec().unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_from_data_shape_mismatch() {
        assert_eq!(
            Tensor::from_data(vec![1.0, 2.0], [3]).unwrap_err(),
            TensorError::ShapeMismatch {
                expected: vec![3],
                got: vec![2]
            }
        );
    }

    #[test]
    fn test_from_strided() {
        let layout = Layout::new(Shape::new(vec![2, 2]), vec![1, 2], 0).unwrap();
        let t = Tensor::from_strided(vec![1.0, 2.0, 3.0, 4.0], layout, &TensorOptions::default())
            .unwrap();
        assert_eq!(t.to_vec().unwrap(), vec![1.0, 3.0, 2.0, 4.0]);

        let bad = Layout::new(Shape::new(vec![3]), vec![2], 0).unwrap();
        assert!(matches!(
            Tensor::from_strided(vec![0.0; 4], bad, &TensorOptions::default()),
            Err(TensorError::OutOfBounds { position: 4, len: 4 })
        ));
    }

    #[test]
    fn test_from_strided_rejects_overflowing_stride() {
        let layout = Layout::new(Shape::new(vec![3]), vec![usize::MAX / 2 + 1], 0).unwrap();
        assert_eq!(
            Tensor::from_strided(vec![0.0; 4], layout, &TensorOptions::default()).unwrap_err(),
            TensorError::OutOfBounds {
                position: usize::MAX,
                len: 4
            }
        );
    }

    #[test]
    fn test_from_data_rejects_overflowing_shape() {
        assert!(matches!(
            Tensor::from_data(vec![0.0; 2], [1usize << 63, 2]),
            Err(TensorError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_zeros_ones_full() {
        assert_eq!(Tensor::zeros([2, 3]).to_vec().unwrap(), vec![0.0; 6]);
        assert_eq!(Tensor::ones([3]).to_vec().unwrap(), vec![1.0; 3]);
        assert_eq!(Tensor::full([2], 7.5).to_vec().unwrap(), vec![7.5; 2]);
        assert_eq!(Tensor::empty([4]).size(), 4);
    }

    #[test]
    fn test_scalar() {
        let s = Tensor::full(Shape::scalar(), 3.0);
        assert_eq!(s.ndim(), 0);
        assert_eq!(s.size(), 1);
        assert_eq!(s.at(&[]).unwrap(), 3.0);
    }

    #[test]
    fn test_options_carry_tags() {
        let opts = TensorOptions::new().with_dtype(DType::F16).with_device("gpu");
        let t = Tensor::zeros_with([2], &opts);
        assert_eq!(t.dtype(), DType::F16);
        assert_eq!(t.device().as_str(), "gpu");
    }

    #[test]
    fn test_random_seeded_is_reproducible() {
        let opts = TensorOptions::new().with_seed(42);
        let a = Tensor::random_with([4, 4], &opts);
        let b = Tensor::random_with([4, 4], &opts);
        assert_eq!(a, b);
        assert!(a.to_vec().unwrap().iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn test_at_errors() {
        let t = t23();
        assert_eq!(t.at(&[1, 2]).unwrap(), 6.0);
        assert_eq!(
            t.at(&[1]),
            Err(TensorError::RankMismatch {
                expected: 2,
                got: 1
            })
        );
        assert_eq!(
            t.at(&[2, 0]),
            Err(TensorError::IndexOutOfRange {
                axis: 0,
                index: 2,
                size: 2
            })
        );
    }

    #[test]
    fn test_set() {
        let t = t23();
        t.set(&[0, 1], 20.0).unwrap();
        assert_eq!(t.at(&[0, 1]).unwrap(), 20.0);
        assert!(t.set(&[0, 3], 1.0).is_err());
    }

    #[test]
    fn test_clone_is_independent() {
        let t = t23();
        let c = t.clone();
        assert!(!c.shares_storage(&t));
        c.set(&[0, 0], 100.0).unwrap();
        assert_eq!(t.at(&[0, 0]).unwrap(), 1.0);
        assert_eq!(c.strides(), &[3, 1]);
    }

    #[test]
    fn test_clone_materializes_view() {
        let t = t23().transpose().unwrap();
        let c = t.clone();
        assert!(c.layout().is_canonical());
        assert_eq!(c.to_vec().unwrap(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_clone_of_broadcast_view_keeps_tags() {
        let opts = TensorOptions::new().with_dtype(DType::F16).with_device("gpu");
        let t = Tensor::from_data_with(vec![1.0, 2.0], [2, 1], &opts)
            .unwrap()
            .broadcast_to([2, 3])
            .unwrap();
        let c = t.clone();
        assert!(c.layout().is_canonical());
        assert!(!c.shares_storage(&t));
        assert_eq!(c.dtype(), DType::F16);
        assert_eq!(c.device().as_str(), "gpu");
        assert_eq!(c.to_vec().unwrap(), vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_contiguous_shares_when_possible() {
        let t = t23();
        let c = t.contiguous().unwrap();
        assert!(c.shares_storage(&t));

        let tt = t.transpose().unwrap();
        let ct = tt.contiguous().unwrap();
        assert!(!ct.shares_storage(&t));
        assert!(ct.is_contiguous());
        assert_eq!(ct, tt);
    }

    #[test]
    fn test_cast() {
        let t = Tensor::from_data(vec![1.4, -2.6, 300.0], [3]).unwrap();
        let i = t.cast(DType::I8).unwrap();
        assert_eq!(i.dtype(), DType::I8);
        assert_eq!(i.to_vec().unwrap(), vec![1.0, -3.0, 127.0]);
        assert_eq!(t.at(&[0]).unwrap(), 1.4);
    }

    #[test]
    fn test_equals() {
        let a = t23();
        let b = t23();
        assert!(a.equals(&b));
        let c = a.reshape([3, 2]).unwrap();
        assert!(!a.equals(&c));
        b.set(&[1, 1], 0.0).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_equals_uses_ieee_comparison() {
        let pos = Tensor::from_data(vec![0.0], [1]).unwrap();
        let neg = Tensor::from_data(vec![-0.0], [1]).unwrap();
        assert!(pos.equals(&neg));
        let nan = Tensor::from_data(vec![f32::NAN], [1]).unwrap();
        assert!(!nan.equals(&nan));
    }

    #[test]
    fn test_allclose() {
        let a = Tensor::from_data(vec![1.0, 2.0], [2]).unwrap();
        let b = Tensor::from_data(vec![1.0, 2.000001], [2]).unwrap();
        assert!(!a.equals(&b));
        assert!(a.allclose(&b, 1e-5, 1e-8));
        assert!(!a.allclose(&Tensor::from_data(vec![1.0, 2.1], [2]).unwrap(), 1e-5, 1e-8));
    }
}
