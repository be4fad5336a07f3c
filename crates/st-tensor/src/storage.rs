use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Result, TensorError};
use crate::layout::Layout;

/// CPU-side flat element buffer.
///
/// Values are always held at f32 width; the tensor's dtype tag does not
/// change the in-memory representation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CpuStorage {
    data: Vec<f32>,
}

impl CpuStorage {
    /// Create storage from an f32 vector.
    pub fn from_f32_vec(data: Vec<f32>) -> Self {
        CpuStorage { data }
    }

    /// Create storage of `n` copies of `value`.
    pub fn filled(n: usize, value: f32) -> Self {
        CpuStorage {
            data: vec![value; n],
        }
    }

    /// Create zero-filled storage with `n` elements.
    pub fn zeros(n: usize) -> Self {
        Self::filled(n, 0.0)
    }

    /// Number of elements in this storage.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the storage contains no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_f32_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_f32_slice_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Reads the element at a storage position.
    pub fn get(&self, position: usize) -> Result<f32> {
        self.data
            .get(position)
            .copied()
            .ok_or(TensorError::OutOfBounds {
                position,
                len: self.data.len(),
            })
    }

    /// Writes the element at a storage position.
    pub fn set(&mut self, position: usize, value: f32) -> Result<()> {
        let len = self.data.len();
        match self.data.get_mut(position) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(TensorError::OutOfBounds { position, len }),
        }
    }

    /// Copies the elements addressed by `layout` into a new row-major vector.
    pub fn gather(&self, layout: &Layout) -> Result<Vec<f32>> {
        layout.validate(self.data.len())?;
        Ok(layout.positions().map(|p| self.data[p]).collect())
    }
}

/// Reference-counted storage shared between a tensor and all of its views.
///
/// Writes through any handle are visible through every other handle.
#[derive(Debug, Clone)]
pub(crate) struct SharedStorage(Arc<RwLock<CpuStorage>>);

impl SharedStorage {
    pub(crate) fn new(storage: CpuStorage) -> Self {
        SharedStorage(Arc::new(RwLock::new(storage)))
    }

    // A poisoned lock only means a writer panicked mid-update of plain
    // floats, so the data is still usable.
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, CpuStorage> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, CpuStorage> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn ptr_eq(&self, other: &SharedStorage) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
