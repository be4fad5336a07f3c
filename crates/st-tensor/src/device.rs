use std::fmt;

use crate::error::{Result, TensorError};

/// Opaque placement label such as `"cpu"`, `"gpu"` or `"simd-cpu"`.
///
/// Labels never select a kernel; they are carried through views and
/// operation results and must agree between operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Device(String);

impl Device {
    pub fn new(label: impl Into<String>) -> Self {
        Device(label.into())
    }

    pub fn cpu() -> Self {
        Device::new("cpu")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The label shared by two operands, or `DeviceMismatch`.
    pub fn reconcile(&self, other: &Device) -> Result<Device> {
        if self != other {
            return Err(TensorError::DeviceMismatch {
                lhs: self.0.clone(),
                rhs: other.0.clone(),
            });
        }
        Ok(self.clone())
    }
}

impl Default for Device {
    fn default() -> Self {
        Device::cpu()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Device {
    fn from(label: &str) -> Self {
        Device::new(label)
    }
}

impl From<String> for Device {
    fn from(label: String) -> Self {
        Device(label)
    }
}
