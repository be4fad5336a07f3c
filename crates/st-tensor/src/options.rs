use crate::device::Device;
use crate::dtype::DType;

/// Construction-time settings for new tensors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TensorOptions {
    /// Element type tag attached to the tensor.
    pub dtype: DType,
    /// Placement label attached to the tensor.
    pub device: Device,
    /// Seed for `Tensor::random_with`; `None` draws from the thread RNG.
    pub seed: Option<u64>,
}

impl TensorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    pub fn with_device(mut self, device: impl Into<Device>) -> Self {
        self.device = device.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let opts = TensorOptions::new()
            .with_dtype(DType::F16)
            .with_device("gpu")
            .with_seed(7);
        assert_eq!(opts.dtype, DType::F16);
        assert_eq!(opts.device.as_str(), "gpu");
        assert_eq!(opts.seed, Some(7));
    }

    #[test]
    fn test_defaults() {
        let opts = TensorOptions::default();
        assert_eq!(opts.dtype, DType::F32);
        assert_eq!(opts.device, Device::cpu());
        assert_eq!(opts.seed, None);
    }
}
