use std::fmt;
use std::str::FromStr;

use half::f16;

use crate::error::TensorError;

/// Element type tag carried by a tensor.
///
/// Storage always holds f32 values; the tag records how the values are meant
/// to be interpreted and only affects data through `Tensor::cast`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DType {
    /// 32-bit floating point.
    #[default]
    F32,
    /// 16-bit floating point (IEEE 754 half-precision, via the `half` crate).
    F16,
    /// 8-bit signed integer.
    I8,
}

impl DType {
    /// Returns the size in bytes of a single element of this type.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F16 => 2,
            DType::I8 => 1,
        }
    }

    /// Returns true for the floating point tags.
    pub fn is_float(&self) -> bool {
        matches!(self, DType::F32 | DType::F16)
    }

    /// The tag a binary operation result carries: the wider of the two.
    pub fn promote(a: DType, b: DType) -> DType {
        if a.size_in_bytes() >= b.size_in_bytes() {
            a
        } else {
            b
        }
    }

    /// Rounds `value` to the nearest value representable by this type.
    ///
    /// - F32: unchanged
    /// - F16: round-trip through `half::f16`
    /// - I8: rounded to the nearest integer and saturated to [-128, 127]; NaN stays NaN
    pub fn quantize(&self, value: f32) -> f32 {
        match self {
            DType::F32 => value,
            DType::F16 => f16::from_f32(value).to_f32(),
            DType::I8 => {
                if value.is_nan() {
                    value
                } else {
                    value.round().clamp(i8::MIN as f32, i8::MAX as f32)
                }
            }
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F32 => write!(f, "f32"),
            DType::F16 => write!(f, "f16"),
            DType::I8 => write!(f, "i8"),
        }
    }
}

impl FromStr for DType {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "f32" | "float32" => Ok(DType::F32),
            "f16" | "float16" => Ok(DType::F16),
            "i8" | "int8" => Ok(DType::I8),
            _ => Err(TensorError::UnknownDType(s.to_string())),
        }
    }
}
