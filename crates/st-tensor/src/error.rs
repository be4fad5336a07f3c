use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    #[error("rank mismatch: expected {expected} indices, got {got}")]
    RankMismatch { expected: usize, got: usize },
    #[error("index {index} out of range for axis {axis} with size {size}")]
    IndexOutOfRange {
        axis: usize,
        index: usize,
        size: usize,
    },
    #[error("axis {axis} out of range for tensor with {ndim} dimensions")]
    AxisOutOfRange { axis: usize, ndim: usize },
    #[error("storage position {position} out of bounds for storage of length {len}")]
    OutOfBounds { position: usize, len: usize },
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },
    #[error("cannot broadcast shapes {a:?} and {b:?}: axis {axis} has sizes {lhs} and {rhs}")]
    BroadcastError {
        a: Vec<usize>,
        b: Vec<usize>,
        axis: usize,
        lhs: usize,
        rhs: usize,
    },
    #[error("invalid permutation {axes:?} for tensor with {ndim} dimensions")]
    InvalidPermutation { axes: Vec<usize>, ndim: usize },
    #[error("{op} requires rank {expected}, got rank {got}")]
    UnsupportedRank {
        op: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("device mismatch: {lhs} vs {rhs}")]
    DeviceMismatch { lhs: String, rhs: String },
    #[error("unknown dtype: {0}")]
    UnknownDType(String),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TensorError>;
