use std::fmt;

use crate::regions::Region;

pub type Result<T> = std::result::Result<T, ImageError>;

/// Which configured bound an index violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Execution,
    Dpu,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Execution => f.write_str("execution"),
            Bound::Dpu => f.write_str("device"),
        }
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ImageError {
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("{0} requested before the builder was initialized")]
    NotInitialized(&'static str),

    #[error("{bound} index {index} out of range (limit {limit})")]
    OutOfRange { bound: Bound, index: usize, limit: usize },

    #[error("region {0} overflows the 32-bit MRAM address space")]
    LayoutOverflow(Region),

    #[error("heap needs {required} bytes but only {capacity} are available")]
    HeapTooLarge { required: u64, capacity: u64 },

    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("config: {0}")]
    Config(String),
}

impl ImageError {
    pub fn invalid_length(expected: usize, actual: usize) -> Self {
        Self::InvalidLength { expected, actual }
    }

    /// The bound this error refers to, if it is an `OutOfRange`.
    pub fn bound(&self) -> Option<Bound> {
        match self {
            Self::OutOfRange { bound, .. } => Some(*bound),
            _ => None,
        }
    }
}
