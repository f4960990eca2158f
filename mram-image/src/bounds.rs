use tracing::trace;

use crate::config::ImageConfig;
use crate::errors::{Bound, ImageError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionBounds {
    pub num_executions: usize,
    pub num_dpus: usize,
}

impl ExecutionBounds {
    pub fn new(num_executions: usize, num_dpus: usize) -> Self {
        Self { num_executions, num_dpus }
    }

    pub fn from_config(config: &ImageConfig) -> Result<Self> {
        Ok(Self::new(config.num_executions as usize, config.topology.num_dpus()?))
    }

    /// The execution index is checked before the DPU index.
    pub fn validate(&self, execution: usize, dpu: usize) -> Result<()> {
        trace!(execution, dpu, "validating output indices");
        if execution >= self.num_executions {
            return Err(ImageError::OutOfRange {
                bound: Bound::Execution,
                index: execution,
                limit: self.num_executions,
            });
        }
        if dpu >= self.num_dpus {
            return Err(ImageError::OutOfRange {
                bound: Bound::Dpu,
                index: dpu,
                limit: self.num_dpus,
            });
        }
        Ok(())
    }
}
