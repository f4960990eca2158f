//! Builder configuration.
//!
//! Everything has a default matching the TBS benchmark run on a single DPU,
//! so an empty JSON object is a valid configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ImageError, Result};
use crate::memory::MRAM_SIZE;
use crate::params::ModelParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topology {
    pub num_channels: u32,
    pub num_ranks_per_channel: u32,
    pub num_dpus_per_rank: u32,
    pub num_tasklets: u32,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            num_channels: 1,
            num_ranks_per_channel: 1,
            num_dpus_per_rank: 1,
            num_tasklets: 16,
        }
    }
}

impl Topology {
    pub fn num_dpus(&self) -> Result<usize> {
        (self.num_channels as usize)
            .checked_mul(self.num_ranks_per_channel as usize)
            .and_then(|n| n.checked_mul(self.num_dpus_per_rank as usize))
            .ok_or_else(|| ImageError::InvalidTopology("device count overflows".to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("num_channels", self.num_channels),
            ("num_ranks_per_channel", self.num_ranks_per_channel),
            ("num_dpus_per_rank", self.num_dpus_per_rank),
            ("num_tasklets", self.num_tasklets),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(ImageError::InvalidTopology(format!("{name} must be at least 1")));
            }
        }
        self.num_dpus()?;
        Ok(())
    }
}

/// Whether learned state survives into the next image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Retention {
    /// Serialize whatever the model currently holds.
    #[default]
    Carry,
    /// Emit zeros, as if the model had just been allocated.
    Reset,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatePolicy {
    /// Segment tensors of the three nets.
    pub context: Retention,
    pub spike_caches: Retention,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub topology: Topology,
    pub num_executions: u32,
    pub model: ModelParams,
    pub state: StatePolicy,
    /// Bytes of MRAM the device allocator can hand to the heap.
    pub heap_capacity: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            topology: Topology::default(),
            num_executions: 1,
            model: ModelParams::default(),
            state: StatePolicy::default(),
            heap_capacity: MRAM_SIZE,
        }
    }
}

impl ImageConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ImageError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| ImageError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ImageError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.topology.validate()?;
        if self.num_executions == 0 {
            return Err(ImageError::InvalidTopology(
                "num_executions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = ImageConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ImageConfig::default());
        assert_eq!(config.topology.num_dpus().unwrap(), 1);
        assert_eq!(config.num_executions, 1);
        assert_eq!(config.heap_capacity, MRAM_SIZE);
    }

    #[test]
    fn test_topology_product() {
        let config = ImageConfig::from_json_str(
            r#"{ "topology": { "num_channels": 2, "num_ranks_per_channel": 4, "num_dpus_per_rank": 64 } }"#,
        )
        .unwrap();
        assert_eq!(config.topology.num_dpus().unwrap(), 512);
        assert_eq!(config.topology.num_tasklets, 16);
    }

    #[test]
    fn test_zero_counts_rejected() {
        let err = ImageConfig::from_json_str(r#"{ "topology": { "num_dpus_per_rank": 0 } }"#)
            .unwrap_err();
        assert!(matches!(err, ImageError::InvalidTopology(msg) if msg.contains("num_dpus_per_rank")));

        let err = ImageConfig::from_json_str(r#"{ "num_executions": 0 }"#).unwrap_err();
        assert!(matches!(err, ImageError::InvalidTopology(_)));
    }

    #[test]
    fn test_device_count_overflow_rejected() {
        let err = ImageConfig::from_json_str(
            r#"{ "topology": { "num_channels": 4294967295, "num_ranks_per_channel": 4294967295, "num_dpus_per_rank": 4294967295 } }"#,
        )
        .unwrap_err();
        assert_eq!(err, ImageError::InvalidTopology("device count overflows".to_string()));

        let topology = Topology {
            num_channels: u32::MAX,
            num_ranks_per_channel: u32::MAX,
            num_dpus_per_rank: u32::MAX,
            num_tasklets: 16,
        };
        assert!(topology.num_dpus().is_err());
    }

    #[test]
    fn test_state_policy() {
        let config =
            ImageConfig::from_json_str(r#"{ "state": { "spike_caches": "reset" } }"#).unwrap();
        assert_eq!(config.state.spike_caches, Retention::Reset);
        assert_eq!(config.state.context, Retention::Carry);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ImageConfig::from_json_str("{ topology"),
            Err(ImageError::Config(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = ImageConfig::default();
        config.state.context = Retention::Reset;
        config.model.features.cols = 512;
        let json = config.to_json().unwrap();
        assert_eq!(ImageConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ImageConfig::from_path("/nonexistent/mram.json"),
            Err(ImageError::Config(_))
        ));
    }
}
