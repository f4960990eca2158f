//! Region footprints.
//!
//! The builder only needs a [`RegionTable`] of byte sizes; where it comes
//! from is up to the [`RegionSizer`]. [`TbsSizer`] implements the footprints
//! of the thousand-brains learning module used by the TBS benchmark.

use crate::errors::{ImageError, Result};
use crate::memory::{round_up_8, SEGMENT_BYTES, SPIKE_COUNT_BYTES};
use crate::params::ModelParams;
use crate::regions::{Region, RegionTable};

pub trait RegionSizer {
    fn footprints(&self, params: &ModelParams) -> Result<RegionTable>;
}

/// A sizer that returns a precomputed table regardless of parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSizer(pub RegionTable);

impl RegionSizer for FixedSizer {
    fn footprints(&self, _params: &ModelParams) -> Result<RegionTable> {
        Ok(self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TbsSizer;

/// Movement vector: two `i32`.
pub const MOVEMENT_BYTES: u32 = 8;

fn product(region: Region, factors: &[u32]) -> Result<u32> {
    factors
        .iter()
        .try_fold(1u32, |acc, &f| acc.checked_mul(f))
        .ok_or(ImageError::LayoutOverflow(region))
}

impl TbsSizer {
    fn footprint(params: &ModelParams, region: Region) -> Result<u32> {
        let f = &params.features;
        let l = &params.location;
        let o = &params.output;

        let f_cells = f.cols as u32 * f.cells as u32;
        let o_cells = o.cells as u32;

        match region {
            Region::FeatureNetFeatureContext => {
                product(region, &[f_cells, f.feature_segments as u32, SEGMENT_BYTES])
            }
            Region::FeatureNetLocationContext => {
                product(region, &[f_cells, f.location_segments as u32, SEGMENT_BYTES])
            }
            Region::LocationNetLocationContext => {
                product(region, &[l.cols, l.cells, l.location_segments as u32, SEGMENT_BYTES])
            }
            Region::LocationNetFeatureContext => {
                product(region, &[l.cols, l.cells, l.feature_segments as u32, SEGMENT_BYTES])
            }
            Region::OutputNetInternalContext => {
                product(region, &[o_cells, o.internal_context_segments as u32, SEGMENT_BYTES])
            }
            Region::OutputNetExternalContext => {
                product(region, &[o_cells, o.external_context_segments as u32, SEGMENT_BYTES])
            }
            Region::OutputNetFeedforward => product(region, &[o_cells, SEGMENT_BYTES]),
            Region::InputMovement => Ok(MOVEMENT_BYTES),
            // one u32 per sensor column, 8-byte aligned for DMA
            Region::InputFeatures => Ok(round_up_8(f.cols as u32 * 4)),
            // external_lms rows of (external_cells / 32) activity words
            Region::ExternalOutputActivity => {
                let log_words = o.log_external_cells.saturating_sub(5) as u32;
                let row_words = 1u32
                    .checked_shl(log_words)
                    .ok_or(ImageError::LayoutOverflow(region))?;
                product(region, &[o.external_lms as u32, row_words, 4])
            }
            // one bit per output cell, packed in u32 words
            Region::Output => product(region, &[o_cells >> 5, 4]),
            Region::FeatureNetFeatureSpikeCache => {
                product(region, &[f_cells, f.feature_segments as u32, SPIKE_COUNT_BYTES])
            }
            Region::FeatureNetLocationSpikeCache => {
                product(region, &[f_cells, f.location_segments as u32, SPIKE_COUNT_BYTES])
            }
            Region::LocationNetLocationSpikeCache => {
                product(region, &[l.cols, l.cells, l.location_segments as u32, SPIKE_COUNT_BYTES])
            }
            Region::LocationNetFeatureSpikeCache => {
                product(region, &[l.cols, l.cells, l.feature_segments as u32, SPIKE_COUNT_BYTES])
            }
            Region::OutputNetInternalSpikeCache => {
                product(region, &[o_cells, o.internal_context_segments as u32, SPIKE_COUNT_BYTES])
            }
            Region::OutputNetExternalSpikeCache => {
                product(region, &[o_cells, o.external_context_segments as u32, SPIKE_COUNT_BYTES])
            }
        }
    }
}

impl RegionSizer for TbsSizer {
    fn footprints(&self, params: &ModelParams) -> Result<RegionTable> {
        RegionTable::try_from_fn(|region| Self::footprint(params, region))
    }
}
