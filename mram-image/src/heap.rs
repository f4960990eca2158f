//! Initial MRAM heap contents.
//!
//! Regions are concatenated by walking the planned layout, which itself
//! iterates the canonical region list, so the byte at which a region's content
//! starts is its planned offset. Every region is emitted at exactly its
//! footprint: longer sources are truncated and shorter ones zero-padded.

use tracing::{debug, warn};

use crate::config::{Retention, StatePolicy};
use crate::errors::{ImageError, Result};
use crate::layout::RegionLayout;
use crate::model::{HostInputs, RegionContentProvider};
use crate::regions::{Region, RegionSource};
use crate::stream::ByteStream;

pub struct HeapPackager<'a> {
    layout: &'a RegionLayout,
    policy: StatePolicy,
}

impl<'a> HeapPackager<'a> {
    pub fn new(layout: &'a RegionLayout, policy: StatePolicy) -> Self {
        Self { layout, policy }
    }

    pub fn package(
        &self,
        provider: &dyn RegionContentProvider,
        inputs: &HostInputs,
    ) -> Result<ByteStream> {
        let total = self.layout.total_bytes() as usize;
        let mut heap = ByteStream::with_capacity(total);

        for (region, offset, size) in self.layout.iter() {
            if heap.len() != offset as usize {
                return Err(ImageError::invalid_length(offset as usize, heap.len()));
            }
            let size = size as usize;

            let supplied = match region.source() {
                RegionSource::Output => {
                    heap.pad(size);
                    0
                }
                RegionSource::Movement => {
                    append_stream(&mut heap, region, inputs.movement.to_stream(), size)?
                }
                RegionSource::Features => {
                    append_stream(&mut heap, region, inputs.features_stream(), size)?
                }
                RegionSource::ExternalActivity => {
                    let bytes = provider.region_bytes(region).unwrap_or_default();
                    append_fitted(&mut heap, region, bytes, size)?
                }
                RegionSource::Context => {
                    self.append_state(&mut heap, provider, region, size, self.policy.context)?
                }
                RegionSource::SpikeCache => {
                    self.append_state(&mut heap, provider, region, size, self.policy.spike_caches)?
                }
            };

            debug!(region = %region, offset, size, supplied, "packed region");
        }

        if heap.len() != total {
            return Err(ImageError::invalid_length(total, heap.len()));
        }
        Ok(heap)
    }

    fn append_state(
        &self,
        heap: &mut ByteStream,
        provider: &dyn RegionContentProvider,
        region: Region,
        size: usize,
        retention: Retention,
    ) -> Result<usize> {
        match retention {
            Retention::Carry => {
                let bytes = provider.region_bytes(region).unwrap_or_default();
                append_fitted(heap, region, bytes, size)
            }
            Retention::Reset => {
                heap.pad(size);
                Ok(0)
            }
        }
    }
}

/// Append exactly `size` bytes taken from `bytes`; returns how many came
/// from the source.
fn append_fitted(
    heap: &mut ByteStream,
    region: Region,
    bytes: &[u8],
    size: usize,
) -> Result<usize> {
    let copied = bytes.len().min(size);
    if bytes.len() > size {
        warn!(region = %region, have = bytes.len(), size, "truncating region contents to footprint");
    }
    heap.merge(&ByteStream::from_raw_block(bytes, copied)?);
    heap.pad(size - copied);
    Ok(copied)
}

/// Host input streams usually match their footprint and are moved in whole.
fn append_stream(
    heap: &mut ByteStream,
    region: Region,
    stream: ByteStream,
    size: usize,
) -> Result<usize> {
    if stream.len() != size {
        return append_fitted(heap, region, stream.as_bytes(), size);
    }
    heap.merge_owned(stream);
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EmptyModel, ModelSnapshot, Movement};
    use crate::regions::{RegionTable, CANONICAL_ORDER, REGION_COUNT};
    use proptest::prelude::*;

    fn layout_of(sizes: &[u32]) -> RegionLayout {
        let mut table = RegionTable::new();
        for (&region, &size) in CANONICAL_ORDER.iter().zip(sizes) {
            table.set(region, size);
        }
        RegionLayout::plan(table).unwrap()
    }

    #[test]
    fn test_empty_model_is_zeroed() {
        let layout = layout_of(&[4, 0, 10]);
        let heap = HeapPackager::new(&layout, StatePolicy::default())
            .package(&EmptyModel, &HostInputs::default())
            .unwrap();
        assert_eq!(heap.len(), 14);
        assert!(heap.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_fit_truncates_and_pads() {
        let mut sizes = RegionTable::new();
        sizes.set(Region::FeatureNetFeatureContext, 4);
        sizes.set(Region::FeatureNetLocationContext, 4);
        let layout = RegionLayout::plan(sizes).unwrap();

        let mut model = ModelSnapshot::new();
        model.set(Region::FeatureNetFeatureContext, vec![1, 2, 3, 4, 5, 6]);
        model.set(Region::FeatureNetLocationContext, vec![7]);

        let heap = HeapPackager::new(&layout, StatePolicy::default())
            .package(&model, &HostInputs::default())
            .unwrap();
        assert_eq!(heap.as_bytes(), &[1, 2, 3, 4, 7, 0, 0, 0]);
    }

    #[test]
    fn test_inputs_land_at_their_offsets() {
        let mut sizes = RegionTable::new();
        sizes.set(Region::OutputNetFeedforward, 3);
        sizes.set(Region::InputMovement, 8);
        sizes.set(Region::InputFeatures, 8);
        let layout = RegionLayout::plan(sizes).unwrap();

        let inputs = HostInputs {
            movement: Movement::new(1, -2),
            active_columns: vec![0xAABB_CCDD],
        };
        let heap = HeapPackager::new(&layout, StatePolicy::default())
            .package(&EmptyModel, &inputs)
            .unwrap();

        let bytes = heap.as_bytes();
        assert_eq!(&bytes[layout.range(Region::InputMovement)], &[1, 0, 0, 0, 0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&bytes[layout.range(Region::InputFeatures)], &[0xDD, 0xCC, 0xBB, 0xAA, 0, 0, 0, 0]);
    }

    #[test]
    fn test_inputs_fitted_to_footprint() {
        let mut sizes = RegionTable::new();
        sizes.set(Region::InputMovement, 4);
        sizes.set(Region::InputFeatures, 12);
        let layout = RegionLayout::plan(sizes).unwrap();

        let inputs = HostInputs {
            movement: Movement::new(7, 9),
            active_columns: vec![1, 2],
        };
        let heap = HeapPackager::new(&layout, StatePolicy::default())
            .package(&EmptyModel, &inputs)
            .unwrap();
        // y is cut off, the features tail is zero-filled
        assert_eq!(heap.as_bytes(), &[7, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_fitted_copy_counts() {
        let mut heap = ByteStream::new();
        let region = Region::OutputNetFeedforward;
        assert_eq!(append_fitted(&mut heap, region, &[1, 2, 3], 2), Ok(2));
        assert_eq!(append_fitted(&mut heap, region, &[4], 3), Ok(1));
        assert_eq!(append_stream(&mut heap, region, vec![5u8, 6].into(), 2), Ok(2));
        assert_eq!(heap.as_bytes(), &[1, 2, 4, 0, 0, 5, 6]);
    }

    #[test]
    fn test_output_ignores_provider() {
        let mut sizes = RegionTable::new();
        sizes.set(Region::Output, 8);
        let layout = RegionLayout::plan(sizes).unwrap();

        let mut model = ModelSnapshot::new();
        model.set(Region::Output, vec![0xFF; 8]);

        let heap = HeapPackager::new(&layout, StatePolicy::default())
            .package(&model, &HostInputs::default())
            .unwrap();
        assert_eq!(heap.as_bytes(), &[0; 8]);
    }

    #[test]
    fn test_reset_policy() {
        let sizes = RegionTable::from_fn(|_| 2);
        let layout = RegionLayout::plan(sizes).unwrap();
        let mut model = ModelSnapshot::zeroed(&sizes);
        for &region in CANONICAL_ORDER {
            if let Some(buf) = model.region_mut(region) {
                buf.fill(0x5A);
            }
        }

        let policy = StatePolicy { context: Retention::Carry, spike_caches: Retention::Reset };
        let heap = HeapPackager::new(&layout, policy)
            .package(&model, &HostInputs::default())
            .unwrap();

        for (region, _, _) in layout.iter() {
            let bytes = &heap.as_bytes()[layout.range(region)];
            let expected = match region.source() {
                RegionSource::Context | RegionSource::ExternalActivity => [0x5Au8, 0x5A],
                _ => [0u8, 0],
            };
            assert_eq!(bytes, &expected, "{region}");
        }
    }

    proptest! {
        #[test]
        fn test_regions_start_at_planned_offsets(
            sizes in prop::collection::vec(0u32..64, REGION_COUNT),
        ) {
            let layout = layout_of(&sizes);
            // tag every model byte with its region index
            let mut model = ModelSnapshot::new();
            for &region in CANONICAL_ORDER {
                model.set(region, vec![region.index() as u8 + 1; 64]);
            }

            let heap = HeapPackager::new(&layout, StatePolicy::default())
                .package(&model, &HostInputs::default())
                .unwrap();

            prop_assert_eq!(heap.len() as u64, layout.sizes().sum());
            for (region, offset, size) in layout.iter() {
                let bytes = &heap.as_bytes()[offset as usize..(offset + size) as usize];
                let tag = match region.source() {
                    RegionSource::Context
                    | RegionSource::ExternalActivity
                    | RegionSource::SpikeCache => region.index() as u8 + 1,
                    _ => 0,
                };
                prop_assert!(bytes.iter().all(|&b| b == tag), "{}", region);
            }
        }
    }
}
