//! The canonical MRAM region list.
//!
//! The order below is the transfer protocol agreed with the DPU program: the
//! device reads `size_bytes` and `addresses` as two arrays of `u32` in this
//! order, and the heap image is concatenated in this order. Both the layout
//! planner and the heap packager iterate [`CANONICAL_ORDER`]; nothing else
//! spells the order out.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::errors::{ImageError, Result};
use crate::stream::ByteStream;

/// Where the heap packager takes a region's initial bytes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionSource {
    /// Segment tensors owned by the learning module.
    Context,
    /// The movement vector set by the host before the step.
    Movement,
    /// Active columns of the sensor module's feature vector.
    Features,
    /// Output-layer activity of the other learning modules.
    ExternalActivity,
    /// The answer buffer; always zeroed before execution.
    Output,
    /// Per-segment spike counts cached by the learning module.
    SpikeCache,
}

macro_rules! define_regions {
    (
        $( ($variant:ident, $name:literal, $source:expr) ),*
        $(,)?
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum Region {
            $( $variant, )*
        }

        pub const CANONICAL_ORDER: &[Region] = &[
            $( Region::$variant, )*
        ];

        impl Region {
            pub const fn name(self) -> &'static str {
                match self {
                    $( Region::$variant => $name, )*
                }
            }

            pub const fn source(self) -> RegionSource {
                match self {
                    $( Region::$variant => $source, )*
                }
            }
        }
    }
}

define_regions!(
    (FeatureNetFeatureContext, "f_feature_context", RegionSource::Context),
    (FeatureNetLocationContext, "f_location_context", RegionSource::Context),
    (LocationNetLocationContext, "l_location_context", RegionSource::Context),
    (LocationNetFeatureContext, "l_feature_context", RegionSource::Context),
    (OutputNetInternalContext, "o_internal_context", RegionSource::Context),
    (OutputNetExternalContext, "o_external_context", RegionSource::Context),
    (OutputNetFeedforward, "o_feedforward", RegionSource::Context),
    (InputMovement, "input_movement", RegionSource::Movement),
    (InputFeatures, "input_features", RegionSource::Features),
    (ExternalOutputActivity, "external_o_activity", RegionSource::ExternalActivity),
    (Output, "output", RegionSource::Output),
    (FeatureNetFeatureSpikeCache, "f_feature_spike_cache", RegionSource::SpikeCache),
    (FeatureNetLocationSpikeCache, "f_location_spike_cache", RegionSource::SpikeCache),
    (LocationNetLocationSpikeCache, "l_location_spike_cache", RegionSource::SpikeCache),
    (LocationNetFeatureSpikeCache, "l_feature_spike_cache", RegionSource::SpikeCache),
    (OutputNetInternalSpikeCache, "o_internal_spike_cache", RegionSource::SpikeCache),
    (OutputNetExternalSpikeCache, "o_external_spike_cache", RegionSource::SpikeCache),
);

pub const REGION_COUNT: usize = CANONICAL_ORDER.len();

impl Region {
    /// Position in the canonical order.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_name(name: &str) -> Option<Region> {
        CANONICAL_ORDER.iter().copied().find(|r| r.name() == name)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One `u32` per region, in canonical order.
///
/// This is the host-side form of the device's `mram_content_t`: the same
/// type carries the footprint table (`size_bytes`) and the offset table
/// (`addresses`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionTable([u32; REGION_COUNT]);

impl RegionTable {
    /// Wire size: `REGION_COUNT` little-endian `u32`s.
    pub const ENCODED_SIZE: usize = REGION_COUNT * 4;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fn(mut f: impl FnMut(Region) -> u32) -> Self {
        let mut table = Self::new();
        for &region in CANONICAL_ORDER {
            table.0[region.index()] = f(region);
        }
        table
    }

    /// Fallible variant of [`RegionTable::from_fn`]; stops at the first error.
    pub fn try_from_fn(mut f: impl FnMut(Region) -> Result<u32>) -> Result<Self> {
        let mut table = Self::new();
        for &region in CANONICAL_ORDER {
            table.0[region.index()] = f(region)?;
        }
        Ok(table)
    }

    #[inline]
    pub fn get(&self, region: Region) -> u32 {
        self.0[region.index()]
    }

    #[inline]
    pub fn set(&mut self, region: Region, value: u32) {
        self.0[region.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Region, u32)> + '_ {
        CANONICAL_ORDER.iter().map(move |&r| (r, self.0[r.index()]))
    }

    /// Sum of all entries, widened so it cannot wrap.
    pub fn sum(&self) -> u64 {
        self.0.iter().map(|&v| v as u64).sum()
    }

    pub fn to_stream(&self) -> ByteStream {
        let mut stream = ByteStream::with_capacity(Self::ENCODED_SIZE);
        for (_, value) in self.iter() {
            stream.append_u32_le(value);
        }
        stream
    }

    /// Inverse of [`RegionTable::to_stream`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::ENCODED_SIZE {
            return Err(ImageError::invalid_length(Self::ENCODED_SIZE, bytes.len()));
        }
        let mut table = Self::new();
        for (slot, chunk) in table.0.iter_mut().zip(bytes.chunks_exact(4)) {
            *slot = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(table)
    }
}

impl Index<Region> for RegionTable {
    type Output = u32;

    fn index(&self, region: Region) -> &u32 {
        &self.0[region.index()]
    }
}

impl IndexMut<Region> for RegionTable {
    fn index_mut(&mut self, region: Region) -> &mut u32 {
        &mut self.0[region.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order() {
        let names: Vec<&str> = CANONICAL_ORDER.iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            [
                "f_feature_context",
                "f_location_context",
                "l_location_context",
                "l_feature_context",
                "o_internal_context",
                "o_external_context",
                "o_feedforward",
                "input_movement",
                "input_features",
                "external_o_activity",
                "output",
                "f_feature_spike_cache",
                "f_location_spike_cache",
                "l_location_spike_cache",
                "l_feature_spike_cache",
                "o_internal_spike_cache",
                "o_external_spike_cache",
            ]
        );
        assert_eq!(REGION_COUNT, 17);
    }

    #[test]
    fn test_index_matches_position() {
        for (i, region) in CANONICAL_ORDER.iter().enumerate() {
            assert_eq!(region.index(), i);
        }
    }

    #[test]
    fn test_sources() {
        assert_eq!(Region::Output.source(), RegionSource::Output);
        assert_eq!(Region::InputMovement.source(), RegionSource::Movement);
        assert_eq!(Region::InputFeatures.source(), RegionSource::Features);
        let caches = CANONICAL_ORDER
            .iter()
            .filter(|r| r.source() == RegionSource::SpikeCache)
            .count();
        let contexts = CANONICAL_ORDER
            .iter()
            .filter(|r| r.source() == RegionSource::Context)
            .count();
        assert_eq!(caches, 6);
        assert_eq!(contexts, 7);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Region::from_name("output"), Some(Region::Output));
        assert_eq!(Region::from_name("o_feedforward"), Some(Region::OutputNetFeedforward));
        assert_eq!(Region::from_name("heap"), None);
    }

    #[test]
    fn test_table_stream_roundtrip() {
        let table = RegionTable::from_fn(|r| (r.index() as u32) * 0x0101_0101);
        let stream = table.to_stream();
        assert_eq!(stream.len(), RegionTable::ENCODED_SIZE);
        assert_eq!(&stream.as_bytes()[4..8], &[1, 1, 1, 1]);
        assert_eq!(RegionTable::from_bytes(stream.as_bytes()).unwrap(), table);
    }

    #[test]
    fn test_table_from_bytes_wrong_length() {
        assert_eq!(
            RegionTable::from_bytes(&[0; 12]),
            Err(ImageError::InvalidLength { expected: 68, actual: 12 })
        );
    }

    #[test]
    fn test_table_index() {
        let mut table = RegionTable::new();
        table[Region::Output] = 128;
        table.set(Region::InputMovement, 8);
        assert_eq!(table.get(Region::Output), 128);
        assert_eq!(table[Region::InputMovement], 8);
        assert_eq!(table.sum(), 136);
    }
}
