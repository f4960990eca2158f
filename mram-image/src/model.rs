//! Sources of region contents.
//!
//! The learning module owns most of the heap's initial bytes. The builder
//! never holds on to them: it borrows a [`RegionContentProvider`] for the
//! duration of one build, so the model cannot be mutated while it is being
//! serialized.

use std::collections::BTreeMap;

use crate::regions::{Region, RegionSource, RegionTable, CANONICAL_ORDER};
use crate::stream::ByteStream;

pub trait RegionContentProvider {
    /// Current raw bytes of a model-owned region, or `None` when the model
    /// has no buffer for it. Only asked for `Context`, `ExternalActivity`
    /// and `SpikeCache` regions.
    fn region_bytes(&self, region: Region) -> Option<&[u8]>;
}

/// A provider with no buffers; every model region packs as zeros.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyModel;

impl RegionContentProvider for EmptyModel {
    fn region_bytes(&self, _region: Region) -> Option<&[u8]> {
        None
    }
}

/// An owned copy of the model buffers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelSnapshot {
    buffers: BTreeMap<Region, Vec<u8>>,
}

impl ModelSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-filled buffers for every model-owned region, sized from `sizes`.
    pub fn zeroed(sizes: &RegionTable) -> Self {
        let buffers = CANONICAL_ORDER
            .iter()
            .filter(|r| is_model_owned(**r))
            .map(|&r| (r, vec![0u8; sizes.get(r) as usize]))
            .collect();
        Self { buffers }
    }

    pub fn set(&mut self, region: Region, bytes: Vec<u8>) {
        self.buffers.insert(region, bytes);
    }

    pub fn region_mut(&mut self, region: Region) -> Option<&mut Vec<u8>> {
        self.buffers.get_mut(&region)
    }

    pub fn remove(&mut self, region: Region) -> Option<Vec<u8>> {
        self.buffers.remove(&region)
    }
}

impl RegionContentProvider for ModelSnapshot {
    fn region_bytes(&self, region: Region) -> Option<&[u8]> {
        self.buffers.get(&region).map(Vec::as_slice)
    }
}

pub(crate) fn is_model_owned(region: Region) -> bool {
    matches!(
        region.source(),
        RegionSource::Context | RegionSource::ExternalActivity | RegionSource::SpikeCache
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Movement {
    pub x: i32,
    pub y: i32,
}

impl Movement {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_stream(&self) -> ByteStream {
        let mut stream = ByteStream::with_capacity(8);
        stream.append_i32_le(self.x);
        stream.append_i32_le(self.y);
        stream
    }
}

/// State the host sets before each step: where the sensor moved and which
/// feature columns are active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostInputs {
    pub movement: Movement,
    pub active_columns: Vec<u32>,
}

impl HostInputs {
    pub fn features_stream(&self) -> ByteStream {
        let mut stream = ByteStream::with_capacity(self.active_columns.len() * 4);
        for &word in &self.active_columns {
            stream.append_u32_le(word);
        }
        stream
    }
}
