//! Region layout planner.
//!
//! Offsets are a strict left-to-right prefix sum over the footprints in
//! canonical order, starting at 0. A zero-sized region keeps its slot: its
//! offset equals the next region's offset.

use std::ops::Range;

use crate::errors::{ImageError, Result};
use crate::regions::{Region, RegionTable, CANONICAL_ORDER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionFootprint {
    pub region: Region,
    pub size_bytes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionOffset {
    pub region: Region,
    pub offset_bytes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionLayout {
    sizes: RegionTable,
    addresses: RegionTable,
    total_bytes: u32,
}

impl RegionLayout {
    pub fn plan(footprints: RegionTable) -> Result<Self> {
        let mut addresses = RegionTable::new();
        let mut cursor: u32 = 0;

        for &region in CANONICAL_ORDER {
            addresses.set(region, cursor);
            cursor = cursor
                .checked_add(footprints.get(region))
                .ok_or(ImageError::LayoutOverflow(region))?;
        }

        Ok(Self {
            sizes: footprints,
            addresses,
            total_bytes: cursor,
        })
    }

    pub fn sizes(&self) -> &RegionTable {
        &self.sizes
    }

    pub fn addresses(&self) -> &RegionTable {
        &self.addresses
    }

    pub fn footprint(&self, region: Region) -> u32 {
        self.sizes.get(region)
    }

    pub fn offset(&self, region: Region) -> u32 {
        self.addresses.get(region)
    }

    /// Byte range of `region` inside the heap.
    pub fn range(&self, region: Region) -> Range<usize> {
        let start = self.offset(region) as usize;
        start..start + self.footprint(region) as usize
    }

    /// Minimum heap size the device allocator must reserve.
    pub fn total_bytes(&self) -> u32 {
        self.total_bytes
    }

    pub fn fits_in(&self, capacity: u32) -> bool {
        self.total_bytes <= capacity
    }

    /// `(region, offset, size)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Region, u32, u32)> + '_ {
        CANONICAL_ORDER
            .iter()
            .map(move |&r| (r, self.offset(r), self.footprint(r)))
    }

    pub fn footprints(&self) -> impl Iterator<Item = RegionFootprint> + '_ {
        self.sizes
            .iter()
            .map(|(region, size_bytes)| RegionFootprint { region, size_bytes })
    }

    pub fn offsets(&self) -> impl Iterator<Item = RegionOffset> + '_ {
        self.addresses
            .iter()
            .map(|(region, offset_bytes)| RegionOffset { region, offset_bytes })
    }
}
