use crate::errors::{ImageError, Result};
use crate::layout::RegionLayout;
use crate::regions::Region;
use crate::stream::ByteStream;

/// Where the DPU leaves its answer inside the MRAM heap.
///
/// The simulator reads `size_bytes` bytes back from
/// `heap pointer + offset_bytes` once the DPU halts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRegion {
    pub offset_bytes: u32,
    pub size_bytes: u32,
}

impl OutputRegion {
    pub fn from_layout(layout: &RegionLayout) -> Self {
        Self {
            offset_bytes: layout.offset(Region::Output),
            size_bytes: layout.footprint(Region::Output),
        }
    }

    /// Zero bytes reserved for the answer before execution.
    pub fn reservation(&self) -> ByteStream {
        ByteStream::zeroed(self.size_bytes as usize)
    }

    /// The answer bytes within a heap read back from the device.
    pub fn extract<'h>(&self, device_heap: &'h [u8]) -> Result<&'h [u8]> {
        let start = self.offset_bytes as usize;
        let end = start + self.size_bytes as usize;
        device_heap
            .get(start..end)
            .ok_or_else(|| ImageError::invalid_length(end, device_heap.len()))
    }

    /// The answer as little-endian `u32` words, one bit per output cell.
    pub fn extract_words(&self, device_heap: &[u8]) -> Result<Vec<u32>> {
        let bytes = self.extract(device_heap)?;
        if bytes.len() % 4 != 0 {
            return Err(ImageError::invalid_length(bytes.len() / 4 * 4, bytes.len()));
        }
        Ok(bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }
}
