// 1MB   = 0x0010_0000
// 32MB  = 0x0200_0000
// 64MB  = 0x0400_0000  (MRAM per DPU)

pub const MRAM_SIZE: u32 = 0x0400_0000;

// DMA transfers between WRAM and MRAM move 8-byte aligned blocks.
pub const DMA_ALIGNMENT: u32 = 8;

// Device symbols the host writes to.
pub const PARAMS_SYMBOL: &str = "p";
pub const SIZES_SYMBOL: &str = "size_bytes";
pub const ADDRESSES_SYMBOL: &str = "addresses";
pub const MRAM_HEAP_POINTER_NAME: &str = "__sys_used_mram_end";

// One dendritic segment: 40 packed connections of 4 bytes, a connection
// count byte, padded to 8.
pub const CONNECTIONS_PER_SEGMENT: u32 = 40;
pub const CONNECTION_BYTES: u32 = 4;
pub const SEGMENT_BYTES: u32 =
    round_up_8(CONNECTIONS_PER_SEGMENT * CONNECTION_BYTES + 1);

// Spike-count caches hold one u8 per segment.
pub const SPIKE_COUNT_BYTES: u32 = 1;

pub const fn round_up_8(n: u32) -> u32 {
    (n + (DMA_ALIGNMENT - 1)) & !(DMA_ALIGNMENT - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_size() {
        assert_eq!(SEGMENT_BYTES, 168);
    }

    #[test]
    fn test_round_up_8() {
        assert_eq!(round_up_8(0), 0);
        assert_eq!(round_up_8(1), 8);
        assert_eq!(round_up_8(8), 8);
        assert_eq!(round_up_8(4096), 4096);
        assert_eq!(round_up_8(4097), 4104);
    }
}
