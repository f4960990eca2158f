//! The three small host-to-DPU transfers that describe the heap.

use crate::layout::RegionLayout;
use crate::params::{ModelParams, Record};
use crate::stream::ByteStream;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlStreams {
    pub parameters: ByteStream,
    pub sizes: ByteStream,
    pub addresses: ByteStream,
}

pub struct ControlPackager;

impl ControlPackager {
    pub fn package(params: &ModelParams, layout: &RegionLayout) -> ControlStreams {
        ControlStreams {
            parameters: params.to_stream(),
            sizes: layout.sizes().to_stream(),
            addresses: layout.addresses().to_stream(),
        }
    }
}
