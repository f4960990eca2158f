//! Model parameter records sent on the `parameters` channel.
//!
//! Each record is encoded field by field in declaration order, little-endian,
//! with the padding the DPU compiler inserts for natural alignment written
//! out as explicit zero bytes. The encoded sizes are fixed:
//!
//! ```text
//! HtmParams            5   u8 x5
//! ExtendedHtmParams    5   u8 x5
//! OutputLayerParams   20   u16 u8 u8 u8 [pad 1] u16 u8 u8 htm ext_htm
//! FeatureLayerParams  12   u16 u16 u8 u8 htm [pad 1]
//! LocationLayerParams 28   u32 u32 u32 u8 u8 htm [pad 1] u32 u32
//! ModelParams         60   output features location
//! ```

use serde::{Deserialize, Serialize};

use crate::stream::ByteStream;

/// A fixed-layout record the device reads as a C struct.
pub trait Record {
    const ENCODED_SIZE: usize;

    fn encode(&self, out: &mut ByteStream);

    fn to_stream(&self) -> ByteStream {
        let mut stream = ByteStream::with_capacity(Self::ENCODED_SIZE);
        self.encode(&mut stream);
        debug_assert_eq!(stream.len(), Self::ENCODED_SIZE);
        stream
    }
}

/// Fixed-point representation of a permanence in `[0, 1]`.
pub fn repr_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmParams {
    pub permanence_threshold: u8,
    pub segment_spiking_threshold: u8,
    pub perm_increment: u8,
    pub perm_decrement: u8,
    /// Decay applied to predicted but inactive cells.
    pub perm_decay: u8,
}

impl Default for HtmParams {
    fn default() -> Self {
        Self {
            permanence_threshold: repr_u8(0.5),
            segment_spiking_threshold: 15,
            perm_increment: repr_u8(0.06),
            perm_decrement: repr_u8(0.04),
            perm_decay: 1,
        }
    }
}

impl Record for HtmParams {
    const ENCODED_SIZE: usize = 5;

    fn encode(&self, out: &mut ByteStream) {
        out.append(self.permanence_threshold);
        out.append(self.segment_spiking_threshold);
        out.append(self.perm_increment);
        out.append(self.perm_decrement);
        out.append(self.perm_decay);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendedHtmParams {
    pub feedforward_permanence_threshold: u8,
    pub context_permanence_threshold: u8,
    pub feedforward_activation_threshold: u8,
    pub context_activation_threshold: u8,
    pub min_active_cells: u8,
}

impl Default for ExtendedHtmParams {
    fn default() -> Self {
        Self {
            feedforward_permanence_threshold: repr_u8(0.5),
            context_permanence_threshold: repr_u8(0.5),
            feedforward_activation_threshold: 3,
            context_activation_threshold: 18,
            min_active_cells: 10,
        }
    }
}

impl Record for ExtendedHtmParams {
    const ENCODED_SIZE: usize = 5;

    fn encode(&self, out: &mut ByteStream) {
        out.append(self.feedforward_permanence_threshold);
        out.append(self.context_permanence_threshold);
        out.append(self.feedforward_activation_threshold);
        out.append(self.context_activation_threshold);
        out.append(self.min_active_cells);
    }
}

pub const OUT_CELL_LOG_DIM: u8 = 10;
pub const NUM_EXTERNAL_LMS: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLayerParams {
    pub cells: u16,
    pub log_cells: u8,
    pub internal_context_segments: u8,
    pub external_context_segments: u8,
    pub external_cells: u16,
    pub log_external_cells: u8,
    pub external_lms: u8,
    pub htm: HtmParams,
    pub extended_htm: ExtendedHtmParams,
}

impl Default for OutputLayerParams {
    fn default() -> Self {
        Self {
            cells: 1 << OUT_CELL_LOG_DIM,
            log_cells: OUT_CELL_LOG_DIM,
            internal_context_segments: 6,
            external_context_segments: 6,
            external_cells: 1 << OUT_CELL_LOG_DIM,
            log_external_cells: OUT_CELL_LOG_DIM,
            external_lms: NUM_EXTERNAL_LMS,
            htm: HtmParams::default(),
            extended_htm: ExtendedHtmParams::default(),
        }
    }
}

impl Record for OutputLayerParams {
    const ENCODED_SIZE: usize = 20;

    fn encode(&self, out: &mut ByteStream) {
        out.append_u16_le(self.cells);
        out.append(self.log_cells);
        out.append(self.internal_context_segments);
        out.append(self.external_context_segments);
        out.pad(1); // external_cells is u16-aligned
        out.append_u16_le(self.external_cells);
        out.append(self.log_external_cells);
        out.append(self.external_lms);
        self.htm.encode(out);
        self.extended_htm.encode(out);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureLayerParams {
    pub cols: u16,
    /// Cells per column.
    pub cells: u16,
    /// Segments per cell.
    pub feature_segments: u8,
    pub location_segments: u8,
    pub htm: HtmParams,
}

impl Default for FeatureLayerParams {
    fn default() -> Self {
        Self {
            cols: 1024,
            cells: 8,
            feature_segments: 6,
            location_segments: 6,
            htm: HtmParams::default(),
        }
    }
}

impl Record for FeatureLayerParams {
    const ENCODED_SIZE: usize = 12;

    fn encode(&self, out: &mut ByteStream) {
        out.append_u16_le(self.cols);
        out.append_u16_le(self.cells);
        out.append(self.feature_segments);
        out.append(self.location_segments);
        self.htm.encode(out);
        out.pad(1);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogScale {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationLayerParams {
    /// Grid cell modules; laid out as `cols_sqrt x cols_sqrt`.
    pub cols: u32,
    pub log_cols_sqrt: u32,
    pub cells: u32,
    pub location_segments: u8,
    pub feature_segments: u8,
    pub htm: HtmParams,
    pub log_scale: LogScale,
}

impl Default for LocationLayerParams {
    fn default() -> Self {
        Self {
            cols: 1024,
            log_cols_sqrt: 5,
            cells: 8,
            location_segments: 6,
            feature_segments: 6,
            htm: HtmParams::default(),
            log_scale: LogScale::default(),
        }
    }
}

impl Record for LocationLayerParams {
    const ENCODED_SIZE: usize = 28;

    fn encode(&self, out: &mut ByteStream) {
        out.append_u32_le(self.cols);
        out.append_u32_le(self.log_cols_sqrt);
        out.append_u32_le(self.cells);
        out.append(self.location_segments);
        out.append(self.feature_segments);
        self.htm.encode(out);
        out.pad(1); // log_scale is u32-aligned
        out.append_u32_le(self.log_scale.x);
        out.append_u32_le(self.log_scale.y);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    pub output: OutputLayerParams,
    pub features: FeatureLayerParams,
    pub location: LocationLayerParams,
}

impl Record for ModelParams {
    const ENCODED_SIZE: usize = OutputLayerParams::ENCODED_SIZE
        + FeatureLayerParams::ENCODED_SIZE
        + LocationLayerParams::ENCODED_SIZE;

    fn encode(&self, out: &mut ByteStream) {
        self.output.encode(out);
        self.features.encode(out);
        self.location.encode(out);
    }
}
