#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info, instrument};

use crate::bounds::ExecutionBounds;
use crate::config::ImageConfig;
use crate::control::{ControlPackager, ControlStreams};
use crate::errors::{ImageError, Result};
use crate::heap::HeapPackager;
use crate::layout::RegionLayout;
use crate::memory::{ADDRESSES_SYMBOL, MRAM_HEAP_POINTER_NAME, PARAMS_SYMBOL, SIZES_SYMBOL};
use crate::model::{HostInputs, Movement, RegionContentProvider};
use crate::output::OutputRegion;
use crate::sizer::RegionSizer;
use crate::stream::ByteStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Parameters,
    Sizes,
    Addresses,
    Heap,
    Output,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Parameters,
        Channel::Sizes,
        Channel::Addresses,
        Channel::Heap,
        Channel::Output,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Channel::Parameters => "parameters",
            Channel::Sizes => "sizes",
            Channel::Addresses => "addresses",
            Channel::Heap => "heap",
            Channel::Output => "output",
        }
    }

    /// The DPU symbol the channel is transferred to. Heap and output both
    /// address the MRAM heap, at different offsets.
    pub const fn symbol(self) -> &'static str {
        match self {
            Channel::Parameters => PARAMS_SYMBOL,
            Channel::Sizes => SIZES_SYMBOL,
            Channel::Addresses => ADDRESSES_SYMBOL,
            Channel::Heap | Channel::Output => MRAM_HEAP_POINTER_NAME,
        }
    }

    pub fn from_name(name: &str) -> Option<Channel> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything transferred to one DPU for one execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryImage {
    streams: BTreeMap<Channel, ByteStream>,
    heap_output_offset: u32,
}

impl MemoryImage {
    pub fn get(&self, channel: Channel) -> Option<&ByteStream> {
        self.streams.get(&channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &ByteStream)> {
        self.streams.iter().map(|(c, s)| (*c, s))
    }

    /// Offset of the output reservation inside the MRAM heap.
    pub fn heap_output_offset(&self) -> u32 {
        self.heap_output_offset
    }
}

struct Prepared {
    layout: RegionLayout,
    output: OutputRegion,
}

/// Prepares MRAM images for the TBS benchmark.
///
/// Created from a configuration, then [`initialize`](Self::initialize)d once
/// with a sizer; the layout is fixed from then on. Every per-DPU call
/// re-serializes current state, nothing is cached.
///
/// Output artifacts (`output_host`, `output_heap`, `build`) validate the
/// execution and DPU indices; input artifacts do not.
pub struct ImageBuilder {
    config: ImageConfig,
    bounds: ExecutionBounds,
    inputs: HostInputs,
    prepared: Option<Prepared>,
}

impl ImageBuilder {
    pub fn new(config: ImageConfig) -> Result<Self> {
        config.validate()?;
        let bounds = ExecutionBounds::from_config(&config)?;
        Ok(Self {
            config,
            bounds,
            inputs: HostInputs::default(),
            prepared: None,
        })
    }

    pub fn with_sizer(config: ImageConfig, sizer: &dyn RegionSizer) -> Result<Self> {
        let mut builder = Self::new(config)?;
        builder.initialize(sizer)?;
        Ok(builder)
    }

    /// Size and lay out the regions. The movement is reset to the origin and
    /// every feature column is cleared.
    pub fn initialize(&mut self, sizer: &dyn RegionSizer) -> Result<&RegionLayout> {
        let footprints = sizer.footprints(&self.config.model)?;
        let layout = RegionLayout::plan(footprints)?;

        if !layout.fits_in(self.config.heap_capacity) {
            return Err(ImageError::HeapTooLarge {
                required: layout.total_bytes() as u64,
                capacity: self.config.heap_capacity as u64,
            });
        }

        for (region, offset, size) in layout.iter() {
            debug!(region = %region, offset, size, "planned region");
        }
        info!(
            heap_bytes = layout.total_bytes(),
            num_dpus = self.bounds.num_dpus,
            num_executions = self.bounds.num_executions,
            "MRAM layout planned"
        );

        self.inputs = HostInputs {
            movement: Movement::default(),
            active_columns: vec![0; self.config.model.features.cols as usize],
        };
        let output = OutputRegion::from_layout(&layout);
        let prepared = self.prepared.insert(Prepared { layout, output });
        Ok(&prepared.layout)
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    pub fn bounds(&self) -> ExecutionBounds {
        self.bounds
    }

    pub fn layout(&self) -> Result<&RegionLayout> {
        self.prepared()
            .map(|p| &p.layout)
            .ok_or(ImageError::NotInitialized("layout"))
    }

    pub fn output_region(&self) -> Result<OutputRegion> {
        self.prepared()
            .map(|p| p.output)
            .ok_or(ImageError::NotInitialized("output region"))
    }

    pub fn inputs(&self) -> &HostInputs {
        &self.inputs
    }

    pub fn set_movement(&mut self, movement: Movement) {
        self.inputs.movement = movement;
    }

    pub fn set_active_columns(&mut self, active_columns: Vec<u32>) {
        self.inputs.active_columns = active_columns;
    }

    pub fn control(&self) -> Result<ControlStreams> {
        let prepared = self.prepared().ok_or(ImageError::NotInitialized("control streams"))?;
        Ok(ControlPackager::package(&self.config.model, &prepared.layout))
    }

    /// `parameters`, `sizes` and `addresses`; identical for every DPU.
    pub fn input_host(&self, _execution: usize, _dpu: usize) -> Result<BTreeMap<Channel, ByteStream>> {
        let control = self.control()?;
        Ok(BTreeMap::from([
            (Channel::Parameters, control.parameters),
            (Channel::Sizes, control.sizes),
            (Channel::Addresses, control.addresses),
        ]))
    }

    /// Nothing is read back through host symbols; only the indices are
    /// checked.
    pub fn output_host(&self, execution: usize, dpu: usize) -> Result<BTreeMap<Channel, ByteStream>> {
        self.bounds.validate(execution, dpu)?;
        Ok(BTreeMap::new())
    }

    /// Heap offset (always 0) and the full initial heap.
    pub fn input_heap(
        &self,
        _execution: usize,
        _dpu: usize,
        provider: &dyn RegionContentProvider,
    ) -> Result<(u32, ByteStream)> {
        let prepared = self.prepared().ok_or(ImageError::NotInitialized("heap image"))?;
        let heap = HeapPackager::new(&prepared.layout, self.config.state)
            .package(provider, &self.inputs)?;
        Ok((0, heap))
    }

    /// Offset and zeroed reservation of the output region.
    pub fn output_heap(&self, execution: usize, dpu: usize) -> Result<(u32, ByteStream)> {
        self.bounds.validate(execution, dpu)?;
        let output = self.output_region()?;
        Ok((output.offset_bytes, output.reservation()))
    }

    #[instrument(skip(self, provider))]
    pub fn build(
        &self,
        execution: usize,
        dpu: usize,
        provider: &dyn RegionContentProvider,
    ) -> Result<MemoryImage> {
        self.bounds.validate(execution, dpu)?;

        let mut streams = self.input_host(execution, dpu)?;
        let (_, heap) = self.input_heap(execution, dpu, provider)?;
        let (heap_output_offset, reservation) = self.output_heap(execution, dpu)?;
        streams.insert(Channel::Heap, heap);
        streams.insert(Channel::Output, reservation);

        debug!(
            heap_bytes = streams[&Channel::Heap].len(),
            heap_output_offset,
            "memory image built"
        );
        Ok(MemoryImage { streams, heap_output_offset })
    }

    fn prepared(&self) -> Option<&Prepared> {
        self.prepared.as_ref()
    }
}
