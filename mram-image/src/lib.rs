//! # mram-image
//!
//! Builds the initial memory image of a simulated DPU running the TBS
//! (thousand-brains) benchmark: the control transfers (`parameters`, `sizes`,
//! `addresses`), the MRAM heap with every region's initial contents, and the
//! zeroed reservation the DPU writes its answer into.
//!
//! Regions are declared once, in [`regions`], in the order the DPU program
//! expects them. The layout planner and the heap packager both walk that
//! list, so a region's planned offset is always where its bytes land.
//!
//! ```
//! use mram_image::{Channel, ImageBuilder, ImageConfig, ModelSnapshot, TbsSizer};
//!
//! let builder = ImageBuilder::with_sizer(ImageConfig::default(), &TbsSizer).unwrap();
//! let layout = builder.layout().unwrap();
//! let model = ModelSnapshot::zeroed(layout.sizes());
//!
//! let image = builder.build(0, 0, &model).unwrap();
//! let heap = image.get(Channel::Heap).unwrap();
//! assert_eq!(heap.len() as u32, layout.total_bytes());
//!
//! let output = builder.output_region().unwrap();
//! assert_eq!(image.heap_output_offset(), output.offset_bytes);
//! ```

pub mod bounds;
pub mod config;
pub mod control;
pub mod errors;
pub mod heap;
pub mod image;
pub mod layout;
pub mod memory;
pub mod model;
pub mod output;
pub mod params;
pub mod regions;
pub mod sizer;
pub mod stream;

pub use bounds::ExecutionBounds;
pub use config::{ImageConfig, Retention, StatePolicy, Topology};
pub use control::{ControlPackager, ControlStreams};
pub use errors::{Bound, ImageError, Result};
pub use heap::HeapPackager;
pub use image::{Channel, ImageBuilder, MemoryImage};
pub use layout::{RegionFootprint, RegionLayout, RegionOffset};
pub use model::{EmptyModel, HostInputs, ModelSnapshot, Movement, RegionContentProvider};
pub use output::OutputRegion;
pub use params::{ModelParams, Record};
pub use regions::{Region, RegionSource, RegionTable, CANONICAL_ORDER, REGION_COUNT};
pub use sizer::{FixedSizer, RegionSizer, TbsSizer};
pub use stream::ByteStream;
