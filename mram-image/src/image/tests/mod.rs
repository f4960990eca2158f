
use super::*;
use crate::model::{EmptyModel, ModelSnapshot};
use crate::regions::{Region, RegionTable, CANONICAL_ORDER};
use crate::sizer::{FixedSizer, TbsSizer};

fn setup_builder(sizes: RegionTable) -> ImageBuilder {
    ImageBuilder::with_sizer(ImageConfig::default(), &FixedSizer(sizes)).unwrap()
}

// 4, 0, 10 bytes followed by zero-sized regions
fn small_table() -> RegionTable {
    let mut sizes = RegionTable::new();
    sizes.set(Region::FeatureNetFeatureContext, 4);
    sizes.set(Region::FeatureNetLocationContext, 0);
    sizes.set(Region::LocationNetLocationContext, 10);
    sizes
}

// Every model buffer filled with its region index + 1.
fn tagged_model(sizes: &RegionTable) -> ModelSnapshot {
    let mut model = ModelSnapshot::zeroed(sizes);
    for &region in CANONICAL_ORDER {
        if let Some(buf) = model.region_mut(region) {
            buf.fill(region.index() as u8 + 1);
        }
    }
    model
}
