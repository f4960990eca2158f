use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use goblin::Object;
use mram_image::{Channel, ImageBuilder, ImageConfig, MemoryImage, ModelSnapshot, RegionLayout, TbsSizer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Build the TBS MRAM image for one DPU and write each channel to disk.
#[derive(Parser, Debug)]
#[command(name = "mram-dump", version)]
struct Args {
    /// JSON configuration; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the channel files are written to
    #[arg(short, long, default_value = "mram-out")]
    out_dir: PathBuf,

    #[arg(long, default_value_t = 0)]
    execution: usize,

    #[arg(long, default_value_t = 0)]
    dpu: usize,

    #[arg(long)]
    num_channels: Option<u32>,

    #[arg(long)]
    num_ranks_per_channel: Option<u32>,

    #[arg(long)]
    num_dpus_per_rank: Option<u32>,

    #[arg(long)]
    num_tasklets: Option<u32>,

    /// Compiled DPU program whose host symbols must match the control streams
    #[arg(long)]
    binary: Option<PathBuf>,
}

impl Args {
    fn load_config(&self) -> Result<ImageConfig> {
        let mut config = match &self.config {
            Some(path) => ImageConfig::from_path(path)?,
            None => ImageConfig::default(),
        };
        let topology = &mut config.topology;
        if let Some(n) = self.num_channels {
            topology.num_channels = n;
        }
        if let Some(n) = self.num_ranks_per_channel {
            topology.num_ranks_per_channel = n;
        }
        if let Some(n) = self.num_dpus_per_rank {
            topology.num_dpus_per_rank = n;
        }
        if let Some(n) = self.num_tasklets {
            topology.num_tasklets = n;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.load_config()?;
    let builder = ImageBuilder::with_sizer(config, &TbsSizer)?;

    // the table is known once the builder is initialized, before any index is checked
    let layout = builder.layout()?;
    print!("{}", render_layout(layout));

    let model = ModelSnapshot::zeroed(layout.sizes());
    let image = builder.build(args.execution, args.dpu, &model)?;

    if let Some(binary) = &args.binary {
        check_symbols(binary, &image)?;
    }

    write_channels(&args.out_dir, &image)?;
    Ok(())
}

fn render_layout(layout: &RegionLayout) -> String {
    let mut table = String::from("MRAM content:\n");
    for (region, offset, size) in layout.iter() {
        table.push_str(&format!("\t{:<24} {:>10} B at {:>10}\n", region.name(), size, offset));
    }
    table.push_str(&format!(
        "\ttotal: {} B ({} KiB)\n",
        layout.total_bytes(),
        layout.total_bytes() >> 10
    ));
    table
}

fn write_channels(out_dir: &Path, image: &MemoryImage) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    for (channel, stream) in image.iter() {
        let path = out_dir.join(format!("{}.bin", channel.name()));
        fs::write(&path, stream.as_bytes())
            .with_context(|| format!("writing {}", path.display()))?;
        info!(channel = %channel, bytes = stream.len(), path = %path.display(), "wrote channel");
    }
    println!("Raw channels saved to {}", out_dir.display());
    Ok(())
}

/// Every control stream must fill its host symbol exactly.
fn check_symbols(binary: &Path, image: &MemoryImage) -> Result<()> {
    let buffer = fs::read(binary).with_context(|| format!("reading {}", binary.display()))?;

    let Object::Elf(elf) = Object::parse(&buffer)? else {
        bail!("{} is not an ELF file", binary.display());
    };

    let symbol_size = |name: &str| {
        elf.syms
            .iter()
            .find(|sym| elf.strtab.get_at(sym.st_name) == Some(name))
            .map(|sym| sym.st_size)
    };

    for channel in [Channel::Parameters, Channel::Sizes, Channel::Addresses] {
        let Some(stream) = image.get(channel) else {
            continue;
        };
        match symbol_size(channel.symbol()) {
            Some(size) if size == stream.len() as u64 => {
                info!(channel = %channel, symbol = channel.symbol(), size, "symbol matches");
            }
            Some(size) => bail!(
                "symbol `{}` is {} bytes but the {} stream is {} bytes",
                channel.symbol(),
                size,
                channel,
                stream.len()
            ),
            None => bail!("symbol `{}` not found in {}", channel.symbol(), binary.display()),
        }
    }

    if symbol_size(Channel::Heap.symbol()).is_none() {
        warn!(symbol = Channel::Heap.symbol(), "MRAM heap pointer symbol not found");
    }
    Ok(())
}
