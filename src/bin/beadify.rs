use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bead_pattern_wasm::{
    ColorLimit, DEFAULT_EXPORT_NAME, RenderConfig, bead_pattern_bytes, extract_palette_bytes,
};
use clap::Parser;
use log::LevelFilter;

/// Preview images as bead patterns (native wrapper around the WASM library).
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// JSON render configuration; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of beads across; height follows the aspect ratio
    #[arg(short = 'w', long)]
    grid_width: Option<u32>,

    /// Maximum number of colors, or "max" for all of them
    #[arg(short = 'c', long)]
    colors: Option<String>,

    /// Posterize channels to flat bands before counting colors
    #[arg(long)]
    no_gradient: bool,

    /// Draw grid lines under the beads
    #[arg(long, conflicts_with = "no_grid")]
    grid: bool,

    /// Do not draw grid lines
    #[arg(long)]
    no_grid: bool,

    /// Bead cell size on the output image, in pixels
    #[arg(long)]
    bead_size: Option<u32>,

    /// Gap between beads, in pixels
    #[arg(long)]
    gap: Option<u32>,

    /// Output directory (defaults to the current directory)
    #[arg(short = 'd', long)]
    out_dir: Option<PathBuf>,

    /// Print the palette report as JSON instead of writing images
    #[arg(long)]
    palette_only: bool,

    /// Print the palette report as JSON after writing each image
    #[arg(long)]
    report: bool,

    /// Log debug information
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn render_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => RenderConfig::default(),
        };

        if let Some(w) = self.grid_width {
            config.grid_width = w;
        }
        if let Some(colors) = &self.colors {
            config.color_limit = ColorLimit::parse(colors);
        }
        if self.no_gradient {
            config.no_gradient = true;
        }
        if self.grid {
            config.show_grid = true;
        }
        if self.no_grid {
            config.show_grid = false;
        }
        if let Some(size) = self.bead_size {
            config.style.bead_size = size;
        }
        if let Some(gap) = self.gap {
            config.style.gap = gap;
        }
        Ok(config.normalized())
    }

    /// `bead-pattern.png` for a single input, `<stem>-bead-pattern.png` otherwise.
    fn output_path(&self, input: &Path) -> PathBuf {
        let name = if self.inputs.len() == 1 {
            DEFAULT_EXPORT_NAME.to_string()
        } else {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            format!("{stem}-{DEFAULT_EXPORT_NAME}")
        };
        match &self.out_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = args.render_config()?;
    log::debug!("render config: {config:?}");

    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;

        if args.palette_only {
            let report = extract_palette_bytes(&bytes, &config)
                .with_context(|| format!("palette extraction failed for {}", input.display()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            continue;
        }

        let (png, report) = bead_pattern_bytes(&bytes, &config)
            .with_context(|| format!("bead pattern processing failed for {}", input.display()))?;

        let out_path = args.output_path(input);
        if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&out_path, png).with_context(|| format!("writing {}", out_path.display()))?;
        println!(
            "Saved → {} ({} colors)",
            out_path.display(),
            report.total_colors
        );

        if args.report {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
