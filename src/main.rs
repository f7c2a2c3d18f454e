//! imgrid CLI: assemble images into a collage, mosaic or interleave.
//!
//! ```text
//! imgrid --collage 3 2 img*.png
//! imgrid --mosaic 2 2 --labels 24 --out mosaic.tif a.tif b.tif c.tif d.tif
//! imgrid --interleave 8 --transpose left.png right.png
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::error::ErrorKind;
use clap::{ArgGroup, Parser};
use imgrid::{FileSource, FontRenderer, GlyphRenderer, LayoutMode, RunConfig, RunSummary};
use tracing::error;

#[derive(Parser)]
#[command(
    name = "imgrid",
    about = "Assemble a grid of images into one composite",
    version,
    arg_required_else_help = true,
    group(ArgGroup::new("mode").required(true).args(["collage", "mosaic", "interleave"]))
)]
struct Cli {
    /// Tile full images edge to edge on a W×H grid
    #[arg(long, num_args = 2, value_names = ["W", "H"])]
    collage: Option<Vec<u32>>,

    /// Crop each image to its own cell of a W×H grid
    #[arg(long, num_args = 2, value_names = ["W", "H"])]
    mosaic: Option<Vec<u32>>,

    /// Interleave N horizontal slices taken from the images in turn
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    interleave: Option<u32>,

    /// Output file; format follows the extension
    #[arg(short, long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Fill columns first (collage, mosaic) or slice vertically (interleave)
    #[arg(long)]
    transpose: bool,

    /// Keep the images in the order given
    #[arg(long)]
    unsorted: bool,

    /// Divide the output size by 2^K
    #[arg(long, value_name = "K", default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=3))]
    downsample: u8,

    /// Stamp each tile with its file name at font size S
    #[arg(long, value_name = "S", value_parser = clap::value_parser!(u32).range(10..))]
    labels: Option<u32>,

    /// Write 8-bit samples even for deeper inputs
    #[arg(long = "8-bit")]
    eight_bit: bool,

    /// TrueType font for labels
    #[arg(long, value_name = "PATH", env = "IMGRID_FONT")]
    font: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Input images
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,
}

impl Cli {
    fn mode(&self) -> Option<LayoutMode> {
        if let Some(&[w, h, ..]) = self.collage.as_deref() {
            return Some(LayoutMode::collage(w, h));
        }
        if let Some(&[w, h, ..]) = self.mosaic.as_deref() {
            return Some(LayoutMode::mosaic(w, h));
        }
        self.interleave
            .map(|slices| LayoutMode::Interleave { slices })
    }

    fn config(&self) -> anyhow::Result<RunConfig> {
        let Some(mode) = self.mode() else {
            bail!("one of --collage, --mosaic or --interleave is required");
        };
        let mut config = RunConfig::new(mode)
            .transpose(self.transpose)
            .unsorted(self.unsorted)
            .downsample(self.downsample)
            .force_8bit(self.eight_bit);
        if let Some(size) = self.labels {
            config = config.labels(size);
        }
        if let Some(out) = &self.out {
            config = config.out(out);
        }
        config.validate().context("invalid options")?;
        Ok(config)
    }
}

fn execute(cli: &Cli) -> anyhow::Result<RunSummary> {
    let config = cli.config()?;
    let font = match config.label_size {
        Some(_) => Some(FontRenderer::locate(cli.font.as_deref()).context("labels need a font")?),
        None => None,
    };
    let renderer = font.as_ref().map(|f| f as &dyn GlyphRenderer);

    imgrid::run(&config, &cli.images, &FileSource, renderer)
        .with_context(|| format!("cannot build {}", config.out.display()))
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::DisplayHelp => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
        Err(e) => e.exit(),
    };

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match execute(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
