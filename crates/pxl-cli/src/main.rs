//! pxl - pixel-processing engine CLI
//!
//! Applies convolution and geometry filters to images on the CPU or GPU.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pxl_engine::Backend;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod codec;
mod commands;

#[derive(Parser)]
#[command(name = "pxl")]
#[command(author, version, about = "Pixel-processing engine CLI")]
#[command(long_about = "
Applies convolution and geometry filters to images, on the CPU (work-shared
across threads) or the GPU (compute kernels with graph replay), with
automatic per-task fallback from GPU to CPU.

Examples:
  pxl apply photo.png -o out.png -f blur -p sigma=2.0
  pxl apply photo.png -o out.png -f rotate90 -p times=1 --backend gpu
  pxl suite photo.png -d out               # classic five-filter batch
  pxl compress photo.png -l 3 -o out/pyr   # pyramid levels
  pxl batch 'frames/*.png' -d out -f grayscale
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Number of worker threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    /// Execution backend
    #[arg(long, global = true, value_enum, default_value = "auto")]
    backend: BackendArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    /// GPU when available, CPU otherwise.
    Auto,
    /// CPU only.
    Cpu,
    /// Prefer GPU, fall back per task.
    Gpu,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => Backend::Auto,
            BackendArg::Cpu => Backend::Cpu,
            BackendArg::Gpu => Backend::Gpu,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a single filter to an image
    #[command(visible_alias = "a")]
    Apply(ApplyArgs),

    /// Run the classic five-filter suite (grayscale, blur, sharpen,
    /// noise, edges) and write all outputs
    Suite(SuiteArgs),

    /// Pyramid compression: write each blur+halve level
    #[command(visible_alias = "c")]
    Compress(CompressArgs),

    /// Apply one filter to every file matching a glob pattern
    Batch(BatchArgs),
}

#[derive(Args)]
struct ApplyArgs {
    /// Input image
    input: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// Filter name (grayscale, blur, sharpen, noise, edges, brightness,
    /// saturation, flip-h, flip-v, rotate90, rotate, downsample, compress)
    #[arg(short, long)]
    filter: String,

    /// Filter parameter as key=value (repeatable)
    #[arg(short = 'p', long = "param")]
    params: Vec<String>,
}

#[derive(Args)]
struct SuiteArgs {
    /// Input image
    input: PathBuf,

    /// Output directory
    #[arg(short = 'd', long, default_value = "output")]
    output_dir: PathBuf,

    /// Output file name prefix
    #[arg(long, default_value = "out")]
    prefix: String,
}

#[derive(Args)]
struct CompressArgs {
    /// Input image
    input: PathBuf,

    /// Number of pyramid levels
    #[arg(short, long, default_value = "3")]
    levels: u32,

    /// Output path prefix; levels land at <prefix>_level_<n>.png
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct BatchArgs {
    /// Glob pattern of input files (quote it)
    pattern: String,

    /// Output directory
    #[arg(short = 'd', long)]
    output_dir: PathBuf,

    /// Filter name
    #[arg(short, long)]
    filter: String,

    /// Filter parameter as key=value (repeatable)
    #[arg(short = 'p', long = "param")]
    params: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("failed to configure worker thread pool")?;
    }

    let backend = cli.backend.into();
    match cli.command {
        Commands::Apply(args) => commands::apply::run(args, backend, cli.verbose),
        Commands::Suite(args) => commands::suite::run(args, backend, cli.verbose),
        Commands::Compress(args) => commands::compress::run(args, backend, cli.verbose),
        Commands::Batch(args) => commands::batch::run(args, backend, cli.verbose),
    }
}
