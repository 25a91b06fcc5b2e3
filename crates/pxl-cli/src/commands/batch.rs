//! Batch command: apply one filter to every file matching a glob
//! pattern, frames processed as independent images in parallel.

use anyhow::{bail, Result};
use pxl_core::FilterRequest;
use pxl_engine::{Backend, EngineError, Processor};
use rayon::prelude::*;
use std::path::PathBuf;
#[allow(unused_imports)]
use tracing::{debug, info, trace};

use crate::BatchArgs;

pub fn run(args: BatchArgs, backend: Backend, verbose: bool) -> Result<()> {
    trace!(pattern = %args.pattern, filter = %args.filter, "batch::run");

    let files: Vec<PathBuf> = glob::glob(&args.pattern)?
        .filter_map(|r| r.ok())
        .collect();
    if files.is_empty() {
        bail!("no files match pattern: {}", args.pattern);
    }

    let params = super::parse_params(&args.params)?;
    let request = FilterRequest::parse(&args.filter, &params).map_err(EngineError::from)?;

    std::fs::create_dir_all(&args.output_dir)?;

    info!(files = files.len(), filter = request.name(), "starting batch");
    if verbose {
        println!("Found {} files matching '{}'", files.len(), args.pattern);
    }

    let processor = Processor::new(backend);
    let results: Vec<Result<()>> = files
        .par_iter()
        .map(|input| process_file(input, &args.output_dir, &request, &processor, verbose))
        .collect();

    let mut success = 0;
    let mut failed = 0;
    for (file, result) in files.iter().zip(&results) {
        match result {
            Ok(()) => success += 1,
            Err(e) => {
                failed += 1;
                eprintln!("{}: {e:#}", file.display());
            }
        }
    }

    println!("Batch complete: {success} succeeded, {failed} failed");
    if failed > 0 {
        bail!("{failed} of {} files failed", files.len());
    }
    Ok(())
}

fn process_file(
    input: &PathBuf,
    output_dir: &std::path::Path,
    request: &FilterRequest,
    processor: &Processor,
    verbose: bool,
) -> Result<()> {
    let img = super::load_buffer(input)?;
    let out = processor.apply(&img, request)?;

    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame.png".to_string());
    let out_path = output_dir.join(name).with_extension("png");
    super::save_buffer(&out_path, &out)?;

    if verbose {
        println!("{} -> {}", input.display(), out_path.display());
    }
    Ok(())
}
