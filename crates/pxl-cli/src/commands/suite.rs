//! Suite command: the classic five-filter batch with a timing summary.

use anyhow::Result;
use pxl_core::{FilterKind, FilterRequest};
use pxl_engine::{Backend, Processor};
#[allow(unused_imports)]
use tracing::{debug, info, trace};

use crate::SuiteArgs;

/// The five filters of the original processing suite, with the file
/// suffix each output is saved under. The noise request goes through the
/// parser without a seed, so each run gets a fresh stream.
fn suite_requests() -> Result<Vec<(FilterRequest, &'static str)>> {
    let mut noise_params = std::collections::HashMap::new();
    noise_params.insert("level".to_string(), 25.0);
    let noise = FilterRequest::parse("noise", &noise_params)
        .map_err(pxl_engine::EngineError::from)?;

    Ok(vec![
        (FilterRequest::new(FilterKind::Grayscale), "grayscale"),
        (FilterRequest::new(FilterKind::Blur { sigma: 2.0 }), "blur"),
        (FilterRequest::new(FilterKind::Sharpen { intensity: 1.0 }), "sharp"),
        (noise, "noise"),
        (FilterRequest::new(FilterKind::EdgeDetect), "edges"),
    ])
}

pub fn run(args: SuiteArgs, backend: Backend, verbose: bool) -> Result<()> {
    trace!(input = %args.input.display(), "suite::run");

    let img = super::load_buffer(&args.input)?;
    println!(
        "Image loaded: {}x{} pixels, {} channels",
        img.width(),
        img.height(),
        img.channels()
    );

    let suite = suite_requests()?;
    let requests: Vec<FilterRequest> = suite.iter().map(|(r, _)| r.clone()).collect();

    let processor = Processor::new(backend);
    let reports = processor.apply_all(&img, &requests);

    let mut total = 0.0f64;
    let mut failures = 0usize;
    for (report, (_, suffix)) in reports.into_iter().zip(&suite) {
        total += report.elapsed.as_secs_f64();
        match report.result {
            Ok(out) => {
                let path = args
                    .output_dir
                    .join(format!("{}_{}.png", args.prefix, suffix));
                super::save_buffer(&path, &out)?;
                println!("{}: {:.4} s", report.name, report.elapsed.as_secs_f64());
                if verbose {
                    println!("  wrote {}", path.display());
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("{}: failed: {e}", report.name);
            }
        }
    }

    println!("Total processing time: {total:.4} s");
    if failures > 0 {
        anyhow::bail!("{failures} of 5 filters failed");
    }
    Ok(())
}
