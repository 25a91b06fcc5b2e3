//! Apply command: one filter, one input, one output.

use anyhow::Result;
use pxl_core::FilterRequest;
use pxl_engine::{Backend, EngineError, Processor};
#[allow(unused_imports)]
use tracing::{debug, info, trace};

use crate::ApplyArgs;

pub fn run(args: ApplyArgs, backend: Backend, verbose: bool) -> Result<()> {
    trace!(input = %args.input.display(), filter = %args.filter, "apply::run");

    let params = super::parse_params(&args.params)?;
    let request = FilterRequest::parse(&args.filter, &params).map_err(EngineError::from)?;

    let img = super::load_buffer(&args.input)?;
    info!(
        filter = request.name(),
        width = img.width(),
        height = img.height(),
        channels = img.channels(),
        "applying filter"
    );

    let processor = Processor::new(backend);
    let mut reports = processor.apply_all(&img, std::slice::from_ref(&request));
    let report = reports.remove(0);
    let out = report.result?;

    super::save_buffer(&args.output, &out)?;

    println!(
        "{}: {:.4} s ({:?})",
        report.name,
        report.elapsed.as_secs_f64(),
        report.backend
    );
    if verbose {
        println!(
            "{} -> {} ({}x{})",
            args.input.display(),
            args.output.display(),
            out.width(),
            out.height()
        );
    }

    Ok(())
}
