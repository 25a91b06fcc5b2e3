//! Compress command: pyramid levels written as individual snapshots.

use anyhow::Result;
use pxl_engine::{Backend, Processor};
#[allow(unused_imports)]
use tracing::{debug, info, trace};

use crate::CompressArgs;

pub fn run(args: CompressArgs, backend: Backend, verbose: bool) -> Result<()> {
    trace!(input = %args.input.display(), levels = args.levels, "compress::run");

    let img = super::load_buffer(&args.input)?;
    println!(
        "Starting {}-level compression of {}x{}",
        args.levels,
        img.width(),
        img.height()
    );

    let processor = Processor::new(backend);
    let start = std::time::Instant::now();
    let levels = processor.compress(&img, args.levels)?;
    let elapsed = start.elapsed();

    let prefix = args.output.display();
    for (i, level) in levels.iter().enumerate() {
        let path = format!("{}_level_{}.png", prefix, i + 1);
        super::save_buffer(std::path::Path::new(&path), level)?;
        println!("  level {}: {}x{}", i + 1, level.width(), level.height());
        if verbose {
            println!("    wrote {path}");
        }
    }

    // The last level doubles as the final compressed output.
    if let Some(last) = levels.last() {
        let path = format!("{prefix}_final.png");
        super::save_buffer(std::path::Path::new(&path), last)?;
        println!(
            "Final compressed size: {}x{} pixels ({:.4} s)",
            last.width(),
            last.height(),
            elapsed.as_secs_f64()
        );
    }

    if levels.len() < args.levels as usize {
        println!(
            "Stopped after {} of {} levels (16 px floor)",
            levels.len(),
            args.levels
        );
    }

    Ok(())
}
