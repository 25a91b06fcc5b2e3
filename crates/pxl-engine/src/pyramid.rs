//! Pyramid compression: iterative blur + halve until the requested level
//! count or the 16-pixel floor is reached.

use pxl_core::{FilterKind, PixelBuffer};
use tracing::debug;

use crate::{EngineError, EngineResult};

/// Minimum dimension below which the pyramid stops early.
const MIN_LEVEL_DIM: usize = 16;

/// Builds pyramid levels by running `run` for the per-level blur and
/// downsample ops. Level `n` (1-based) is prefiltered with
/// `sigma = 0.8 * n` before halving. Returns one buffer per level
/// reached, possibly fewer than requested.
pub(crate) fn compress_levels<F>(
    img: &PixelBuffer,
    levels: u32,
    mut run: F,
) -> EngineResult<Vec<PixelBuffer>>
where
    F: FnMut(&PixelBuffer, &FilterKind) -> EngineResult<PixelBuffer>,
{
    if levels < 1 {
        return Err(EngineError::InvalidParameter(format!(
            "compression levels must be >= 1, got {levels}"
        )));
    }

    let mut out = Vec::new();
    let mut current = img.clone();

    for level in 1..=levels {
        let sigma = 0.8 * level as f32;
        let blurred = run(&current, &FilterKind::Blur { sigma })?;
        current = run(&blurred, &FilterKind::Downsample { factor: 2 })?;
        debug!(
            level,
            sigma,
            width = current.width(),
            height = current.height(),
            "pyramid level complete"
        );
        out.push(current.clone());

        if current.width() < MIN_LEVEL_DIM || current.height() < MIN_LEVEL_DIM {
            debug!(level, "pyramid floor reached, stopping early");
            break;
        }
    }

    Ok(out)
}
