//! Per-task filter execution with timing and GPU fallback.
//!
//! A dispatch batch moves through Idle -> Dispatching -> Collecting ->
//! Done: one task is spawned per requested filter, every task runs to
//! completion (there is no mid-filter cancellation), and the batch
//! gathers all reports before returning. A failed task reports its own
//! error; siblings are never aborted.

use std::time::{Duration, Instant};

use pxl_core::{FilterKind, FilterRequest, PixelBuffer};
use pxl_gpu::GpuExecutor;
use pxl_ops::parallel;
use tracing::{debug, warn};

use crate::{pyramid, EngineError, EngineResult};

/// Which backend ultimately produced a task's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionPath {
    /// Ran on the CPU executor as requested.
    Cpu,
    /// Ran on the GPU.
    Gpu,
    /// GPU was requested but failed; the task recovered on the CPU.
    CpuFallback {
        /// Device-side failure that triggered the fallback.
        reason: String,
    },
}

/// Outcome of one dispatched filter task.
#[derive(Debug)]
pub struct FilterReport {
    /// Catalog name of the filter.
    pub name: &'static str,
    /// The filtered buffer, or this task's own error.
    pub result: EngineResult<PixelBuffer>,
    /// Wall-clock time the task took, including any fallback retry.
    pub elapsed: Duration,
    /// Backend that produced the result.
    pub backend: ExecutionPath,
}

/// Outcome of a GPU attempt, separated so the dispatch decision is a
/// pure function of this value rather than scattered flag checks. Every
/// device-side failure is recoverable by falling back; there is no fatal
/// GPU outcome.
enum GpuAttempt {
    Done(PixelBuffer),
    Fallback(String),
}

fn attempt_gpu(
    gpu: Option<&GpuExecutor>,
    img: &PixelBuffer,
    request: &FilterRequest,
) -> GpuAttempt {
    let Some(exec) = gpu else {
        return GpuAttempt::Fallback("no GPU device".into());
    };
    match exec.apply(img, request) {
        Ok(out) => GpuAttempt::Done(out),
        Err(e) => GpuAttempt::Fallback(e.to_string()),
    }
}

/// Runs one filter task end to end: GPU attempt (when preferred), CPU
/// fallback, timing.
pub(crate) fn run_task(
    gpu: Option<&GpuExecutor>,
    img: &PixelBuffer,
    request: &FilterRequest,
    prefer_gpu: bool,
) -> FilterReport {
    let start = Instant::now();

    let (result, backend) = if prefer_gpu {
        match attempt_gpu(gpu, img, request) {
            GpuAttempt::Done(out) => (Ok(out), ExecutionPath::Gpu),
            GpuAttempt::Fallback(reason) => {
                warn!(
                    filter = request.name(),
                    %reason,
                    "GPU execution failed, falling back to CPU"
                );
                (
                    run_cpu(img, &request.kind),
                    ExecutionPath::CpuFallback { reason },
                )
            }
        }
    } else {
        (run_cpu(img, &request.kind), ExecutionPath::Cpu)
    };

    let elapsed = start.elapsed();
    debug!(filter = request.name(), ?elapsed, ok = result.is_ok(), "task finished");

    FilterReport {
        name: request.name(),
        result,
        elapsed,
        backend,
    }
}

/// Applies one filter on the CPU executor.
///
/// In-place filters copy the source first; the input buffer is never
/// mutated by a task.
pub(crate) fn run_cpu(img: &PixelBuffer, kind: &FilterKind) -> EngineResult<PixelBuffer> {
    match kind {
        FilterKind::Grayscale => {
            let mut out = img.clone();
            parallel::grayscale(&mut out);
            Ok(out)
        }
        FilterKind::Blur { sigma } => Ok(parallel::blur(img, *sigma)?),
        FilterKind::Sharpen { intensity } => Ok(parallel::sharpen(img, *intensity)?),
        FilterKind::Noise { level, seed } => {
            let mut out = img.clone();
            parallel::noise(&mut out, *level, *seed);
            Ok(out)
        }
        FilterKind::EdgeDetect => Ok(parallel::edge_detect(img)?),
        FilterKind::Brightness { delta } => {
            let mut out = img.clone();
            parallel::brightness(&mut out, *delta);
            Ok(out)
        }
        FilterKind::Saturation { factor } => {
            let mut out = img.clone();
            parallel::saturation(&mut out, *factor);
            Ok(out)
        }
        FilterKind::FlipH => Ok(parallel::flip_h(img)),
        FilterKind::FlipV => Ok(parallel::flip_v(img)),
        FilterKind::Rotate90 { times } => Ok(parallel::rotate90(img, *times)),
        FilterKind::RotateAngle { degrees } => Ok(parallel::rotate_angle(img, *degrees)),
        FilterKind::Downsample { factor } => Ok(parallel::downsample(img, *factor)?),
        FilterKind::Compress { levels } => {
            let mut pyramid = pyramid::compress_levels(img, *levels, run_cpu)?;
            pyramid.pop().ok_or_else(|| {
                EngineError::InvalidParameter("compression produced no levels".into())
            })
        }
    }
}
