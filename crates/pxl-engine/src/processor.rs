//! Unified engine facade with backend selection.

use std::sync::Arc;

use pxl_core::{FilterRequest, PixelBuffer};
use pxl_gpu::GpuExecutor;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::dispatch::{self, FilterReport};
use crate::{pyramid, Backend, EngineResult};

/// Filter engine entry point.
///
/// Construction resolves the backend preference once: for [`Backend::Gpu`]
/// and [`Backend::Auto`] a device is acquired eagerly, and if none exists
/// every task simply runs on the CPU executor. Individual tasks still
/// fall back per invocation when the device fails at run time.
pub struct Processor {
    backend: Backend,
    gpu: Option<Arc<GpuExecutor>>,
}

impl Processor {
    /// Creates a processor with the given backend preference.
    pub fn new(backend: Backend) -> Self {
        let gpu = match backend {
            Backend::Cpu => None,
            Backend::Gpu | Backend::Auto => match GpuExecutor::new() {
                Ok(exec) => {
                    info!(device = %exec.device_name(), "using GPU backend");
                    Some(Arc::new(exec))
                }
                Err(e) => {
                    warn!(error = %e, "GPU unavailable, all tasks will run on CPU");
                    None
                }
            },
        };
        Self { backend, gpu }
    }

    /// Auto backend: GPU when available, CPU otherwise.
    pub fn auto() -> Self {
        Self::new(Backend::Auto)
    }

    /// CPU-only backend.
    pub fn cpu() -> Self {
        Self::new(Backend::Cpu)
    }

    /// GPU-preferred backend.
    pub fn gpu() -> Self {
        Self::new(Backend::Gpu)
    }

    /// The configured backend preference.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// True when a GPU device was acquired.
    pub fn gpu_available(&self) -> bool {
        self.gpu.is_some()
    }

    fn prefer_gpu(&self) -> bool {
        matches!(self.backend, Backend::Gpu | Backend::Auto) && self.gpu.is_some()
    }

    /// Applies one filter, returning the result buffer.
    pub fn apply(
        &self,
        img: &PixelBuffer,
        request: &FilterRequest,
    ) -> EngineResult<PixelBuffer> {
        dispatch::run_task(self.gpu.as_deref(), img, request, self.prefer_gpu()).result
    }

    /// Applies a batch of filters, one concurrent task per request.
    ///
    /// Join-all semantics: every task runs to completion and the batch
    /// never fails as a whole. Completed results are retained alongside
    /// per-task errors, in request order.
    pub fn apply_all(
        &self,
        img: &PixelBuffer,
        requests: &[FilterRequest],
    ) -> Vec<FilterReport> {
        let prefer_gpu = self.prefer_gpu();
        requests
            .par_iter()
            .map(|request| {
                dispatch::run_task(self.gpu.as_deref(), img, request, prefer_gpu)
            })
            .collect()
    }

    /// Pyramid compression: one buffer per level reached, possibly fewer
    /// than `levels` if a dimension drops below 16 pixels.
    pub fn compress(
        &self,
        img: &PixelBuffer,
        levels: u32,
    ) -> EngineResult<Vec<PixelBuffer>> {
        let prefer_gpu = self.prefer_gpu();
        pyramid::compress_levels(img, levels, |src, kind| {
            dispatch::run_task(
                self.gpu.as_deref(),
                src,
                &FilterRequest::new(kind.clone()),
                prefer_gpu,
            )
            .result
        })
    }
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("backend", &self.backend)
            .field("gpu_available", &self.gpu.is_some())
            .finish()
    }
}
