//! # pxl-engine
//!
//! Hybrid dispatch for the pxl filter catalog: every requested filter
//! becomes an independent concurrent task, each task routes to GPU or
//! CPU, and GPU failures fall back to CPU per task without disturbing
//! siblings.
//!
//! # Architecture
//!
//! ```text
//! Processor (apply / apply_all / compress)
//!     ├── dispatch: one task per filter, per-task timing + fallback
//!     │       ├── GpuExecutor (pxl-gpu, graph sessions)
//!     │       └── CpuExecutor (pxl-ops parallel, rayon rows)
//!     └── pyramid: blur + halve per level, 16 px floor
//! ```
//!
//! # Example
//!
//! ```rust
//! use pxl_core::{FilterKind, FilterRequest, PixelBuffer};
//! use pxl_engine::Processor;
//!
//! let processor = Processor::cpu();
//! let img = PixelBuffer::new(64, 64, 3).unwrap();
//! let reports = processor.apply_all(
//!     &img,
//!     &[
//!         FilterRequest::new(FilterKind::Grayscale),
//!         FilterRequest::new(FilterKind::Blur { sigma: 2.0 }),
//!     ],
//! );
//! assert!(reports.iter().all(|r| r.result.is_ok()));
//! ```

#![warn(missing_docs)]

mod dispatch;
mod processor;
mod pyramid;

pub use dispatch::{ExecutionPath, FilterReport};
pub use processor::Processor;

use pxl_gpu::GpuError;
use pxl_ops::OpsError;
use thiserror::Error;

/// Backend preference for filter execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Use the GPU when one is available, CPU otherwise.
    #[default]
    Auto,
    /// CPU only.
    Cpu,
    /// Prefer the GPU; individual tasks still fall back to CPU on
    /// device failure.
    Gpu,
}

/// Engine-level error taxonomy.
///
/// Parameter and filter-name errors are rejected at the boundary and are
/// recoverable by correcting the input. Device errors trigger per-task
/// CPU fallback inside the dispatcher and only surface here when a
/// caller drives the GPU layer directly.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Filter name not in the catalog.
    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Missing or out-of-range parameter, rejected before allocation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Host-side allocation failure; fatal for the task.
    #[error("allocation failure: {0}")]
    Allocation(String),

    /// Codec collaborator could not decode the input bytes.
    #[error("decode failure: {0}")]
    Decode(String),

    /// Device-side failure that was not recovered by fallback.
    #[error("device error: {0}")]
    Device(#[from] GpuError),

    /// Filter operation failure.
    #[error(transparent)]
    Ops(#[from] OpsError),
}

impl From<pxl_core::CoreError> for EngineError {
    fn from(err: pxl_core::CoreError) -> Self {
        match err {
            pxl_core::CoreError::UnsupportedFilter(name) => Self::UnsupportedFilter(name),
            pxl_core::CoreError::InvalidParameter(msg) => Self::InvalidParameter(msg),
            pxl_core::CoreError::InvalidDimensions(msg) => Self::InvalidParameter(msg),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
