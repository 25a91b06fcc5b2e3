//! GPU execution backend for the pxl engine.
//!
//! Every filter in the catalog has a device-kernel equivalent: one thread
//! per destination pixel, 16x16 thread blocks, boundary and clamping
//! semantics identical to the CPU versions.
//!
//! # Architecture
//!
//! ```text
//! GpuExecutor
//!     ├── GpuContext (adapter, device, queue)
//!     ├── Pipelines (one compute pipeline per filter, compiled once)
//!     └── GraphSession (capture-once / replay-many op chains)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pxl_gpu::GpuExecutor;
//! use pxl_core::{FilterKind, FilterRequest};
//!
//! let gpu = GpuExecutor::new()?;
//! let mut session = gpu.begin_session(1920, 1080, 3)?;
//! session.record(&[
//!     FilterRequest::new(FilterKind::Blur { sigma: 2.0 }),
//!     FilterRequest::new(FilterKind::Grayscale),
//! ])?;
//! for frame in frames {
//!     session.upload(&frame)?;
//!     session.execute()?;
//!     let out = session.fetch()?;
//! }
//! session.teardown();
//! ```

pub mod context;
pub mod executor;
pub mod graph;
mod shaders;

pub use context::GpuContext;
pub use executor::GpuExecutor;
pub use graph::GraphSession;

use thiserror::Error;

/// GPU operation errors.
///
/// Everything except [`GpuError::ShapeMismatch`] is recoverable by falling
/// back to CPU execution; a shape mismatch means the caller reused a
/// session against the wrong image and must rebuild it.
#[derive(Error, Debug)]
pub enum GpuError {
    /// No suitable GPU adapter found.
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    /// Device request failed.
    #[error("failed to create device: {0}")]
    DeviceCreation(String),

    /// Requested allocation exceeds what the device can hold.
    #[error("device allocation failed: {0}")]
    Allocation(String),

    /// Invalid filter parameter reached the device layer.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A session was used against a different shape than it was built for.
    #[error("shape mismatch: session built for {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Shape the session was initialized with.
        expected: (u32, u32, u32),
        /// Shape of the buffer the caller supplied.
        actual: (u32, u32, u32),
    },

    /// `record` called on a session that already captured an op sequence.
    #[error("graph already recorded; build a new session to change the op sequence")]
    AlreadyRecorded,

    /// `execute` or `fetch` called before a successful `record`.
    #[error("graph not recorded")]
    NotRecorded,

    /// `record` called with no operations.
    #[error("cannot record an empty operation sequence")]
    EmptyGraph,

    /// Any other device-side failure.
    #[error("GPU operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for GPU operations.
pub type GpuResult<T> = Result<T, GpuError>;
