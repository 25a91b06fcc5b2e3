//! # pxl-core
//!
//! Core types shared by every layer of the pxl engine.
//!
//! - [`PixelBuffer`] - owned 8-bit image buffer (1-4 channels)
//! - [`FilterRequest`] / [`FilterKind`] - validated filter invocations
//! - [`CoreError`] - boundary validation errors
//!
//! # Example
//!
//! ```rust
//! use pxl_core::{FilterRequest, PixelBuffer};
//! use std::collections::HashMap;
//!
//! let img = PixelBuffer::new(64, 64, 3).unwrap();
//! let mut params = HashMap::new();
//! params.insert("sigma".to_string(), 2.0);
//! let request = FilterRequest::parse("blur", &params).unwrap();
//! assert_eq!(request.name(), "blur");
//! assert_eq!(img.channels(), 3);
//! ```

#![warn(missing_docs)]

mod error;
pub mod image;
pub mod request;

pub use error::{CoreError, CoreResult};
pub use image::{quantize, PixelBuffer};
pub use request::{FilterKind, FilterRequest};
