//! Owned 8-bit image buffer.

use crate::{CoreError, CoreResult};

/// Converts a float sample to a byte: clamp to `[0, 255]`, then round
/// toward positive by adding 0.5 before truncation.
///
/// This is the single conversion used everywhere a float becomes a pixel
/// byte, so CPU and GPU paths stay byte-compatible.
#[inline]
pub fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 255.0) + 0.5) as u8
}

/// Contiguous 8-bit image buffer with interleaved channels.
///
/// Row-major, no stride padding: sample `(x, y, c)` lives at index
/// `(y * width + x) * channels + c`.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: usize,
    height: usize,
    channels: usize,
}

impl PixelBuffer {
    /// Creates a zero-filled buffer.
    ///
    /// Channels must be 1-4 and both dimensions non-zero.
    pub fn new(width: usize, height: usize, channels: usize) -> CoreResult<Self> {
        Self::validate_shape(width, height, channels)?;
        Ok(Self {
            data: vec![0; width * height * channels],
            width,
            height,
            channels,
        })
    }

    /// Creates a buffer from existing sample data.
    ///
    /// `data.len()` must equal `width * height * channels`.
    pub fn from_vec(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<u8>,
    ) -> CoreResult<Self> {
        Self::validate_shape(width, height, channels)?;
        let expected = width * height * channels;
        if data.len() != expected {
            return Err(CoreError::InvalidDimensions(format!(
                "buffer length {} does not match {}x{}x{} ({} samples)",
                data.len(),
                width,
                height,
                channels,
                expected
            )));
        }
        Ok(Self { data, width, height, channels })
    }

    /// Creates a buffer from float samples, quantizing each to a byte.
    pub fn from_f32(
        width: usize,
        height: usize,
        channels: usize,
        data: &[f32],
    ) -> CoreResult<Self> {
        let bytes: Vec<u8> = data.iter().map(|&v| quantize(v)).collect();
        Self::from_vec(width, height, channels, bytes)
    }

    fn validate_shape(width: usize, height: usize, channels: usize) -> CoreResult<()> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions(format!(
                "image dimensions must be non-zero, got {width}x{height}"
            )));
        }
        if !(1..=4).contains(&channels) {
            return Err(CoreError::InvalidDimensions(format!(
                "channel count must be 1-4, got {channels}"
            )));
        }
        width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(channels))
            .ok_or_else(|| {
                CoreError::InvalidDimensions("image dimensions overflow".into())
            })?;
        Ok(())
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of interleaved channels (1-4).
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `(width, height, channels)` tuple.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.width, self.height, self.channels)
    }

    /// Total number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for a zero-sample buffer (cannot be constructed, but keeps
    /// clippy's len-without-is-empty contract honest).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample data, row-major interleaved.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable sample data.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the buffer, returning the raw samples.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Index of the first sample of pixel `(x, y)`.
    #[inline]
    pub fn pixel_index(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * self.channels
    }

    /// Copies the samples into an f32 buffer with raw 0-255 values.
    ///
    /// This is the host-side staging format for GPU upload; values are not
    /// normalized.
    pub fn to_f32(&self) -> Vec<f32> {
        self.data.iter().map(|&b| b as f32).collect()
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("bytes", &self.data.len())
            .finish()
    }
}
