//! Convolution and point filters, single-threaded reference versions.
//!
//! Neighborhood filters read from the source buffer and write a separate
//! output buffer, so overlapping windows never observe partial writes.
//! Point filters (grayscale, brightness, saturation, noise) mutate in
//! place. Out-of-range neighborhood samples clamp to the nearest edge.

use pxl_core::{quantize, PixelBuffer};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::kernel::Kernel;
use crate::{OpsError, OpsResult};

/// Rec. 601 luma weights, shared by grayscale and saturation.
#[inline]
pub(crate) fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// Convolves every channel independently with `kernel`, clamping
/// out-of-range sample coordinates to the edge.
pub fn convolve(src: &PixelBuffer, kernel: &Kernel) -> OpsResult<PixelBuffer> {
    trace!(
        width = src.width(),
        height = src.height(),
        kernel_size = kernel.size,
        "convolve"
    );
    let (width, height, channels) = src.dimensions();
    let mut dst = vec![0u8; src.len()];
    let row_len = width * channels;

    for (y, row) in dst.chunks_mut(row_len).enumerate() {
        convolve_row(src.data(), width, height, channels, kernel, y, row);
    }

    Ok(PixelBuffer::from_vec(width, height, channels, dst)?)
}

/// Convolution of one output row; shared with the parallel executor.
pub(crate) fn convolve_row(
    src: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    kernel: &Kernel,
    y: usize,
    row: &mut [u8],
) {
    let r = kernel.radius as isize;
    for x in 0..width {
        for c in 0..channels {
            let mut sum = 0.0f32;
            for ky in -r..=r {
                let sy = (y as isize + ky).clamp(0, height as isize - 1) as usize;
                for kx in -r..=r {
                    let sx = (x as isize + kx).clamp(0, width as isize - 1) as usize;
                    let kw =
                        kernel.data[((ky + r) * kernel.size as isize + (kx + r)) as usize];
                    sum += src[(sy * width + sx) * channels + c] as f32 * kw;
                }
            }
            row[x * channels + c] = quantize(sum);
        }
    }
}

/// Gaussian blur with the given standard deviation.
pub fn blur(src: &PixelBuffer, sigma: f32) -> OpsResult<PixelBuffer> {
    if !(sigma > 0.0) || !sigma.is_finite() {
        return Err(OpsError::InvalidParameter(format!(
            "blur sigma must be > 0, got {sigma}"
        )));
    }
    debug!(sigma, width = src.width(), height = src.height(), "applying gaussian blur");
    convolve(src, &Kernel::gaussian(sigma))
}

/// Sharpening convolution with the given intensity.
pub fn sharpen(src: &PixelBuffer, intensity: f32) -> OpsResult<PixelBuffer> {
    debug!(intensity, "applying sharpen");
    convolve(src, &Kernel::sharpen(intensity))
}

/// Sobel gradient magnitude, per channel.
///
/// The magnitude is non-negative by construction and clamps at 255.
pub fn edge_detect(src: &PixelBuffer) -> OpsResult<PixelBuffer> {
    debug!(width = src.width(), height = src.height(), "applying edge detection");
    let (width, height, channels) = src.dimensions();
    let sobel_x = Kernel::sobel_x();
    let sobel_y = Kernel::sobel_y();
    let mut dst = vec![0u8; src.len()];
    let row_len = width * channels;

    for (y, row) in dst.chunks_mut(row_len).enumerate() {
        edge_row(src.data(), width, height, channels, &sobel_x, &sobel_y, y, row);
    }

    Ok(PixelBuffer::from_vec(width, height, channels, dst)?)
}

/// Sobel magnitude of one output row; shared with the parallel executor.
#[allow(clippy::too_many_arguments)]
pub(crate) fn edge_row(
    src: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    sobel_x: &Kernel,
    sobel_y: &Kernel,
    y: usize,
    row: &mut [u8],
) {
    for x in 0..width {
        for c in 0..channels {
            let mut gx = 0.0f32;
            let mut gy = 0.0f32;
            for ky in -1..=1isize {
                let sy = (y as isize + ky).clamp(0, height as isize - 1) as usize;
                for kx in -1..=1isize {
                    let sx = (x as isize + kx).clamp(0, width as isize - 1) as usize;
                    let v = src[(sy * width + sx) * channels + c] as f32;
                    gx += v * sobel_x.weight(kx as i32, ky as i32);
                    gy += v * sobel_y.weight(kx as i32, ky as i32);
                }
            }
            row[x * channels + c] = quantize((gx * gx + gy * gy).sqrt());
        }
    }
}

/// Converts to grayscale in place: luma replicated into R, G, B, alpha
/// untouched. No-op for buffers with fewer than three channels.
pub fn grayscale(img: &mut PixelBuffer) {
    let channels = img.channels();
    if channels < 3 {
        return;
    }
    for px in img.data_mut().chunks_exact_mut(channels) {
        let gray = quantize(luma(px[0], px[1], px[2]));
        px[0] = gray;
        px[1] = gray;
        px[2] = gray;
    }
}

/// Adds `delta` to every sample in place, clamping.
pub fn brightness(img: &mut PixelBuffer, delta: f32) {
    for sample in img.data_mut() {
        *sample = quantize(*sample as f32 + delta);
    }
}

/// Scales color saturation in place: 0 = grayscale, 1 = identity.
/// Alpha untouched; no-op for buffers with fewer than three channels.
pub fn saturation(img: &mut PixelBuffer, factor: f32) {
    let channels = img.channels();
    if channels < 3 {
        return;
    }
    for px in img.data_mut().chunks_exact_mut(channels) {
        let gray = luma(px[0], px[1], px[2]);
        for sample in px.iter_mut().take(3) {
            *sample = quantize(gray + factor * (*sample as f32 - gray));
        }
    }
}

/// Adds Gaussian noise in place via the Box-Muller transform.
///
/// Each pixel row owns an independent random stream derived from `seed`,
/// so the output is deterministic for a given seed and identical whether
/// rows run sequentially or in parallel. Each sample consumes one
/// Box-Muller draw; the sine half is discarded.
pub fn noise(img: &mut PixelBuffer, level: f32, seed: u64) {
    debug!(level, seed, "applying gaussian noise");
    let (width, _, channels) = img.dimensions();
    let row_len = width * channels;
    for (y, row) in img.data_mut().chunks_mut(row_len).enumerate() {
        noise_row(row, level, row_seed(seed, y));
    }
}

/// Seed of row `y`'s stream. The odd stride keeps streams distinct and
/// `seed_from_u64` scrambles them.
#[inline]
pub(crate) fn row_seed(seed: u64, y: usize) -> u64 {
    seed.wrapping_add((y as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Noise synthesis for one row; shared with the parallel executor.
pub(crate) fn noise_row(row: &mut [u8], level: f32, seed: u64) {
    let mut rng = SmallRng::seed_from_u64(seed);
    for sample in row.iter_mut() {
        let u: f32 = rng.random_range(f32::EPSILON..1.0);
        let v: f32 = rng.random();
        let n = level * (-2.0 * u.ln()).sqrt() * (std::f32::consts::TAU * v).cos();
        *sample = quantize(*sample as f32 + n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_rgb(width: usize, height: usize) -> PixelBuffer {
        let mut data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                data.push((x * 255 / width.max(1)) as u8);
                data.push((y * 255 / height.max(1)) as u8);
                data.push(((x + y) % 256) as u8);
            }
        }
        PixelBuffer::from_vec(width, height, 3, data).unwrap()
    }

    #[test]
    fn test_convolve_constant_image() {
        let src = PixelBuffer::from_vec(8, 8, 3, vec![100; 8 * 8 * 3]).unwrap();
        let out = convolve(&src, &Kernel::gaussian(1.0)).unwrap();
        // A normalized kernel over a constant image is the identity.
        for &v in out.data() {
            assert_eq!(v, 100);
        }
    }

    #[test]
    fn test_blur_rejects_bad_sigma() {
        let src = PixelBuffer::new(4, 4, 3).unwrap();
        assert!(blur(&src, 0.0).is_err());
        assert!(blur(&src, -2.0).is_err());
        assert!(blur(&src, f32::NAN).is_err());
    }

    #[test]
    fn test_blur_preserves_shape() {
        let src = gradient_rgb(17, 9);
        let out = blur(&src, 1.2).unwrap();
        assert_eq!(out.dimensions(), src.dimensions());
    }

    #[test]
    fn test_sharpen_identity_at_zero() {
        // intensity 0 gives the identity kernel.
        let src = gradient_rgb(8, 8);
        let out = sharpen(&src, 0.0).unwrap();
        assert_eq!(out.data(), src.data());
    }

    #[test]
    fn test_grayscale_invariant() {
        let mut img = gradient_rgb(12, 12);
        grayscale(&mut img);
        for px in img.data().chunks_exact(3) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
        }
    }

    #[test]
    fn test_grayscale_preserves_alpha() {
        let mut data = vec![0u8; 4 * 4 * 4];
        for (i, px) in data.chunks_exact_mut(4).enumerate() {
            px[0] = 200;
            px[1] = 50;
            px[2] = 10;
            px[3] = i as u8;
        }
        let mut img = PixelBuffer::from_vec(4, 4, 4, data).unwrap();
        grayscale(&mut img);
        for (i, px) in img.data().chunks_exact(4).enumerate() {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            assert_eq!(px[3], i as u8);
        }
    }

    #[test]
    fn test_grayscale_single_channel_noop() {
        let mut img = PixelBuffer::from_vec(4, 4, 1, (0..16).collect()).unwrap();
        let before = img.clone();
        grayscale(&mut img);
        assert_eq!(img, before);
    }

    #[test]
    fn test_brightness_clamps() {
        let mut img = PixelBuffer::from_vec(2, 1, 1, vec![250, 5]).unwrap();
        brightness(&mut img, 20.0);
        assert_eq!(img.data(), &[255, 25]);
        brightness(&mut img, -60.0);
        assert_eq!(img.data(), &[195, 0]);
    }

    #[test]
    fn test_saturation_zero_matches_grayscale() {
        let mut desat = gradient_rgb(10, 10);
        let mut gray = desat.clone();
        saturation(&mut desat, 0.0);
        grayscale(&mut gray);
        assert_eq!(desat.data(), gray.data());
    }

    #[test]
    fn test_saturation_one_is_identity() {
        let mut img = gradient_rgb(10, 10);
        let before = img.clone();
        saturation(&mut img, 1.0);
        assert_eq!(img, before);
    }

    #[test]
    fn test_edge_detect_flat_is_zero() {
        // Clamp-to-edge sampling means a constant image has no gradient
        // anywhere, including the borders.
        let src = PixelBuffer::from_vec(8, 8, 1, vec![77; 64]).unwrap();
        let out = edge_detect(&src).unwrap();
        assert!(out.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_edge_detect_finds_step() {
        // Vertical step edge: left half dark, right half bright.
        let mut data = vec![0u8; 8 * 8];
        for y in 0..8 {
            for x in 4..8 {
                data[y * 8 + x] = 255;
            }
        }
        let src = PixelBuffer::from_vec(8, 8, 1, data).unwrap();
        let out = edge_detect(&src).unwrap();
        // The columns astride the step must respond.
        assert!(out.data()[3] > 0);
        assert!(out.data()[4] > 0);
        // Far from the step everything is flat.
        assert_eq!(out.data()[0], 0);
        assert_eq!(out.data()[7], 0);
    }

    #[test]
    fn test_noise_deterministic_per_seed() {
        let mut a = gradient_rgb(16, 16);
        let mut b = a.clone();
        noise(&mut a, 25.0, 1234);
        noise(&mut b, 25.0, 1234);
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn test_noise_seeds_differ() {
        let mut a = gradient_rgb(16, 16);
        let mut b = a.clone();
        noise(&mut a, 25.0, 1);
        noise(&mut b, 25.0, 2);
        assert_ne!(a.data(), b.data());
    }

    #[test]
    fn test_noise_level_zero_is_identity() {
        let mut img = gradient_rgb(8, 8);
        let before = img.clone();
        noise(&mut img, 0.0, 99);
        assert_eq!(img, before);
    }

    #[test]
    fn test_noise_actually_perturbs() {
        let mut img = PixelBuffer::from_vec(16, 16, 1, vec![128; 256]).unwrap();
        noise(&mut img, 25.0, 7);
        let changed = img.data().iter().filter(|&&v| v != 128).count();
        assert!(changed > 128, "only {changed} of 256 samples changed");
    }
}
