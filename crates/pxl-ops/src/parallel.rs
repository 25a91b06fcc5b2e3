//! Row-parallel filter execution using Rayon.
//!
//! This is the CPU work-sharing executor: the output pixel grid is split
//! into rows and rows are processed in any order across the thread pool.
//! Every unit reads only the source buffer and writes only its own row,
//! so worker count never changes the result. Byte-for-byte equivalence
//! with the single-threaded versions in [`crate::filter`] and
//! [`crate::transform`] is part of the contract (and tested).
//!
//! # Example
//!
//! ```rust
//! use pxl_core::PixelBuffer;
//! use pxl_ops::parallel;
//!
//! let src = PixelBuffer::new(64, 64, 4).unwrap();
//! let blurred = parallel::blur(&src, 2.0).unwrap();
//! assert_eq!(blurred.dimensions(), src.dimensions());
//! ```

use pxl_core::{quantize, PixelBuffer};
use rayon::prelude::*;

use crate::filter::{convolve_row, edge_row, luma, noise_row, row_seed};
use crate::kernel::Kernel;
use crate::transform::{downsample_row, rotate_angle_row};
use crate::{OpsError, OpsResult};

/// Parallel convolution with clamp-to-edge sampling.
pub fn convolve(src: &PixelBuffer, kernel: &Kernel) -> OpsResult<PixelBuffer> {
    let (width, height, channels) = src.dimensions();
    let mut dst = vec![0u8; src.len()];
    let row_len = width * channels;

    dst.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        convolve_row(src.data(), width, height, channels, kernel, y, row);
    });

    Ok(PixelBuffer::from_vec(width, height, channels, dst)?)
}

/// Parallel Gaussian blur.
pub fn blur(src: &PixelBuffer, sigma: f32) -> OpsResult<PixelBuffer> {
    if !(sigma > 0.0) || !sigma.is_finite() {
        return Err(OpsError::InvalidParameter(format!(
            "blur sigma must be > 0, got {sigma}"
        )));
    }
    convolve(src, &Kernel::gaussian(sigma))
}

/// Parallel sharpening convolution.
pub fn sharpen(src: &PixelBuffer, intensity: f32) -> OpsResult<PixelBuffer> {
    convolve(src, &Kernel::sharpen(intensity))
}

/// Parallel Sobel gradient magnitude.
pub fn edge_detect(src: &PixelBuffer) -> OpsResult<PixelBuffer> {
    let (width, height, channels) = src.dimensions();
    let sobel_x = Kernel::sobel_x();
    let sobel_y = Kernel::sobel_y();
    let mut dst = vec![0u8; src.len()];
    let row_len = width * channels;

    dst.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        edge_row(src.data(), width, height, channels, &sobel_x, &sobel_y, y, row);
    });

    Ok(PixelBuffer::from_vec(width, height, channels, dst)?)
}

/// Parallel in-place grayscale conversion.
pub fn grayscale(img: &mut PixelBuffer) {
    let channels = img.channels();
    if channels < 3 {
        return;
    }
    img.data_mut().par_chunks_exact_mut(channels).for_each(|px| {
        let gray = quantize(luma(px[0], px[1], px[2]));
        px[0] = gray;
        px[1] = gray;
        px[2] = gray;
    });
}

/// Parallel in-place brightness offset.
pub fn brightness(img: &mut PixelBuffer, delta: f32) {
    img.data_mut().par_iter_mut().for_each(|sample| {
        *sample = quantize(*sample as f32 + delta);
    });
}

/// Parallel in-place saturation scale.
pub fn saturation(img: &mut PixelBuffer, factor: f32) {
    let channels = img.channels();
    if channels < 3 {
        return;
    }
    img.data_mut().par_chunks_exact_mut(channels).for_each(|px| {
        let gray = luma(px[0], px[1], px[2]);
        for sample in px.iter_mut().take(3) {
            *sample = quantize(gray + factor * (*sample as f32 - gray));
        }
    });
}

/// Parallel in-place Gaussian noise.
///
/// Rows own independent seeded streams, so this produces exactly the
/// bytes of [`crate::filter::noise`] regardless of worker count.
pub fn noise(img: &mut PixelBuffer, level: f32, seed: u64) {
    let (width, _, channels) = img.dimensions();
    let row_len = width * channels;
    img.data_mut()
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            noise_row(row, level, row_seed(seed, y));
        });
}

/// Parallel horizontal mirror.
pub fn flip_h(src: &PixelBuffer) -> PixelBuffer {
    let (width, height, channels) = src.dimensions();
    let mut dst = vec![0u8; src.len()];
    let row_len = width * channels;

    dst.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        for x in 0..width {
            let src_idx = (y * width + (width - 1 - x)) * channels;
            row[x * channels..(x + 1) * channels]
                .copy_from_slice(&src.data()[src_idx..src_idx + channels]);
        }
    });

    PixelBuffer::from_vec(width, height, channels, dst)
        .expect("flip preserves buffer shape")
}

/// Parallel vertical mirror.
pub fn flip_v(src: &PixelBuffer) -> PixelBuffer {
    let (width, height, channels) = src.dimensions();
    let mut dst = vec![0u8; src.len()];
    let row_len = width * channels;

    dst.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        let src_start = (height - 1 - y) * row_len;
        row.copy_from_slice(&src.data()[src_start..src_start + row_len]);
    });

    PixelBuffer::from_vec(width, height, channels, dst)
        .expect("flip preserves buffer shape")
}

/// Parallel clockwise quarter-turn rotation, `times` normalized mod 4.
pub fn rotate90(src: &PixelBuffer, times: i32) -> PixelBuffer {
    let times = times.rem_euclid(4);
    let mut current = src.clone();
    for _ in 0..times {
        current = rotate90_cw_par(&current);
    }
    current
}

fn rotate90_cw_par(src: &PixelBuffer) -> PixelBuffer {
    let (width, height, channels) = src.dimensions();
    let new_w = height;
    let mut dst = vec![0u8; src.len()];
    let dst_row_len = new_w * channels;

    // Destination row j is source column j, bottom-to-top.
    dst.par_chunks_mut(dst_row_len)
        .enumerate()
        .for_each(|(new_y, row)| {
            for new_x in 0..new_w {
                let y = height - 1 - new_x;
                let src_idx = (y * width + new_y) * channels;
                row[new_x * channels..(new_x + 1) * channels]
                    .copy_from_slice(&src.data()[src_idx..src_idx + channels]);
            }
        });

    PixelBuffer::from_vec(new_w, width, channels, dst)
        .expect("rotation preserves sample count")
}

/// Parallel arbitrary-angle rotation with black fill.
pub fn rotate_angle(src: &PixelBuffer, degrees: f32) -> PixelBuffer {
    let (width, height, channels) = src.dimensions();
    let rad = degrees.to_radians();
    let (sin_a, cos_a) = rad.sin_cos();
    let cx = (width / 2) as f32;
    let cy = (height / 2) as f32;

    let mut dst = vec![0u8; src.len()];
    let row_len = width * channels;
    dst.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        rotate_angle_row(src.data(), width, height, channels, sin_a, cos_a, cx, cy, y, row);
    });

    PixelBuffer::from_vec(width, height, channels, dst)
        .expect("rotation preserves buffer shape")
}

/// Parallel block-average downsampling.
pub fn downsample(src: &PixelBuffer, factor: u32) -> OpsResult<PixelBuffer> {
    if factor < 1 {
        return Err(OpsError::InvalidParameter(format!(
            "downsample factor must be >= 1, got {factor}"
        )));
    }
    let (width, height, channels) = src.dimensions();
    let f = factor as usize;
    let new_w = (width / f).max(1);
    let new_h = (height / f).max(1);

    let mut dst = vec![0u8; new_w * new_h * channels];
    let row_len = new_w * channels;
    dst.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        downsample_row(src.data(), width, height, channels, f, new_w, y, row);
    });

    Ok(PixelBuffer::from_vec(new_w, new_h, channels, dst)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{filter, transform};

    fn gradient(width: usize, height: usize, channels: usize) -> PixelBuffer {
        let data = (0..width * height * channels)
            .map(|i| ((i * 7) % 256) as u8)
            .collect();
        PixelBuffer::from_vec(width, height, channels, data).unwrap()
    }

    #[test]
    fn test_parallel_blur_matches_sequential() {
        // Worker count must not change numeric results.
        let src = gradient(33, 21, 3);
        let seq = filter::blur(&src, 1.7).unwrap();
        let par = blur(&src, 1.7).unwrap();
        assert_eq!(seq.data(), par.data());
    }

    #[test]
    fn test_parallel_convolve_matches_sequential() {
        let src = gradient(40, 25, 4);
        let kernel = Kernel::sharpen(1.3);
        let seq = filter::convolve(&src, &kernel).unwrap();
        let par = convolve(&src, &kernel).unwrap();
        assert_eq!(seq.data(), par.data());
    }

    #[test]
    fn test_parallel_edge_matches_sequential() {
        let src = gradient(31, 17, 1);
        let seq = filter::edge_detect(&src).unwrap();
        let par = edge_detect(&src).unwrap();
        assert_eq!(seq.data(), par.data());
    }

    #[test]
    fn test_parallel_grayscale_matches_sequential() {
        let mut a = gradient(19, 11, 3);
        let mut b = a.clone();
        filter::grayscale(&mut a);
        grayscale(&mut b);
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn test_parallel_noise_matches_sequential() {
        // Per-row streams make noise independent of scheduling.
        let mut a = gradient(27, 13, 3);
        let mut b = a.clone();
        filter::noise(&mut a, 25.0, 777);
        noise(&mut b, 25.0, 777);
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn test_parallel_transforms_match_sequential() {
        let src = gradient(14, 9, 3);
        assert_eq!(flip_h(&src), transform::flip_h(&src));
        assert_eq!(flip_v(&src), transform::flip_v(&src));
        assert_eq!(rotate90(&src, 1), transform::rotate90(&src, 1));
        assert_eq!(rotate90(&src, 3), transform::rotate90(&src, 3));
        assert_eq!(rotate_angle(&src, 30.0), transform::rotate_angle(&src, 30.0));
        assert_eq!(
            downsample(&src, 2).unwrap(),
            transform::downsample(&src, 2).unwrap()
        );
    }

    #[test]
    fn test_parallel_rotate90_dimension_swap() {
        let src = gradient(10, 6, 2);
        assert_eq!(rotate90(&src, 1).dimensions(), (6, 10, 2));
        assert_eq!(rotate90(&src, 2).dimensions(), (10, 6, 2));
    }
}
