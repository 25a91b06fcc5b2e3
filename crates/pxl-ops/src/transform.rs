//! Geometric transformations: flips, rotations, downsampling.
//!
//! All transforms allocate a fresh output buffer; rotations that change
//! shape return a buffer with swapped dimensions rather than mutating a
//! shared header mid-algorithm.

use pxl_core::{quantize, PixelBuffer};
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::{OpsError, OpsResult};

/// Mirrors the image left-right.
pub fn flip_h(src: &PixelBuffer) -> PixelBuffer {
    let (width, height, channels) = src.dimensions();
    let mut dst = vec![0u8; src.len()];

    for y in 0..height {
        for x in 0..width {
            let src_idx = (y * width + x) * channels;
            let dst_idx = (y * width + (width - 1 - x)) * channels;
            dst[dst_idx..dst_idx + channels]
                .copy_from_slice(&src.data()[src_idx..src_idx + channels]);
        }
    }

    PixelBuffer::from_vec(width, height, channels, dst)
        .expect("flip preserves buffer shape")
}

/// Mirrors the image top-bottom.
pub fn flip_v(src: &PixelBuffer) -> PixelBuffer {
    let (width, height, channels) = src.dimensions();
    let mut dst = vec![0u8; src.len()];
    let row_len = width * channels;

    for y in 0..height {
        let src_start = y * row_len;
        let dst_start = (height - 1 - y) * row_len;
        dst[dst_start..dst_start + row_len]
            .copy_from_slice(&src.data()[src_start..src_start + row_len]);
    }

    PixelBuffer::from_vec(width, height, channels, dst)
        .expect("flip preserves buffer shape")
}

/// Rotates clockwise by `times` quarter turns, normalized mod 4
/// (negative values wrap positive). Each step produces a new buffer with
/// swapped dimensions.
pub fn rotate90(src: &PixelBuffer, times: i32) -> PixelBuffer {
    let times = times.rem_euclid(4);
    let mut current = src.clone();
    for _ in 0..times {
        current = rotate90_cw(&current);
    }
    current
}

/// One clockwise quarter turn: `(x, y)` maps to `(height - 1 - y, x)`.
fn rotate90_cw(src: &PixelBuffer) -> PixelBuffer {
    let (width, height, channels) = src.dimensions();
    let new_w = height;
    let new_h = width;
    let mut dst = vec![0u8; src.len()];

    for y in 0..height {
        for x in 0..width {
            let src_idx = (y * width + x) * channels;
            let new_x = height - 1 - y;
            let new_y = x;
            let dst_idx = (new_y * new_w + new_x) * channels;
            dst[dst_idx..dst_idx + channels]
                .copy_from_slice(&src.data()[src_idx..src_idx + channels]);
        }
    }

    PixelBuffer::from_vec(new_w, new_h, channels, dst)
        .expect("rotation preserves sample count")
}

/// Rotates about the image center by `degrees`, using inverse mapping:
/// each destination pixel looks up its source through the rotation
/// matrix, truncated to integer coordinates.
///
/// Destinations whose source lands outside the image stay zero (black
/// background). This is deliberately different from the clamp-to-edge
/// policy of the convolution filters; downstream callers rely on the
/// black fill.
pub fn rotate_angle(src: &PixelBuffer, degrees: f32) -> PixelBuffer {
    trace!(degrees, "rotate_angle");
    let (width, height, channels) = src.dimensions();
    let rad = degrees.to_radians();
    let (sin_a, cos_a) = rad.sin_cos();
    let cx = (width / 2) as f32;
    let cy = (height / 2) as f32;

    let mut dst = vec![0u8; src.len()];
    let row_len = width * channels;
    for (y, row) in dst.chunks_mut(row_len).enumerate() {
        rotate_angle_row(src.data(), width, height, channels, sin_a, cos_a, cx, cy, y, row);
    }

    PixelBuffer::from_vec(width, height, channels, dst)
        .expect("rotation preserves buffer shape")
}

/// Inverse-mapped rotation of one output row; shared with the parallel
/// executor.
#[allow(clippy::too_many_arguments)]
pub(crate) fn rotate_angle_row(
    src: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    sin_a: f32,
    cos_a: f32,
    cx: f32,
    cy: f32,
    y: usize,
    row: &mut [u8],
) {
    for x in 0..width {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let src_x = (dx * cos_a - dy * sin_a + cx) as i32;
        let src_y = (dx * sin_a + dy * cos_a + cy) as i32;

        if src_x >= 0 && (src_x as usize) < width && src_y >= 0 && (src_y as usize) < height
        {
            let src_idx = (src_y as usize * width + src_x as usize) * channels;
            let dst_idx = x * channels;
            row[dst_idx..dst_idx + channels]
                .copy_from_slice(&src[src_idx..src_idx + channels]);
        }
    }
}

/// Block-average downsampling by an integer factor.
///
/// Output dimensions are `max(1, dim / factor)` (floor division). Each
/// destination pixel averages the in-bounds samples of its
/// `factor x factor` source block, so edge blocks may cover fewer
/// samples.
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
    debug!(width, height, new_w, new_h, factor, "downsampling");

    let mut dst = vec![0u8; new_w * new_h * channels];
    let row_len = new_w * channels;
    for (y, row) in dst.chunks_mut(row_len).enumerate() {
        downsample_row(src.data(), width, height, channels, f, new_w, y, row);
    }

    Ok(PixelBuffer::from_vec(new_w, new_h, channels, dst)?)
}

/// Block average of one output row; shared with the parallel executor.
#[allow(clippy::too_many_arguments)]
pub(crate) fn downsample_row(
    src: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    factor: usize,
    new_w: usize,
    y: usize,
    row: &mut [u8],
) {
    for x in 0..new_w {
        for c in 0..channels {
            let mut sum = 0.0f32;
            let mut count = 0u32;
            for dy in 0..factor {
                let src_y = y * factor + dy;
                if src_y >= height {
                    continue;
                }
                for dx in 0..factor {
                    let src_x = x * factor + dx;
                    if src_x >= width {
                        continue;
                    }
                    sum += src[(src_y * width + src_x) * channels + c] as f32;
                    count += 1;
                }
            }
            row[x * channels + c] = quantize(sum / count as f32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(width: usize, height: usize, channels: usize) -> PixelBuffer {
        let data = (0..width * height * channels).map(|i| (i % 251) as u8).collect();
        PixelBuffer::from_vec(width, height, channels, data).unwrap()
    }

    #[test]
    fn test_flip_h_twice_is_identity() {
        let src = numbered(9, 5, 3);
        let twice = flip_h(&flip_h(&src));
        assert_eq!(twice, src);
    }

    #[test]
    fn test_flip_v_twice_is_identity() {
        let src = numbered(6, 7, 4);
        let twice = flip_v(&flip_v(&src));
        assert_eq!(twice, src);
    }

    #[test]
    fn test_flip_h_mirrors_columns() {
        let src = PixelBuffer::from_vec(3, 1, 1, vec![1, 2, 3]).unwrap();
        let flipped = flip_h(&src);
        assert_eq!(flipped.data(), &[3, 2, 1]);
    }

    #[test]
    fn test_flip_v_mirrors_rows() {
        let src = PixelBuffer::from_vec(1, 3, 1, vec![1, 2, 3]).unwrap();
        let flipped = flip_v(&src);
        assert_eq!(flipped.data(), &[3, 2, 1]);
    }

    #[test]
    fn test_rotate90_four_times_is_identity() {
        let src = numbered(7, 4, 3);
        let mut img = src.clone();
        for _ in 0..4 {
            img = rotate90(&img, 1);
        }
        assert_eq!(img, src);
    }

    #[test]
    fn test_rotate90_swaps_dimensions() {
        let src = numbered(4, 2, 1);
        let rotated = rotate90(&src, 1);
        assert_eq!(rotated.dimensions(), (2, 4, 1));
    }

    #[test]
    fn test_rotate90_corner_mapping() {
        // 2x2: a b / c d rotated clockwise becomes c a / d b.
        let src = PixelBuffer::from_vec(2, 2, 1, vec![1, 2, 3, 4]).unwrap();
        let rotated = rotate90(&src, 1);
        assert_eq!(rotated.data(), &[3, 1, 4, 2]);
    }

    #[test]
    fn test_rotate90_negative_wraps() {
        let src = numbered(5, 3, 2);
        assert_eq!(rotate90(&src, -1), rotate90(&src, 3));
        assert_eq!(rotate90(&src, -4), src);
        assert_eq!(rotate90(&src, 7), rotate90(&src, 3));
    }

    #[test]
    fn test_rotate90_zero_is_identity() {
        let src = numbered(5, 3, 1);
        assert_eq!(rotate90(&src, 0), src);
    }

    #[test]
    fn test_rotate_angle_zero_is_identity() {
        let src = numbered(8, 8, 3);
        let rotated = rotate_angle(&src, 0.0);
        assert_eq!(rotated, src);
    }

    #[test]
    fn test_rotate_angle_fills_black() {
        // Rotating a solid white square by 45 degrees leaves the corners
        // of the destination without a source: they stay black.
        let src = PixelBuffer::from_vec(16, 16, 1, vec![255; 256]).unwrap();
        let rotated = rotate_angle(&src, 45.0);
        assert_eq!(rotated.data()[0], 0);
        assert_eq!(rotated.data()[15], 0);
        // The center still maps inside the source.
        let center = rotated.pixel_index(8, 8);
        assert_eq!(rotated.data()[center], 255);
    }

    #[test]
    fn test_downsample_dimension_law() {
        let a = numbered(1024, 768, 1);
        assert_eq!(downsample(&a, 2).unwrap().dimensions(), (512, 384, 1));
        let b = numbered(1023, 767, 1);
        assert_eq!(downsample(&b, 2).unwrap().dimensions(), (511, 383, 1));
    }

    #[test]
    fn test_downsample_block_average() {
        // 4x2 image, factor 2: two 2x2 blocks.
        let src =
            PixelBuffer::from_vec(4, 2, 1, vec![0, 10, 100, 200, 20, 30, 100, 200])
                .unwrap();
        let down = downsample(&src, 2).unwrap();
        assert_eq!(down.dimensions(), (2, 1, 1));
        // (0+10+20+30)/4 = 15, (100+200+100+200)/4 = 150.
        assert_eq!(down.data(), &[15, 150]);
    }

    #[test]
    fn test_downsample_floor_at_one() {
        let src = numbered(3, 3, 1);
        let down = downsample(&src, 8).unwrap();
        assert_eq!(down.dimensions(), (1, 1, 1));
    }

    #[test]
    fn test_downsample_edge_blocks_partial() {
        // 3x1, factor 2: second block covers only one in-bounds column.
        let src = PixelBuffer::from_vec(3, 1, 1, vec![10, 20, 90]).unwrap();
        let down = downsample(&src, 2).unwrap();
        assert_eq!(down.dimensions(), (1, 1, 1));
        assert_eq!(down.data(), &[15]);
    }

    #[test]
    fn test_downsample_rejects_zero_factor() {
        let src = numbered(4, 4, 1);
        assert!(downsample(&src, 0).is_err());
    }
}
