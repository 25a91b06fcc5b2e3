//! Convolution kernel construction.
//!
//! Kernels are square with odd side length. Gaussian kernels are
//! normalized so their weights sum to 1 within 1e-3.

/// Square convolution kernel.
#[derive(Debug, Clone)]
pub struct Kernel {
    /// Row-major kernel weights, `size * size` entries.
    pub data: Vec<f32>,
    /// Side length (always odd, >= 3).
    pub size: usize,
    /// Half-size: `size == 2 * radius + 1`.
    pub radius: usize,
}

impl Kernel {
    /// Builds a normalized Gaussian kernel for the given standard deviation.
    ///
    /// Side length is `max(3, odd(ceil(6 * sigma + 1)))`, so the kernel
    /// covers three standard deviations each side. The caller is
    /// responsible for rejecting `sigma <= 0` before reaching this point.
    pub fn gaussian(sigma: f32) -> Self {
        let mut size = (6.0 * sigma + 1.0).ceil() as usize;
        if size % 2 == 0 {
            size += 1;
        }
        let size = size.max(3);
        let radius = size / 2;
        let sigma2 = 2.0 * sigma * sigma;

        let mut data = Vec::with_capacity(size * size);
        let mut sum = 0.0f32;
        let half = radius as i32;

        for y in -half..=half {
            for x in -half..=half {
                let d = (x * x + y * y) as f32;
                let w = (-d / sigma2).exp();
                data.push(w);
                sum += w;
            }
        }

        for w in &mut data {
            *w /= sum;
        }

        Self { data, size, radius }
    }

    /// Builds a 3x3 sharpening kernel: center `1 + 4 * intensity`,
    /// four-neighbors `-intensity`, corners zero.
    pub fn sharpen(intensity: f32) -> Self {
        let center = 1.0 + 4.0 * intensity;
        let edge = -intensity;
        Self {
            data: vec![
                0.0, edge, 0.0,
                edge, center, edge,
                0.0, edge, 0.0,
            ],
            size: 3,
            radius: 1,
        }
    }

    /// Sobel horizontal-gradient kernel.
    pub fn sobel_x() -> Self {
        Self {
            data: vec![
                -1.0, 0.0, 1.0,
                -2.0, 0.0, 2.0,
                -1.0, 0.0, 1.0,
            ],
            size: 3,
            radius: 1,
        }
    }

    /// Sobel vertical-gradient kernel.
    pub fn sobel_y() -> Self {
        Self {
            data: vec![
                -1.0, -2.0, -1.0,
                0.0, 0.0, 0.0,
                1.0, 2.0, 1.0,
            ],
            size: 3,
            radius: 1,
        }
    }

    /// Weight at signed offset `(dx, dy)` from the kernel center.
    #[inline]
    pub fn weight(&self, dx: i32, dy: i32) -> f32 {
        let r = self.radius as i32;
        self.data[((dy + r) * self.size as i32 + (dx + r)) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gaussian_size_odd_and_floored() {
        for sigma in [0.1f32, 0.5, 0.8, 1.0, 2.0, 3.7] {
            let k = Kernel::gaussian(sigma);
            assert!(k.size >= 3, "sigma {sigma} gave size {}", k.size);
            assert_eq!(k.size % 2, 1, "sigma {sigma} gave even size {}", k.size);
            assert_eq!(k.size, 2 * k.radius + 1);
            assert_eq!(k.data.len(), k.size * k.size);
        }
    }

    #[test]
    fn test_gaussian_normalized() {
        for sigma in [0.5f32, 1.0, 2.0, 5.0] {
            let k = Kernel::gaussian(sigma);
            let sum: f32 = k.data.iter().sum();
            assert!((sum - 1.0).abs() < 1e-3, "sigma {sigma} sum {sum}");
        }
    }

    #[test]
    fn test_gaussian_symmetric() {
        let k = Kernel::gaussian(1.3);
        let r = k.radius as i32;
        for dy in -r..=r {
            for dx in -r..=r {
                assert_relative_eq!(k.weight(dx, dy), k.weight(-dx, -dy));
            }
        }
    }

    #[test]
    fn test_gaussian_center_dominates() {
        let k = Kernel::gaussian(1.0);
        let center = k.weight(0, 0);
        assert!(center > k.weight(k.radius as i32, k.radius as i32));
    }

    #[test]
    fn test_sharpen_layout() {
        let k = Kernel::sharpen(1.0);
        assert_eq!(k.size, 3);
        assert_relative_eq!(k.weight(0, 0), 5.0);
        assert_relative_eq!(k.weight(1, 0), -1.0);
        assert_relative_eq!(k.weight(1, 1), 0.0);
        // Weights sum to 1, preserving overall brightness.
        let sum: f32 = k.data.iter().sum();
        assert_relative_eq!(sum, 1.0);
    }

    #[test]
    fn test_sobel_constants() {
        let kx = Kernel::sobel_x();
        let ky = Kernel::sobel_y();
        assert_relative_eq!(kx.weight(-1, 0), -2.0);
        assert_relative_eq!(kx.weight(1, 0), 2.0);
        assert_relative_eq!(ky.weight(0, -1), -2.0);
        assert_relative_eq!(ky.weight(0, 1), 2.0);
        // Both sum to zero: flat regions produce no gradient.
        assert_relative_eq!(kx.data.iter().sum::<f32>(), 0.0);
        assert_relative_eq!(ky.data.iter().sum::<f32>(), 0.0);
    }
}
