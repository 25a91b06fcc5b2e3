//! Filter request model and boundary validation.
//!
//! Callers supply a filter name plus a string-to-number parameter map;
//! [`FilterRequest::parse`] validates both before any buffer is allocated.
//! Unknown names become [`CoreError::UnsupportedFilter`], missing or
//! out-of-range parameters become [`CoreError::InvalidParameter`].

use std::collections::HashMap;

use crate::{CoreError, CoreResult};

/// A single filter operation with its validated parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind {
    /// Luma conversion replicated into R, G, B; alpha untouched.
    Grayscale,
    /// Gaussian blur with standard deviation `sigma` (> 0).
    Blur {
        /// Standard deviation of the Gaussian kernel.
        sigma: f32,
    },
    /// Sharpening convolution.
    Sharpen {
        /// Sharpening strength (0.5-2.0 typical).
        intensity: f32,
    },
    /// Additive Gaussian noise via Box-Muller.
    Noise {
        /// Noise standard deviation in sample units.
        level: f32,
        /// Seed for the per-task random streams.
        seed: u64,
    },
    /// Sobel gradient magnitude.
    EdgeDetect,
    /// Per-sample offset, advisory domain [-100, 100].
    Brightness {
        /// Offset added to every sample.
        delta: f32,
    },
    /// Saturation scale: 0 = grayscale, 1 = identity.
    Saturation {
        /// Saturation factor (>= 0).
        factor: f32,
    },
    /// Horizontal mirror.
    FlipH,
    /// Vertical mirror.
    FlipV,
    /// Clockwise quarter-turn rotation, `times` normalized mod 4.
    Rotate90 {
        /// Number of quarter turns; negative values wrap.
        times: i32,
    },
    /// Arbitrary-angle rotation about the image center, black fill.
    RotateAngle {
        /// Rotation angle in degrees.
        degrees: f32,
    },
    /// Block-average downsampling by an integer factor.
    Downsample {
        /// Scale factor (>= 1).
        factor: u32,
    },
    /// Pyramid compression: blur + halve per level, 16 px floor.
    Compress {
        /// Requested number of pyramid levels (>= 1).
        levels: u32,
    },
}

impl FilterKind {
    /// Catalog name of this filter, matching [`FilterRequest::parse`] input.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::Blur { .. } => "blur",
            Self::Sharpen { .. } => "sharpen",
            Self::Noise { .. } => "noise",
            Self::EdgeDetect => "edges",
            Self::Brightness { .. } => "brightness",
            Self::Saturation { .. } => "saturation",
            Self::FlipH => "flip-h",
            Self::FlipV => "flip-v",
            Self::Rotate90 { .. } => "rotate90",
            Self::RotateAngle { .. } => "rotate",
            Self::Downsample { .. } => "downsample",
            Self::Compress { .. } => "compress",
        }
    }

    /// True if applying this filter can change the buffer shape.
    pub fn changes_dimensions(&self) -> bool {
        matches!(
            self,
            Self::Rotate90 { .. } | Self::Downsample { .. } | Self::Compress { .. }
        )
    }

    /// Output shape for an input of `(width, height)`.
    ///
    /// Channel count never changes; `Compress` reports the shape after all
    /// levels that the 16 px floor permits.
    pub fn output_size(&self, width: usize, height: usize) -> (usize, usize) {
        match self {
            Self::Rotate90 { times } => {
                if times.rem_euclid(4) % 2 == 1 {
                    (height, width)
                } else {
                    (width, height)
                }
            }
            Self::Downsample { factor } => downsampled(width, height, *factor),
            Self::Compress { levels } => {
                let (mut w, mut h) = (width, height);
                for _ in 0..*levels {
                    let (nw, nh) = downsampled(w, h, 2);
                    w = nw;
                    h = nh;
                    if w < 16 || h < 16 {
                        break;
                    }
                }
                (w, h)
            }
            _ => (width, height),
        }
    }
}

fn downsampled(width: usize, height: usize, factor: u32) -> (usize, usize) {
    let f = factor as usize;
    ((width / f).max(1), (height / f).max(1))
}

/// An immutable filter invocation, consumed by one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRequest {
    /// The validated operation.
    pub kind: FilterKind,
}

impl FilterRequest {
    /// Wraps an already-constructed kind.
    pub fn new(kind: FilterKind) -> Self {
        Self { kind }
    }

    /// Catalog name of the requested filter.
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Parses a filter name plus parameter map into a validated request.
    ///
    /// Recognized names and parameters:
    ///
    /// | name         | parameters              |
    /// |--------------|-------------------------|
    /// | `grayscale`  | -                       |
    /// | `blur`       | `sigma` > 0             |
    /// | `sharpen`    | `intensity`             |
    /// | `noise`      | `level` >= 0, `seed` (optional) |
    /// | `edges`      | -                       |
    /// | `brightness` | `value`                 |
    /// | `saturation` | `value` >= 0            |
    /// | `flip-h`     | -                       |
    /// | `flip-v`     | -                       |
    /// | `rotate90`   | `times` (integer)       |
    /// | `rotate`     | `angle`                 |
    /// | `downsample` | `factor` >= 1 (integer) |
    /// | `compress`   | `levels` >= 1 (integer) |
    ///
    /// When `noise` is requested without a `seed`, one is drawn so the
    /// parsed request is deterministic from then on.
    pub fn parse(name: &str, params: &HashMap<String, f64>) -> CoreResult<Self> {
        let kind = match name {
            "grayscale" => FilterKind::Grayscale,
            "blur" => {
                let sigma = require_finite(params, "sigma")?;
                if sigma <= 0.0 {
                    return Err(CoreError::InvalidParameter(format!(
                        "blur sigma must be > 0, got {sigma}"
                    )));
                }
                FilterKind::Blur { sigma: sigma as f32 }
            }
            "sharpen" => FilterKind::Sharpen {
                intensity: require_finite(params, "intensity")? as f32,
            },
            "noise" => {
                let level = require_finite(params, "level")?;
                if level < 0.0 {
                    return Err(CoreError::InvalidParameter(format!(
                        "noise level must be >= 0, got {level}"
                    )));
                }
                let seed = match params.get("seed") {
                    Some(s) => *s as u64,
                    None => rand::random(),
                };
                FilterKind::Noise { level: level as f32, seed }
            }
            "edges" => FilterKind::EdgeDetect,
            "brightness" => FilterKind::Brightness {
                delta: require_finite(params, "value")? as f32,
            },
            "saturation" => {
                let factor = require_finite(params, "value")?;
                if factor < 0.0 {
                    return Err(CoreError::InvalidParameter(format!(
                        "saturation factor must be >= 0, got {factor}"
                    )));
                }
                FilterKind::Saturation { factor: factor as f32 }
            }
            "flip-h" => FilterKind::FlipH,
            "flip-v" => FilterKind::FlipV,
            "rotate90" => FilterKind::Rotate90 {
                times: require_integer(params, "times")? as i32,
            },
            "rotate" => FilterKind::RotateAngle {
                degrees: require_finite(params, "angle")? as f32,
            },
            "downsample" => {
                let factor = require_integer(params, "factor")?;
                if factor < 1 {
                    return Err(CoreError::InvalidParameter(format!(
                        "downsample factor must be >= 1, got {factor}"
                    )));
                }
                FilterKind::Downsample { factor: factor as u32 }
            }
            "compress" => {
                let levels = require_integer(params, "levels")?;
                if levels < 1 {
                    return Err(CoreError::InvalidParameter(format!(
                        "compression levels must be >= 1, got {levels}"
                    )));
                }
                FilterKind::Compress { levels: levels as u32 }
            }
            other => return Err(CoreError::UnsupportedFilter(other.to_string())),
        };

        Ok(Self { kind })
    }
}

fn require_finite(params: &HashMap<String, f64>, key: &str) -> CoreResult<f64> {
    let value = params.get(key).copied().ok_or_else(|| {
        CoreError::InvalidParameter(format!("missing parameter '{key}'"))
    })?;
    if !value.is_finite() {
        return Err(CoreError::InvalidParameter(format!(
            "parameter '{key}' must be finite, got {value}"
        )));
    }
    Ok(value)
}

fn require_integer(params: &HashMap<String, f64>, key: &str) -> CoreResult<i64> {
    let value = require_finite(params, key)?;
    if value.fract() != 0.0 {
        return Err(CoreError::InvalidParameter(format!(
            "parameter '{key}' must be an integer, got {value}"
        )));
    }
    Ok(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_parse_blur() {
        let req = FilterRequest::parse("blur", &params(&[("sigma", 2.0)])).unwrap();
        assert_eq!(req.kind, FilterKind::Blur { sigma: 2.0 });
        assert_eq!(req.name(), "blur");
    }

    #[test]
    fn test_unknown_name() {
        let result = FilterRequest::parse("posterize", &HashMap::new());
        assert!(matches!(result, Err(CoreError::UnsupportedFilter(_))));
    }

    #[test]
    fn test_missing_parameter() {
        let result = FilterRequest::parse("blur", &HashMap::new());
        assert!(matches!(result, Err(CoreError::InvalidParameter(_))));
    }

    #[test]
    fn test_nonpositive_sigma_rejected() {
        for sigma in [0.0, -1.5] {
            let result = FilterRequest::parse("blur", &params(&[("sigma", sigma)]));
            assert!(matches!(result, Err(CoreError::InvalidParameter(_))));
        }
    }

    #[test]
    fn test_noise_seed_drawn_when_absent() {
        let req = FilterRequest::parse("noise", &params(&[("level", 25.0)])).unwrap();
        match req.kind {
            FilterKind::Noise { level, .. } => assert_eq!(level, 25.0),
            other => panic!("expected noise, got {other:?}"),
        }
    }

    #[test]
    fn test_noise_explicit_seed() {
        let req =
            FilterRequest::parse("noise", &params(&[("level", 10.0), ("seed", 42.0)]))
                .unwrap();
        assert_eq!(req.kind, FilterKind::Noise { level: 10.0, seed: 42 });
    }

    #[test]
    fn test_negative_rotate90_allowed() {
        let req = FilterRequest::parse("rotate90", &params(&[("times", -1.0)])).unwrap();
        assert_eq!(req.kind, FilterKind::Rotate90 { times: -1 });
    }

    #[test]
    fn test_fractional_integer_rejected() {
        let result = FilterRequest::parse("downsample", &params(&[("factor", 1.5)]));
        assert!(matches!(result, Err(CoreError::InvalidParameter(_))));
    }

    #[test]
    fn test_output_size() {
        assert_eq!(
            FilterKind::Rotate90 { times: 1 }.output_size(640, 480),
            (480, 640)
        );
        assert_eq!(
            FilterKind::Rotate90 { times: 2 }.output_size(640, 480),
            (640, 480)
        );
        assert_eq!(
            FilterKind::Downsample { factor: 2 }.output_size(1024, 768),
            (512, 384)
        );
        assert_eq!(
            FilterKind::Downsample { factor: 2 }.output_size(1023, 767),
            (511, 383)
        );
        assert_eq!(FilterKind::Blur { sigma: 1.0 }.output_size(64, 64), (64, 64));
    }

    #[test]
    fn test_compress_output_size_respects_floor() {
        // 64x64 halves to 32, 16, then 8 triggers the floor and stops.
        assert_eq!(
            FilterKind::Compress { levels: 10 }.output_size(64, 64),
            (8, 8)
        );
        assert_eq!(
            FilterKind::Compress { levels: 3 }.output_size(1024, 1024),
            (128, 128)
        );
    }
}
