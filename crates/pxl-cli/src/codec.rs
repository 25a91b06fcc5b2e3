//! Codec collaborator: decode/encode between image bytes and
//! `PixelBuffer`, backed by the `image` crate.
//!
//! The contract is fixed: `decode` fails with [`EngineError::Decode`] on
//! malformed input, `encode` always succeeds for a valid buffer (PNG
//! output, preserving channel count).

use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use pxl_core::PixelBuffer;
use pxl_engine::{EngineError, EngineResult};

/// Decodes image bytes into a `PixelBuffer`, preserving the source
/// channel count where it is 1-4 8-bit channels (anything else is
/// converted to RGB).
pub fn decode(bytes: &[u8]) -> EngineResult<PixelBuffer> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| EngineError::Decode(e.to_string()))?;
    let (width, height) = (decoded.width() as usize, decoded.height() as usize);

    let result = match decoded {
        DynamicImage::ImageLuma8(img) => {
            PixelBuffer::from_vec(width, height, 1, img.into_raw())
        }
        DynamicImage::ImageLumaA8(img) => {
            PixelBuffer::from_vec(width, height, 2, img.into_raw())
        }
        DynamicImage::ImageRgb8(img) => {
            PixelBuffer::from_vec(width, height, 3, img.into_raw())
        }
        DynamicImage::ImageRgba8(img) => {
            PixelBuffer::from_vec(width, height, 4, img.into_raw())
        }
        other => PixelBuffer::from_vec(width, height, 3, other.into_rgb8().into_raw()),
    };

    result.map_err(|e| EngineError::Decode(e.to_string()))
}

/// Encodes a `PixelBuffer` as PNG bytes.
pub fn encode(img: &PixelBuffer) -> EngineResult<Vec<u8>> {
    let (width, height, channels) = img.dimensions();
    let (w, h) = (width as u32, height as u32);
    let data = img.data().to_vec();

    let dynamic = match channels {
        1 => GrayImage::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
        2 => GrayAlphaImage::from_raw(w, h, data).map(DynamicImage::ImageLumaA8),
        3 => RgbImage::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
        _ => RgbaImage::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
    }
    .ok_or_else(|| {
        EngineError::Allocation("buffer does not fit its declared shape".into())
    })?;

    let mut out = std::io::Cursor::new(Vec::new());
    dynamic
        .write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| EngineError::Allocation(format!("png encode failed: {e}")))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_bytes() {
        let data: Vec<u8> = (0..8 * 4 * 3).map(|i| (i * 5 % 256) as u8).collect();
        let img = PixelBuffer::from_vec(8, 4, 3, data).unwrap();
        let bytes = encode(&img).unwrap();
        let back = decode(&bytes).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn test_round_trip_rgba() {
        let data: Vec<u8> = (0..4 * 4 * 4).map(|i| (i * 17 % 256) as u8).collect();
        let img = PixelBuffer::from_vec(4, 4, 4, data).unwrap();
        let back = decode(&encode(&img).unwrap()).unwrap();
        assert_eq!(back.channels(), 4);
        assert_eq!(back, img);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode(&[0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(result, Err(EngineError::Decode(_))));
    }
}
