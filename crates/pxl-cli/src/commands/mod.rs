//! Command implementations and shared helpers.

pub mod apply;
pub mod batch;
pub mod compress;
pub mod suite;

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use pxl_core::PixelBuffer;

use crate::codec;

/// Reads and decodes one image file.
pub fn load_buffer(path: &Path) -> Result<PixelBuffer> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let img = codec::decode(&bytes)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    Ok(img)
}

/// Encodes and writes one image file, creating parent directories.
pub fn save_buffer(path: &Path, img: &PixelBuffer) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let bytes = codec::encode(img)?;
    std::fs::write(path, bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Parses repeated `key=value` arguments into a parameter map.
pub fn parse_params(pairs: &[String]) -> Result<HashMap<String, f64>> {
    let mut params = HashMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("parameter '{pair}' is not of the form key=value");
        };
        let value: f64 = value
            .parse()
            .with_context(|| format!("parameter '{key}' has non-numeric value '{value}'"))?;
        params.insert(key.to_string(), value);
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        let params =
            parse_params(&["sigma=2.5".to_string(), "seed=42".to_string()]).unwrap();
        assert_eq!(params["sigma"], 2.5);
        assert_eq!(params["seed"], 42.0);
    }

    #[test]
    fn test_parse_params_rejects_malformed() {
        assert!(parse_params(&["sigma".to_string()]).is_err());
        assert!(parse_params(&["sigma=abc".to_string()]).is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("img.png");
        let img = PixelBuffer::from_vec(4, 4, 3, vec![123; 48]).unwrap();
        save_buffer(&path, &img).unwrap();
        let back = load_buffer(&path).unwrap();
        assert_eq!(back, img);
    }
}
