//! I/O helpers for grayscale images, landmark files and JSON.
//!
//! - `load_grayscale_image`: read a PNG/JPEG/TIFF into an owned 8-bit gray buffer.
//! - `save_grayscale_f32`: write an `ImageF32` (e.g. a filtered level) to a PNG.
//! - `read_landmarks`: parse a landmark file with one coordinate per line
//!   (`x0, y0, x1, y1, ...`).
//! - `write_json_file` / `read_json_file`: serde round trip through disk.
use super::{ImageF32, ImageU8, ImageView};
use crate::error::{Error, Result};
use image::{GrayImage, Luma};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Owned 8-bit grayscale buffer with stride and borrowed view conversion.
#[derive(Clone, Debug)]
pub struct GrayImageU8 {
    width: usize,
    height: usize,
    stride: usize,
    data: Vec<u8>,
}

impl GrayImageU8 {
    /// Construct an owned grayscale buffer given raw bytes.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Self {
        assert_eq!(data.len(), width * height, "buffer size does not match dimensions");
        Self {
            width,
            height,
            stride: width,
            data,
        }
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Borrow as a read-only `ImageU8` view
    pub fn as_view(&self) -> ImageU8<'_> {
        ImageU8 {
            w: self.width,
            h: self.height,
            stride: self.stride,
            data: &self.data,
        }
    }
}

/// Load an image from disk and convert to 8-bit grayscale.
pub fn load_grayscale_image(path: &Path) -> Result<GrayImageU8> {
    let img = image::open(path)?.into_luma8();
    let width = img.width() as usize;
    let height = img.height() as usize;
    Ok(GrayImageU8::new(width, height, img.into_raw()))
}

/// Save a float image to a grayscale PNG. Values are rescaled so that the
/// image maximum maps to 255 (edge responses rarely reach 1.0).
pub fn save_grayscale_f32(image: &ImageF32, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let max = image.data.iter().cloned().fold(0.0f32, f32::max);
    let gain = if max > 0.0 { 255.0 / max } else { 0.0 };
    let mut out = GrayImage::new(image.w as u32, image.h as u32);
    for y in 0..image.h {
        for (x, &px) in image.row(y).iter().enumerate() {
            let v = (px * gain).clamp(0.0, 255.0);
            out.put_pixel(x as u32, y as u32, Luma([v as u8]));
        }
    }
    out.save(path)?;
    Ok(())
}

/// Read landmark coordinates stored one value per line, alternating x and y.
pub fn read_landmarks(path: &Path) -> Result<Vec<[f64; 2]>> {
    let text = fs::read_to_string(path)?;
    let values = text
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f64>().map_err(|e| {
                Error::InvalidConfig(format!("bad landmark value {tok:?} in {}: {e}", path.display()))
            })
        })
        .collect::<Result<Vec<f64>>>()?;
    if values.len() % 2 != 0 {
        return Err(Error::InvalidConfig(format!(
            "odd number of landmark coordinates in {}",
            path.display()
        )));
    }
    Ok(values.chunks_exact(2).map(|c| [c[0], c[1]]).collect())
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Deserialize a JSON document from `path`.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
