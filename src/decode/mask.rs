use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{CryptomatteError, CryptomatteResult};

/// Per-pixel coverage of one id, row-major, `height` rows of `width` samples.
///
/// Values are not clamped; well-formed sources stay within `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Mask {
    /// All-zero mask.
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Wrap existing samples; `data` must hold exactly `width * height` values.
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> CryptomatteResult<Self> {
        if Some(data.len()) != width.checked_mul(height) {
            return Err(CryptomatteError::image(format!(
                "mask is {width}x{height} but holds {} samples",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(height, width)`, the row-major array shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Coverage at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Raw samples.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Take the raw samples.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Sum of all samples.
    pub fn total(&self) -> f64 {
        self.data.iter().map(|&v| f64::from(v)).sum()
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// 8-bit greyscale copy, clamped to `[0, 1]`.
    pub fn to_luma8(&self) -> CryptomatteResult<image::GrayImage> {
        let bytes = self
            .data
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect();
        let (w, h) = (to_u32(self.width)?, to_u32(self.height)?);
        image::GrayImage::from_raw(w, h, bytes)
            .ok_or_else(|| CryptomatteError::image(format!("cannot build {w}x{h} luma image")))
    }

    /// Write [`Mask::to_luma8`] as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> CryptomatteResult<()> {
        let path = path.as_ref();
        self.to_luma8()?
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

fn to_u32(v: usize) -> CryptomatteResult<u32> {
    u32::try_from(v).map_err(|_| CryptomatteError::image(format!("dimension {v} exceeds u32")))
}

#[cfg(test)]
#[path = "../../tests/unit/decode/mask.rs"]
mod tests;
