use std::path::{Path, PathBuf};

use crate::foundation::error::{CryptomatteError, CryptomatteResult};

/// How a channel's samples were stored in the source container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SampleType {
    /// 16-bit float, widened to `f32` on read.
    F16,
    /// 32-bit float, kept bit-exact.
    #[default]
    F32,
    /// 32-bit unsigned integer, numerically converted to `f32` on read.
    U32,
}

/// One channel's samples in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelBuffer {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// `width * height` samples.
    pub samples: Vec<f32>,
    /// Storage type in the source container.
    pub sample_type: SampleType,
}

impl ChannelBuffer {
    /// Build a 32-bit float channel; `samples` must hold exactly `width * height` values.
    pub fn f32(width: usize, height: usize, samples: Vec<f32>) -> CryptomatteResult<Self> {
        Self::with_sample_type(width, height, samples, SampleType::F32)
    }

    /// Build a channel that was stored as `sample_type` in its container.
    pub fn with_sample_type(
        width: usize,
        height: usize,
        samples: Vec<f32>,
        sample_type: SampleType,
    ) -> CryptomatteResult<Self> {
        let expected = width.checked_mul(height).ok_or_else(|| {
            CryptomatteError::image(format!("channel size {width}x{height} overflows"))
        })?;
        if samples.len() != expected {
            return Err(CryptomatteError::image(format!(
                "channel is {width}x{height} but holds {} samples",
                samples.len()
            )));
        }
        Ok(Self {
            width,
            height,
            samples,
            sample_type,
        })
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

/// Read access to a multi-channel image and its free-form text attributes.
///
/// This is the seam between Cryptomatte decoding and whatever container library
/// provides the pixels.
pub trait ImageSource {
    /// Location of the image; sidecar manifests resolve relative to its directory.
    fn path(&self) -> &Path;

    /// Text attributes, in a stable order.
    fn attributes(&self) -> &[(String, String)];

    /// Every channel name the image carries.
    fn channel_names(&self) -> Vec<&str>;

    /// Samples of one channel.
    fn channel(&self, name: &str) -> Option<&ChannelBuffer>;
}

/// In-memory [`ImageSource`].
#[derive(Clone, Debug, Default)]
pub struct ChannelImage {
    path: PathBuf,
    attributes: Vec<(String, String)>,
    channels: Vec<(String, ChannelBuffer)>,
}

impl ChannelImage {
    /// Empty image that claims to live at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Add or replace a text attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_attribute(key, value);
        self
    }

    /// Add or replace a channel.
    pub fn with_channel(mut self, name: impl Into<String>, buffer: ChannelBuffer) -> Self {
        self.insert_channel(name, buffer);
        self
    }

    /// Add or replace a text attribute in place; a replaced key keeps its position.
    pub fn insert_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Add or replace a channel in place; a replaced name keeps its position.
    pub fn insert_channel(&mut self, name: impl Into<String>, buffer: ChannelBuffer) {
        let name = name.into();
        match self.channels.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = buffer,
            None => self.channels.push((name, buffer)),
        }
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }
}

impl ImageSource for ChannelImage {
    fn path(&self) -> &Path {
        &self.path
    }

    fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn channel(&self, name: &str) -> Option<&ChannelBuffer> {
        self.channels
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, buffer)| buffer)
    }
}

pub(crate) fn attribute_pairs(source: &(impl ImageSource + ?Sized)) -> Vec<(&str, &str)> {
    source
        .attributes()
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/decode/image.rs"]
mod tests;
