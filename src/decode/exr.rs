use std::path::Path;

use exr::prelude::*;

use crate::{
    decode::image::{ChannelBuffer, ChannelImage, ImageSource, SampleType},
    foundation::error::{CryptomatteError, CryptomatteResult},
};

/// An OpenEXR file read fully into memory.
///
/// Every channel of the largest resolution level and every text attribute is kept.
/// Channels of all parts are merged by name; the first part providing a name wins.
#[derive(Clone, Debug)]
pub struct ExrImage {
    inner: ChannelImage,
}

impl ExrImage {
    /// Read the file at `path`.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> CryptomatteResult<Self> {
        let path = path.as_ref();
        let image = read()
            .no_deep_data()
            .largest_resolution_level()
            .all_channels()
            .all_layers()
            .all_attributes()
            .from_file(path)
            .map_err(|e| CryptomatteError::image(format!("read '{}': {e}", path.display())))?;

        let mut attributes: Vec<(String, String)> = image
            .attributes
            .other
            .iter()
            .chain(image.layer_data.iter().flat_map(|l| l.attributes.other.iter()))
            .filter_map(|(k, v)| match v {
                AttributeValue::Text(text) => Some((k.to_string(), text.to_string())),
                _ => None,
            })
            .collect();
        // header maps are unordered
        attributes.sort();

        let mut inner = ChannelImage::new(path);
        for (key, value) in attributes {
            if inner.attributes().iter().all(|(k, _)| *k != key) {
                inner.insert_attribute(key, value);
            }
        }

        for layer in &image.layer_data {
            let (width, height) = (layer.size.width(), layer.size.height());
            for channel in &layer.channel_data.list {
                let name = channel.name.to_string();
                if inner.channel(&name).is_some() {
                    continue;
                }
                let (samples, sample_type): (Vec<f32>, SampleType) = match &channel.sample_data {
                    FlatSamples::F16(v) => {
                        (v.iter().map(|s| s.to_f32()).collect(), SampleType::F16)
                    }
                    FlatSamples::F32(v) => (v.clone(), SampleType::F32),
                    FlatSamples::U32(v) => {
                        (v.iter().map(|&s| s as f32).collect(), SampleType::U32)
                    }
                };
                let buffer = ChannelBuffer::with_sample_type(width, height, samples, sample_type)?;
                inner.insert_channel(name, buffer);
            }
        }

        tracing::debug!(
            channels = inner.num_channels(),
            attributes = inner.attributes().len(),
            "read openexr image"
        );
        Ok(Self { inner })
    }

    /// Hand over the decoded channels and attributes.
    pub fn into_inner(self) -> ChannelImage {
        self.inner
    }
}

impl ImageSource for ExrImage {
    fn path(&self) -> &Path {
        self.inner.path()
    }

    fn attributes(&self) -> &[(String, String)] {
        self.inner.attributes()
    }

    fn channel_names(&self) -> Vec<&str> {
        self.inner.channel_names()
    }

    fn channel(&self, name: &str) -> Option<&ChannelBuffer> {
        self.inner.channel(name)
    }
}

impl From<ExrImage> for ChannelImage {
    fn from(image: ExrImage) -> Self {
        image.inner
    }
}

#[cfg(test)]
#[path = "../../tests/unit/decode/exr.rs"]
mod tests;
