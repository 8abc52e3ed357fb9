use std::collections::{BTreeSet, HashMap};
#[cfg(feature = "openexr")]
use std::path::Path;

use rayon::prelude::*;

use crate::{
    decode::{
        image::{ChannelBuffer, ImageSource, SampleType, attribute_pairs},
        mask::Mask,
    },
    foundation::{
        error::{CryptomatteError, CryptomatteResult},
        hash::HashValue,
    },
    layer::{
        channels::{ChannelRepr, sort_and_validate_channels, sort_legacy_channels},
        metadata::{Metadata, SkippedLayer},
    },
};

/// Options for whole-image loads.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Also load the legacy `<name>.r/g/b` preview channels.
    pub load_preview: bool,
}

/// How [`Cryptomatte::masks_with`] spreads work across threads.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MaskThreading {
    /// Compute masks on a rayon pool instead of the calling thread.
    pub parallel: bool,
    /// Pool size; `None` lets rayon decide. Must be at least 1 when set.
    pub threads: Option<usize>,
}

/// Result of decoding every Cryptomatte layer of one image.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Layers that decoded, in order of first attribute appearance.
    pub layers: Vec<Cryptomatte>,
    /// Layers that were found but could not be decoded.
    pub skipped: Vec<SkippedLayer>,
}

#[derive(Clone, Debug, PartialEq)]
struct Level {
    id: Vec<f32>,
    coverage: Vec<f32>,
}

/// One decoded Cryptomatte layer, ready for mask queries.
///
/// Each indexed channel group `<name>NN.{r,g,b,a}` holds two levels: `(r, g)` and `(b, a)`,
/// each an (id, coverage) pair. A trailing group may hold only `(r, g)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Cryptomatte {
    width: usize,
    height: usize,
    levels: Vec<Level>,
    preview: Vec<Mask>,
    metadata: Metadata,
}

impl Cryptomatte {
    /// Build from named channel buffers belonging to `metadata`'s layer.
    ///
    /// Channels matching neither the indexed nor the legacy naming of the layer are ignored.
    /// Indexed channels must form complete groups, be stored as 32-bit float and share one
    /// size; legacy channels become the preview.
    pub fn new<I, S>(channels: I, metadata: Metadata) -> CryptomatteResult<Self>
    where
        I: IntoIterator<Item = (S, ChannelBuffer)>,
        S: Into<String>,
    {
        let mut indexed = Vec::new();
        let mut legacy = Vec::new();
        for (name, buffer) in channels {
            let name = name.into();
            if metadata.is_valid_channel_name(&name) {
                indexed.push((name, buffer));
            } else if metadata.is_valid_legacy_channel_name(&name) {
                legacy.push((name, buffer));
            }
        }

        let reprs = indexed
            .iter()
            .map(|(name, _)| ChannelRepr::parse_with_typename(name, metadata.name()))
            .collect::<CryptomatteResult<Vec<_>>>()?;
        let reprs = sort_and_validate_channels(reprs)?;

        let mut buffers: HashMap<String, ChannelBuffer> = indexed.into_iter().collect();
        let mut ordered = Vec::with_capacity(reprs.len());
        for repr in &reprs {
            let buffer = buffers.remove(repr.channel_name()).ok_or_else(|| {
                CryptomatteError::malformed_level(format!(
                    "channel '{}' has no samples",
                    repr.channel_name()
                ))
            })?;
            if buffer.sample_type != SampleType::F32 {
                return Err(CryptomatteError::unsupported_sample_type(format!(
                    "channel '{}' is {:?}, id and coverage channels must be 32-bit float",
                    repr.channel_name(),
                    buffer.sample_type
                )));
            }
            ordered.push((repr.channel_name().to_string(), buffer));
        }

        let (width, height) = ordered[0].1.dimensions();
        let check_size = |name: &str, buffer: &ChannelBuffer| {
            if buffer.dimensions() == (width, height) {
                Ok(())
            } else {
                Err(CryptomatteError::malformed_level(format!(
                    "channel '{name}' is {}x{}, expected {width}x{height}",
                    buffer.width, buffer.height
                )))
            }
        };

        let mut levels = Vec::with_capacity(ordered.len() / 2);
        let mut pairs = ordered.into_iter();
        while let (Some((id_name, id)), Some((cov_name, coverage))) = (pairs.next(), pairs.next())
        {
            check_size(&id_name, &id)?;
            check_size(&cov_name, &coverage)?;
            levels.push(Level {
                id: id.samples,
                coverage: coverage.samples,
            });
        }

        let mut legacy_buffers: HashMap<String, ChannelBuffer> = legacy.into_iter().collect();
        let mut preview = Vec::new();
        let legacy_names: Vec<String> = legacy_buffers.keys().cloned().collect();
        for (_, name) in sort_legacy_channels(&legacy_names) {
            if let Some(buffer) = legacy_buffers.remove(&name) {
                check_size(&name, &buffer)?;
                preview.push(Mask::from_vec(width, height, buffer.samples)?);
            }
        }

        tracing::debug!(
            layer = metadata.name(),
            width,
            height,
            levels = levels.len(),
            preview = preview.len(),
            "decoded cryptomatte layer"
        );

        Ok(Self {
            width,
            height,
            levels,
            preview,
            metadata,
        })
    }

    /// Build from flat 32-bit float channels that all share `width` x `height`.
    pub fn from_channels<I, S>(
        channels: I,
        width: usize,
        height: usize,
        metadata: Metadata,
    ) -> CryptomatteResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let buffers = channels
            .into_iter()
            .map(|(name, samples)| {
                let name = name.into();
                ChannelBuffer::f32(width, height, samples)
                    .map(|b| (name.clone(), b))
                    .map_err(|e| {
                        CryptomatteError::malformed_level(format!("channel '{name}': {e}"))
                    })
            })
            .collect::<CryptomatteResult<Vec<_>>>()?;
        Self::new(buffers, metadata)
    }

    /// Decode every Cryptomatte layer of the OpenEXR file at `path`.
    ///
    /// Layers that cannot be decoded are logged and left out; see [`Cryptomatte::load_with`]
    /// to inspect them.
    #[cfg(feature = "openexr")]
    pub fn load(path: impl AsRef<Path>, load_preview: bool) -> CryptomatteResult<Vec<Self>> {
        Self::load_with(path, &LoadOptions { load_preview }).map(|report| report.layers)
    }

    /// Decode every Cryptomatte layer of the OpenEXR file at `path`, reporting skipped layers.
    #[cfg(feature = "openexr")]
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_with(path: impl AsRef<Path>, opts: &LoadOptions) -> CryptomatteResult<LoadReport> {
        let image = crate::decode::exr::ExrImage::open(path.as_ref())?;
        Ok(Self::from_source(&image, opts))
    }

    /// Decode every Cryptomatte layer of an already opened image.
    ///
    /// Never fails as a whole: a malformed layer ends up in [`LoadReport::skipped`].
    pub fn from_source(source: &(impl ImageSource + ?Sized), opts: &LoadOptions) -> LoadReport {
        let (metadatas, mut skipped) =
            Metadata::from_attributes_lenient(attribute_pairs(source), source.path());
        let names = source.channel_names();

        let mut layers = Vec::with_capacity(metadatas.len());
        for metadata in metadatas {
            let mut wanted = metadata.channel_names(&names);
            if opts.load_preview {
                wanted.extend(metadata.legacy_channel_names(&names));
            }
            let channels: Vec<(String, ChannelBuffer)> = wanted
                .into_iter()
                .filter_map(|name| source.channel(&name).cloned().map(|b| (name, b)))
                .collect();

            let key = metadata.key().to_string();
            let name = metadata.name().to_string();
            match Self::new(channels, metadata) {
                Ok(layer) => layers.push(layer),
                Err(error) => {
                    tracing::warn!(
                        key = %key,
                        layer = %name,
                        error = %error,
                        "skipping cryptomatte layer"
                    );
                    skipped.push(SkippedLayer {
                        key,
                        name: Some(name),
                        error,
                    });
                }
            }
        }

        LoadReport { layers, skipped }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of (id, coverage) levels.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Whether legacy preview channels were loaded.
    pub fn has_preview(&self) -> bool {
        !self.preview.is_empty()
    }

    /// Legacy preview channels ordered `r, g, b`; empty when none were loaded.
    pub fn preview(&self) -> &[Mask] {
        &self.preview
    }

    /// Layer description.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Coverage of the manifest entry `name`.
    ///
    /// Fails with [`CryptomatteError::NameNotFound`] when the layer has no manifest or the
    /// manifest does not list `name`.
    pub fn mask(&self, name: &str) -> CryptomatteResult<Mask> {
        Ok(self.mask_by_hash(self.hash_for(name)?))
    }

    /// Coverage of `hash`; an id that never occurs gives an all-zero mask.
    ///
    /// A pixel matching at several levels sums their coverage.
    pub fn mask_by_hash(&self, hash: HashValue) -> Mask {
        let target = hash.as_u32();
        let mut out = Mask::zeros(self.width, self.height);
        let acc = out.as_mut_slice();
        for level in &self.levels {
            for ((dst, id), cov) in acc.iter_mut().zip(&level.id).zip(&level.coverage) {
                if id.to_bits() == target {
                    *dst += *cov;
                }
            }
        }
        out
    }

    /// Masks for every manifest entry; empty when the layer has no manifest.
    pub fn masks(&self) -> HashMap<String, Mask> {
        self.manifest_targets()
            .into_iter()
            .map(|(name, hash)| (name, self.mask_by_hash(hash)))
            .collect()
    }

    /// Like [`Cryptomatte::masks`], optionally spread over a rayon pool.
    pub fn masks_with(
        &self,
        threading: &MaskThreading,
    ) -> CryptomatteResult<HashMap<String, Mask>> {
        if !threading.parallel {
            return Ok(self.masks());
        }
        let targets = self.manifest_targets();
        let pool = build_thread_pool(threading.threads)?;
        let masks = pool.install(|| {
            targets
                .into_par_iter()
                .map(|(name, hash)| (name, self.mask_by_hash(hash)))
                .collect::<Vec<_>>()
        });
        Ok(masks.into_iter().collect())
    }

    /// Masks for the given manifest names; any unknown name fails the call.
    pub fn masks_for<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> CryptomatteResult<HashMap<String, Mask>> {
        let targets = names
            .iter()
            .map(|n| {
                let n = n.as_ref();
                self.hash_for(n).map(|h| (n.to_string(), h))
            })
            .collect::<CryptomatteResult<Vec<_>>>()?;
        Ok(targets
            .into_iter()
            .map(|(name, hash)| (name, self.mask_by_hash(hash)))
            .collect())
    }

    /// Masks for the given ids, keyed by manifest name when known and by hex otherwise.
    ///
    /// Ids that appear in no pixel are left out.
    pub fn masks_by_hashes(&self, hashes: &[HashValue]) -> HashMap<String, Mask> {
        let present = self.pixel_hashes();
        hashes
            .iter()
            .filter(|h| present.contains(h))
            .map(|&h| (self.label_for(h), self.mask_by_hash(h)))
            .collect()
    }

    /// Every id carrying non-zero coverage in at least one pixel, ascending.
    pub fn pixel_hashes(&self) -> BTreeSet<HashValue> {
        let mut out = BTreeSet::new();
        for level in &self.levels {
            for (id, cov) in level.id.iter().zip(&level.coverage) {
                if *cov != 0.0 {
                    out.insert(HashValue::from_f32(*id));
                }
            }
        }
        out
    }

    fn hash_for(&self, name: &str) -> CryptomatteResult<HashValue> {
        let manifest = self.metadata.manifest().ok_or_else(|| {
            CryptomatteError::name_not_found(format!(
                "'{name}': layer '{}' has no manifest",
                self.metadata.name()
            ))
        })?;
        manifest.hash(name)
    }

    fn label_for(&self, hash: HashValue) -> String {
        self.metadata
            .manifest()
            .and_then(|m| m.name_for_hash(hash))
            .map_or_else(|| hash.to_hex(), str::to_string)
    }

    fn manifest_targets(&self) -> Vec<(String, HashValue)> {
        match self.metadata.manifest() {
            Some(m) => m.iter().map(|(n, h)| (n.to_string(), h)).collect(),
            None => Vec::new(),
        }
    }
}

fn build_thread_pool(threads: Option<usize>) -> CryptomatteResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(CryptomatteError::invalid_options(
            "mask threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder.build().map_err(|e| {
        CryptomatteError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}"))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/decode/cryptomatte.rs"]
mod tests;
