use std::path::Path;

use crate::{
    foundation::{
        error::{CryptomatteError, CryptomatteResult},
        hash::{ConversionMethod, HashMethod},
    },
    layer::manifest::{MANIF_FILE_SUFFIX, MANIFEST_SUFFIX, Manifest},
};

/// Namespace every Cryptomatte attribute key lives under.
pub const ATTRIB_NAMESPACE: &str = "cryptomatte";

const NAME_SUFFIX: &str = "name";
const HASH_SUFFIX: &str = "hash";
const CONVERSION_SUFFIX: &str = "conversion";

/// Description of one Cryptomatte layer found in an image's attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct Metadata {
    name: String,
    key: String,
    hash_method: HashMethod,
    conversion_method: ConversionMethod,
    manifest: Option<Manifest>,
}

/// A layer that was found but could not be decoded.
#[derive(Debug)]
pub struct SkippedLayer {
    /// The `<key>` of `cryptomatte/<key>/...`, or the offending attribute key.
    pub key: String,
    /// Layer name, when it was known.
    pub name: Option<String>,
    /// Why the layer was skipped.
    pub error: CryptomatteError,
}

impl Metadata {
    /// Build from attribute text; the method names must match exactly.
    pub fn new(
        name: impl Into<String>,
        key: impl Into<String>,
        hash_method: &str,
        conversion_method: &str,
    ) -> CryptomatteResult<Self> {
        Ok(Self {
            name: name.into(),
            key: key.into(),
            hash_method: hash_method.parse()?,
            conversion_method: conversion_method.parse()?,
            manifest: None,
        })
    }

    /// Attach an owned manifest.
    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Parse every Cryptomatte layer described by `attributes`.
    ///
    /// Keys outside the `cryptomatte/` namespace are ignored. Layers are returned in order of
    /// first appearance of their `<key>`; any malformed layer fails the whole call. Manifests
    /// are resolved relative to `image_path` and are never a reason to fail.
    pub fn from_json<'a, I>(
        attributes: I,
        image_path: impl AsRef<Path>,
    ) -> CryptomatteResult<Vec<Self>>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        parse_layers(attributes, image_path.as_ref())
            .into_iter()
            .map(|r| r.map_err(|skipped| skipped.error))
            .collect()
    }

    /// Like [`Metadata::from_json`], but broken layers are reported instead of failing.
    pub fn from_attributes_lenient<'a, I>(
        attributes: I,
        image_path: impl AsRef<Path>,
    ) -> (Vec<Self>, Vec<SkippedLayer>)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut layers = Vec::new();
        let mut skipped = Vec::new();
        for parsed in parse_layers(attributes, image_path.as_ref()) {
            match parsed {
                Ok(m) => layers.push(m),
                Err(s) => {
                    tracing::warn!(key = %s.key, error = %s.error, "skipping cryptomatte layer");
                    skipped.push(s);
                }
            }
        }
        (layers, skipped)
    }

    /// Layer name, the prefix of its channel names.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short identifier distinguishing this layer from its siblings.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Declared hash method.
    pub fn hash_method(&self) -> HashMethod {
        self.hash_method
    }

    /// Declared conversion method.
    pub fn conversion_method(&self) -> ConversionMethod {
        self.conversion_method
    }

    /// Resolved manifest, if any.
    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    /// `<name><2 digits>.<letter>`, e.g. `CryptoAsset00.r`.
    pub fn is_valid_channel_name(&self, channel: &str) -> bool {
        let Some(rest) = channel.strip_prefix(self.name.as_str()) else {
            return false;
        };
        let b = rest.as_bytes();
        b.len() == 4
            && b[0].is_ascii_digit()
            && b[1].is_ascii_digit()
            && b[2] == b'.'
            && b[3].is_ascii_alphabetic()
    }

    /// `<name>.<letter>`, e.g. `CryptoAsset.r`.
    pub fn is_valid_legacy_channel_name(&self, channel: &str) -> bool {
        let Some(rest) = channel.strip_prefix(self.name.as_str()) else {
            return false;
        };
        let b = rest.as_bytes();
        b.len() == 2 && b[0] == b'.' && b[1].is_ascii_alphabetic()
    }

    /// Indexed channels of this layer, in input order.
    pub fn channel_names<S: AsRef<str>>(&self, channels: &[S]) -> Vec<String> {
        channels
            .iter()
            .map(|c| c.as_ref())
            .filter(|c| self.is_valid_channel_name(c))
            .map(str::to_string)
            .collect()
    }

    /// Legacy preview channels of this layer, in input order.
    pub fn legacy_channel_names<S: AsRef<str>>(&self, channels: &[S]) -> Vec<String> {
        channels
            .iter()
            .map(|c| c.as_ref())
            .filter(|c| self.is_valid_legacy_channel_name(c))
            .map(str::to_string)
            .collect()
    }

    /// Attribute suffix holding the layer name.
    pub fn attrib_name_identifier() -> &'static str {
        NAME_SUFFIX
    }

    /// Attribute suffix holding the hash method.
    pub fn attrib_hash_method_identifier() -> &'static str {
        HASH_SUFFIX
    }

    /// Attribute suffix holding the conversion method.
    pub fn attrib_conversion_method_identifier() -> &'static str {
        CONVERSION_SUFFIX
    }

    /// Attribute suffix holding an inline manifest.
    pub fn attrib_manifest_identifier() -> &'static str {
        MANIFEST_SUFFIX
    }

    /// Attribute suffix holding a sidecar manifest file name.
    pub fn attrib_manif_file_identifier() -> &'static str {
        MANIF_FILE_SUFFIX
    }
}

struct AttributeGroup<'a> {
    key: &'a str,
    entries: Vec<(&'a str, &'a str, &'a str)>, // (suffix, full key, value)
}

impl<'a> AttributeGroup<'a> {
    fn get(&self, suffix: &str) -> Option<&'a str> {
        self.entries
            .iter()
            .rev()
            .find(|(s, _, _)| *s == suffix)
            .map(|(_, _, v)| *v)
    }
}

fn parse_layers<'a, I>(attributes: I, image_path: &Path) -> Vec<Result<Metadata, SkippedLayer>>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut groups: Vec<AttributeGroup<'a>> = Vec::new();
    let mut out = Vec::new();

    for (full_key, value) in attributes {
        let mut parts = full_key.split('/');
        if parts.next() != Some(ATTRIB_NAMESPACE) {
            continue;
        }
        let (Some(key), Some(suffix), None) = (parts.next(), parts.next(), parts.next()) else {
            out.push(Err(SkippedLayer {
                key: full_key.to_string(),
                name: None,
                error: CryptomatteError::invalid_metadata(format!(
                    "attribute '{full_key}' is not shaped '{ATTRIB_NAMESPACE}/<key>/<attribute>'"
                )),
            }));
            continue;
        };
        if key.is_empty() || suffix.is_empty() {
            out.push(Err(SkippedLayer {
                key: full_key.to_string(),
                name: None,
                error: CryptomatteError::invalid_metadata(format!(
                    "attribute '{full_key}' has an empty key or attribute name"
                )),
            }));
            continue;
        }

        match groups.iter_mut().find(|g| g.key == key) {
            Some(g) => g.entries.push((suffix, full_key, value)),
            None => groups.push(AttributeGroup {
                key,
                entries: vec![(suffix, full_key, value)],
            }),
        }
    }

    out.extend(groups.iter().map(|g| {
        metadata_from_group(g, image_path).map_err(|error| SkippedLayer {
            key: g.key.to_string(),
            name: g.get(NAME_SUFFIX).map(str::to_string),
            error,
        })
    }));
    out
}

fn metadata_from_group(
    group: &AttributeGroup<'_>,
    image_path: &Path,
) -> CryptomatteResult<Metadata> {
    const KNOWN: [&str; 5] = [
        NAME_SUFFIX,
        HASH_SUFFIX,
        CONVERSION_SUFFIX,
        MANIFEST_SUFFIX,
        MANIF_FILE_SUFFIX,
    ];
    if let Some((suffix, full_key, _)) = group
        .entries
        .iter()
        .find(|(s, _, _)| !KNOWN.contains(s))
    {
        return Err(CryptomatteError::invalid_metadata(format!(
            "unknown cryptomatte attribute '{suffix}' in '{full_key}'"
        )));
    }

    let require = |suffix: &str| {
        group.get(suffix).ok_or_else(|| {
            CryptomatteError::invalid_metadata(format!(
                "layer '{}' is missing required attribute '{suffix}'",
                group.key
            ))
        })
    };
    let name = require(NAME_SUFFIX)?;
    let hash = require(HASH_SUFFIX)?;
    let conversion = require(CONVERSION_SUFFIX)?;

    let mut metadata = Metadata::new(name, group.key, hash, conversion)?;
    metadata.manifest = group
        .entries
        .iter()
        .filter(|(s, _, _)| *s == MANIFEST_SUFFIX || *s == MANIF_FILE_SUFFIX)
        .find_map(|(_, full_key, value)| Manifest::load(full_key, value, image_path));
    if metadata.manifest.is_none() {
        tracing::debug!(layer = name, key = group.key, "no manifest resolved for layer");
    }
    Ok(metadata)
}

#[cfg(test)]
#[path = "../../tests/unit/layer/metadata.rs"]
mod tests;
