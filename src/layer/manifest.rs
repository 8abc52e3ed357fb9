use std::{collections::HashMap, path::Path, str::FromStr};

use anyhow::Context;

use crate::foundation::{
    error::{CryptomatteError, CryptomatteResult},
    hash::HashValue,
};

/// Attribute suffix holding an inline JSON manifest.
pub const MANIFEST_SUFFIX: &str = "manifest";
/// Attribute suffix holding a sidecar manifest file name.
pub const MANIF_FILE_SUFFIX: &str = "manif_file";

/// Name to hash mapping for one Cryptomatte layer.
///
/// Names are unique; hashes may collide. Entries keep the order in which names were
/// first inserted, and a repeated name replaces the earlier hash in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<(String, HashValue)>,
    index: HashMap<String, usize>,
}

/// Outcome of speculatively resolving a manifest from one attribute.
#[derive(Debug)]
pub enum ManifestResolution {
    /// The attribute key does not carry a manifest.
    Irrelevant,
    /// A manifest was found and parsed.
    Resolved(Manifest),
    /// The key carries a manifest but it could not be read or parsed.
    Unresolvable(CryptomatteError),
}

impl ManifestResolution {
    /// Collapse to the manifest, discarding why resolution failed.
    pub fn into_manifest(self) -> Option<Manifest> {
        match self {
            Self::Resolved(m) => Some(m),
            Self::Irrelevant | Self::Unresolvable(_) => None,
        }
    }
}

impl Manifest {
    /// Build from `(name, hex)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> CryptomatteResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut out = Self::default();
        for (name, hex) in pairs {
            let name = name.into();
            let hash = HashValue::from_hex(hex.as_ref()).map_err(|e| {
                CryptomatteError::malformed_hash(format!("manifest entry '{name}': {e}"))
            })?;
            out.insert(name, hash);
        }
        Ok(out)
    }

    /// Build from an already parsed JSON object of name to hex-string pairs.
    pub fn from_json(json: &serde_json::Value) -> CryptomatteResult<Self> {
        let obj = json.as_object().ok_or_else(|| {
            CryptomatteError::malformed_manifest(format!(
                "expected a JSON object, got {}",
                json_kind(json)
            ))
        })?;

        let mut out = Self::default();
        for (name, value) in obj {
            let hex = value.as_str().ok_or_else(|| {
                CryptomatteError::malformed_hash(format!(
                    "manifest entry '{name}' is a {}, expected a hex string",
                    json_kind(value)
                ))
            })?;
            let hash = HashValue::from_hex(hex).map_err(|e| {
                CryptomatteError::malformed_hash(format!("manifest entry '{name}': {e}"))
            })?;
            out.insert(name.clone(), hash);
        }
        Ok(out)
    }

    /// Resolve a manifest from a single image attribute.
    ///
    /// Keys ending in [`MANIFEST_SUFFIX`] hold inline JSON; keys ending in
    /// [`MANIF_FILE_SUFFIX`] name a sidecar file next to `image_path`. Every other key is
    /// [`ManifestResolution::Irrelevant`]. Nothing here returns an error to the caller;
    /// unreadable or malformed data is reported as [`ManifestResolution::Unresolvable`].
    pub fn resolve(key: &str, value: &str, image_path: &Path) -> ManifestResolution {
        match attribute_suffix(key) {
            MANIFEST_SUFFIX => match value.parse::<Manifest>() {
                Ok(m) => ManifestResolution::Resolved(m),
                Err(e) => ManifestResolution::Unresolvable(e),
            },
            MANIF_FILE_SUFFIX => {
                let sidecar = sidecar_path(value, image_path);
                tracing::debug!(key, sidecar = %sidecar.display(), "resolving sidecar manifest");
                let text = match std::fs::read_to_string(&sidecar)
                    .with_context(|| format!("read sidecar manifest '{}'", sidecar.display()))
                {
                    Ok(text) => text,
                    Err(e) => return ManifestResolution::Unresolvable(e.into()),
                };
                match text.parse::<Manifest>() {
                    Ok(m) => ManifestResolution::Resolved(m),
                    Err(e) => ManifestResolution::Unresolvable(e),
                }
            }
            _ => ManifestResolution::Irrelevant,
        }
    }

    /// Like [`Manifest::resolve`], but absence and failure both map to `None`.
    pub fn load(key: &str, value: &str, image_path: impl AsRef<Path>) -> Option<Self> {
        match Self::resolve(key, value, image_path.as_ref()) {
            ManifestResolution::Resolved(m) => Some(m),
            ManifestResolution::Irrelevant => None,
            ManifestResolution::Unresolvable(e) => {
                tracing::warn!(key, error = %e, "ignoring unresolvable cryptomatte manifest");
                None
            }
        }
    }

    /// First manifest that resolves from `attributes`, in attribute order.
    pub fn load_from_attributes<'a, I>(attributes: I, image_path: impl AsRef<Path>) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let image_path = image_path.as_ref();
        attributes
            .into_iter()
            .find_map(|(k, v)| Self::load(k, v, image_path))
    }

    /// Number of names.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no names.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `name` is in the manifest.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Stored hash for `name`.
    pub fn hash(&self, name: &str) -> CryptomatteResult<HashValue> {
        self.index
            .get(name)
            .map(|&i| self.entries[i].1)
            .ok_or_else(|| {
                CryptomatteError::name_not_found(format!("'{name}' is not in the manifest"))
            })
    }

    /// Hash for `name` as 8 lowercase hex digits.
    pub fn hash_hex(&self, name: &str) -> CryptomatteResult<String> {
        self.hash(name).map(HashValue::to_hex)
    }

    /// Hash for `name` as an unsigned integer.
    pub fn hash_uint32(&self, name: &str) -> CryptomatteResult<u32> {
        self.hash(name).map(HashValue::as_u32)
    }

    /// Hash for `name` bit-cast to a float, as stored in id channels.
    pub fn hash_float(&self, name: &str) -> CryptomatteResult<f32> {
        self.hash(name).map(HashValue::to_f32)
    }

    /// First inserted name carrying `hash`.
    pub fn name_for_hash(&self, hash: HashValue) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, h)| *h == hash)
            .map(|(n, _)| n.as_str())
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, HashValue)> {
        self.entries.iter().map(|(n, h)| (n.as_str(), *h))
    }

    /// Every entry with its hash as hex text.
    pub fn mapping_hex(&self) -> Vec<(String, String)> {
        self.iter().map(|(n, h)| (n.to_string(), h.to_hex())).collect()
    }

    /// Every entry with its hash as an unsigned integer.
    pub fn mapping_uint32(&self) -> Vec<(String, u32)> {
        self.iter().map(|(n, h)| (n.to_string(), h.as_u32())).collect()
    }

    /// Every entry with its hash bit-cast to a float.
    pub fn mapping_float(&self) -> Vec<(String, f32)> {
        self.iter().map(|(n, h)| (n.to_string(), h.to_f32())).collect()
    }

    fn insert(&mut self, name: String, hash: HashValue) {
        if let Some(&i) = self.index.get(&name) {
            self.entries[i].1 = hash;
            return;
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, hash));
    }
}

impl FromStr for Manifest {
    type Err = CryptomatteError;

    /// Parse raw JSON text. Invalid JSON and non-object JSON are both
    /// [`CryptomatteError::MalformedManifest`].
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let json: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| CryptomatteError::malformed_manifest(format!("invalid JSON: {e}")))?;
        Self::from_json(&json)
    }
}

fn attribute_suffix(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

fn sidecar_path(file_name: &str, image_path: &Path) -> std::path::PathBuf {
    match image_path.parent() {
        Some(dir) => dir.join(file_name),
        None => Path::new(file_name).to_path_buf(),
    }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layer/manifest.rs"]
mod tests;
